//! Ordering of the partitions of a RANGE level and inference of their open sides.
//!
//! Partitions are ordered by [`compare_bounds`]:
//!
//! 1. DEFAULT sorts after every range.
//! 2. Two ranges that both have a lower bound compare by lower bound.
//! 3. Otherwise, two ranges that both have an upper bound compare by upper bound.
//! 4. A lower-only range against an upper-only range compares lower against upper;
//!    when they are equal the lower-only range is the greater one, so the range that
//!    ends there comes first and can hand its end over as the other's start.
//! 5. An upper-only range against a lower-only range compares upper against lower,
//!    with no tie-break.
//!
//! This is not a consistent total order (rules 4 and 5 can disagree with rules 2 and 3
//! for three or more ranges), so [`sorted_order`] uses a stable insertion sort that only
//! relies on the comparator pairwise and cannot be tripped up by an inconsistent answer.
//! [`resolve_implicit_bounds`] then walks the sorted ranges once and fills each open side
//! from its neighbour or a MINVALUE / MAXVALUE sentinel.

use std::cmp::Ordering;

use partgen_types::{
    GeneratedTableDescriptor, KeyColumn, PartitionBoundSpec, RangeBounds, RangeDatum,
};

use crate::{Error, Result};

/// What the comparator looks at for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey<'a> {
    Range(&'a RangeBounds),
    Default,
}

impl<'a> SortKey<'a> {
    /// `None` for LIST bounds, which take no part in range ordering.
    pub fn of(bound: &'a PartitionBoundSpec) -> Option<Self> {
        match bound {
            PartitionBoundSpec::Range(bounds) => Some(Self::Range(bounds)),
            PartitionBoundSpec::Default => Some(Self::Default),
            PartitionBoundSpec::List(_) => None,
        }
    }
}

/// Compare two bound lists column by column; the first difference wins.
pub fn compare_datums(
    columns: &[KeyColumn],
    left: &[RangeDatum],
    right: &[RangeDatum],
) -> Ordering {
    columns
        .iter()
        .zip(left.iter().zip(right))
        .map(|(column, (l, r))| match (l, r) {
            (RangeDatum::Value(l), RangeDatum::Value(r)) => column.compare(l, r),
            (RangeDatum::MinValue, RangeDatum::MinValue)
            | (RangeDatum::MaxValue, RangeDatum::MaxValue) => Ordering::Equal,
            (RangeDatum::MinValue, _) | (_, RangeDatum::MaxValue) => Ordering::Less,
            (RangeDatum::MaxValue, _) | (_, RangeDatum::MinValue) => Ordering::Greater,
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// The partition ordering described in the [module documentation](self).
pub fn compare_bounds(columns: &[KeyColumn], left: SortKey<'_>, right: SortKey<'_>) -> Ordering {
    use RangeBounds::{Both, LowerOnly, UpperOnly};

    let (left, right) = match (left, right) {
        (SortKey::Default, SortKey::Default) => return Ordering::Equal,
        (SortKey::Default, SortKey::Range(_)) => return Ordering::Greater,
        (SortKey::Range(_), SortKey::Default) => return Ordering::Less,
        (SortKey::Range(left), SortKey::Range(right)) => (left, right),
    };

    match (left, right) {
        (LowerOnly(l) | Both { lower: l, .. }, LowerOnly(r) | Both { lower: r, .. }) => {
            compare_datums(columns, l, r)
        }
        (UpperOnly(l) | Both { upper: l, .. }, UpperOnly(r) | Both { upper: r, .. }) => {
            compare_datums(columns, l, r)
        }
        (LowerOnly(lower), UpperOnly(upper)) => match compare_datums(columns, lower, upper) {
            Ordering::Equal => Ordering::Greater,
            ordering => ordering,
        },
        (UpperOnly(upper), LowerOnly(lower)) => compare_datums(columns, upper, lower),
    }
}

/// Indices of `keys` in ascending [`compare_bounds`] order. Equal keys keep their
/// relative order.
pub fn sorted_order(columns: &[KeyColumn], keys: &[SortKey<'_>]) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::with_capacity(keys.len());
    for index in 0..keys.len() {
        let mut position = order.len();
        while position > 0
            && compare_bounds(columns, keys[order[position - 1]], keys[index]).is_gt()
        {
            position -= 1;
        }
        order.insert(position, index);
    }
    order
}

/// Fill in the open sides of the RANGE partitions in `descriptors`, leaving the
/// descriptors themselves in place.
///
/// A missing lower bound is taken from the upper bound of the preceding range in sorted
/// order, or is MINVALUE for the first range. A missing upper bound is taken from the
/// lower bound of the following range, or is MAXVALUE for the last one. DEFAULT
/// partitions are not neighbours of anything.
pub fn resolve_implicit_bounds(
    columns: &[KeyColumn],
    descriptors: &mut [GeneratedTableDescriptor],
) -> Result<()> {
    let ranges: Vec<usize> = {
        let keyed: Vec<(usize, SortKey<'_>)> = descriptors
            .iter()
            .enumerate()
            .filter_map(|(i, d)| SortKey::of(&d.bound).map(|key| (i, key)))
            .collect();
        let keys: Vec<SortKey<'_>> = keyed.iter().map(|(_, key)| *key).collect();
        sorted_order(columns, &keys)
            .into_iter()
            .map(|position| keyed[position].0)
            .filter(|&i| !descriptors[i].bound.is_default())
            .collect()
    };

    let sentinel = |datum: RangeDatum| vec![datum; columns.len()];

    for (position, &index) in ranges.iter().enumerate() {
        let Some(bounds) = descriptors[index].bound.as_range() else {
            continue;
        };

        let lower = match bounds.lower() {
            Some(lower) => lower.to_vec(),
            None => match position.checked_sub(1).map(|p| ranges[p]) {
                // earlier ranges are resolved by now
                Some(previous) => descriptors[previous]
                    .bound
                    .as_range()
                    .and_then(RangeBounds::upper)
                    .map(<[RangeDatum]>::to_vec)
                    .unwrap_or_else(|| sentinel(RangeDatum::MinValue)),
                None => sentinel(RangeDatum::MinValue),
            },
        };

        let upper = match bounds.upper() {
            Some(upper) => upper.to_vec(),
            None => match ranges.get(position + 1) {
                Some(&next) => {
                    let next = &descriptors[next];
                    next.bound
                        .as_range()
                        .and_then(RangeBounds::lower)
                        .map(<[RangeDatum]>::to_vec)
                        .ok_or_else(|| Error::ImplicitBoundConflict {
                            name: descriptors[index].name.name.clone(),
                            neighbour: next.name.name.clone(),
                        })?
                }
                None => sentinel(RangeDatum::MaxValue),
            },
        };

        descriptors[index].bound = PartitionBoundSpec::Range(RangeBounds::Both { lower, upper });
    }

    Ok(())
}
