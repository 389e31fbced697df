//! Resolved partition boundaries in the shape the DDL executor consumes.

use std::fmt::Display;

use crate::Datum;

/// One column of a range bound: a value, or one of the unbounded sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RangeDatum {
    MinValue,
    Value(Datum),
    MaxValue,
}

impl Display for RangeDatum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinValue => write!(f, "MINVALUE"),
            Self::Value(datum) => write!(f, "{datum}"),
            Self::MaxValue => write!(f, "MAXVALUE"),
        }
    }
}

/// The sides of a range partition that are known.
///
/// Generated partitions may leave one side implicit; the engine fills it in from the
/// neighbouring partition (or a sentinel) once all partitions of a level are known, at
/// which point every range is [`RangeBounds::Both`]. Upper bounds are always exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RangeBounds {
    LowerOnly(Vec<RangeDatum>),
    UpperOnly(Vec<RangeDatum>),
    Both {
        lower: Vec<RangeDatum>,
        upper: Vec<RangeDatum>,
    },
}

impl RangeBounds {
    pub fn lower(&self) -> Option<&[RangeDatum]> {
        match self {
            Self::LowerOnly(lower) | Self::Both { lower, .. } => Some(lower),
            Self::UpperOnly(_) => None,
        }
    }

    pub fn upper(&self) -> Option<&[RangeDatum]> {
        match self {
            Self::UpperOnly(upper) | Self::Both { upper, .. } => Some(upper),
            Self::LowerOnly(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Both { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartitionBoundSpec {
    Range(RangeBounds),
    /// Accepted values; `None` is a NULL member.
    List(Vec<Option<Datum>>),
    Default,
}

impl PartitionBoundSpec {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn as_range(&self) -> Option<&RangeBounds> {
        match self {
            Self::Range(bounds) => Some(bounds),
            Self::List(_) | Self::Default => None,
        }
    }
}

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the bound as the `FOR VALUES` clause of `CREATE TABLE .. PARTITION OF`. A side
/// that is still implicit renders as `?`.
impl Display for PartitionBoundSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "DEFAULT"),
            Self::List(values) => {
                let values = values
                    .iter()
                    .map(|v| v.as_ref().map_or_else(|| "NULL".to_string(), ToString::to_string))
                    .collect::<Vec<_>>();
                write!(f, "FOR VALUES IN ({})", values.join(", "))
            }
            Self::Range(bounds) => {
                let lower = bounds.lower().map_or_else(|| "?".to_string(), join);
                let upper = bounds.upper().map_or_else(|| "?".to_string(), join);
                write!(f, "FOR VALUES FROM ({lower}) TO ({upper})")
            }
        }
    }
}
