//! Stepping through a `START .. END .. EVERY` RANGE clause.
//!
//! A [`BoundIterator`] yields the `[lower, upper)` pairs one RANGE element expands into.
//! Without `EVERY` there is exactly one pair, carrying whichever sides were declared.
//! With `EVERY`, the iterator starts at `START` and repeatedly adds the step with the key
//! type's `+` operator until `END` is reached; the last pair is clamped to `END`.
//!
//! An inclusive `END` is converted to exclusive form before iteration starts, so every
//! pair produced here has an exclusive upper bound.

use observability_deps::tracing::trace;
use partgen_types::{Datum, KeyColumn, Literal, Location, PartitionKey, TypeError};

use crate::{
    Error, Result,
    bound_value::transform_range_value,
    successor::{SuccessorEvaluator, canonicalize_range_end},
};

/// One generated range. A side is `None` only when the clause left it open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPair {
    pub lower: Option<Datum>,
    pub upper: Option<Datum>,
}

#[derive(Debug)]
enum State {
    Single {
        lower: Option<Datum>,
        upper: Option<Datum>,
    },
    Stepping {
        evaluator: SuccessorEvaluator,
        upper: Datum,
        end: Datum,
    },
    Done,
}

/// Lazy, finite and non-restartable sequence of the ranges of one RANGE element.
///
/// The evaluation scope of the step expression is owned by the iterator and released as
/// soon as the last pair has been produced, an error has been returned, or the iterator
/// is dropped.
#[derive(Debug)]
pub struct BoundIterator {
    column: KeyColumn,
    state: State,
    called: bool,
    end_location: Option<Location>,
    every_location: Option<Location>,
}

impl BoundIterator {
    /// Prepare iteration over a RANGE clause for a single-column `key`.
    ///
    /// `location` is used for arity errors of clauses whose values carry no location of
    /// their own.
    pub fn new(
        key: &PartitionKey,
        start: Option<&[Literal]>,
        end: Option<&[Literal]>,
        end_inclusive: bool,
        every: Option<&[Literal]>,
        location: Option<Location>,
    ) -> Result<Self> {
        let [column] = key.columns.as_slice() else {
            return Err(Error::MultiColumnRangeUnsupported {
                columns: key.columns.len(),
            });
        };

        let start = start
            .map(|values| single_value("START", values, location))
            .transpose()?;
        let end = end
            .map(|values| single_value("END", values, location))
            .transpose()?;
        let every = every
            .map(|values| single_value("EVERY", values, location))
            .transpose()?;

        let start_value = start
            .map(|literal| transform_range_value(column, literal))
            .transpose()?;
        let end_value = match end {
            Some(literal) => {
                let value = transform_range_value(column, literal)?;
                Some(if end_inclusive {
                    canonicalize_range_end(column, &value)?
                } else {
                    value
                })
            }
            None => None,
        };

        let end_location = end.and_then(|literal| literal.location).or(location);
        let every_location = every.and_then(|literal| literal.location).or(location);

        let state = match every {
            None => State::Single {
                lower: start_value,
                upper: end_value,
            },
            Some(step) => {
                let (Some(start), Some(end)) = (start_value, end_value) else {
                    return Err(Error::EveryRequiresStartEnd {
                        location: every_location,
                    });
                };
                State::Stepping {
                    evaluator: SuccessorEvaluator::compile(column, step)?,
                    upper: start,
                    end,
                }
            }
        };

        Ok(Self {
            column: column.clone(),
            state,
            called: false,
            end_location,
            every_location,
        })
    }

    fn step_error(&self, err: Error) -> Error {
        match err {
            Error::StepEvaluation {
                source: TypeError::OutOfRange { .. },
                ..
            } => Error::RangeOverflow {
                location: self.end_location,
            },
            err => err,
        }
    }
}

impl Iterator for BoundIterator {
    type Item = Result<BoundPair>;

    fn next(&mut self) -> Option<Self::Item> {
        let first_call = !self.called;
        self.called = true;

        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => None,
            State::Single { lower, upper } => Some(Ok(BoundPair { lower, upper })),
            State::Stepping {
                mut evaluator,
                upper,
                end,
            } => {
                let next = match evaluator.next(&upper) {
                    Ok(next) => next,
                    Err(e) => return Some(Err(self.step_error(e))),
                };
                trace!(
                    column = %self.column.name,
                    from = %upper,
                    to = %next,
                    "stepped range bound"
                );

                if self.column.compare(&next, &end).is_ge() {
                    return Some(Ok(BoundPair {
                        lower: Some(upper),
                        upper: Some(end),
                    }));
                }

                if self.column.compare(&upper, &next).is_ge() {
                    // a step that fails to advance on the first try is too small; on a
                    // later try the value can only have wrapped around
                    return Some(Err(if first_call {
                        Error::NonMonotonicStep {
                            location: self.every_location,
                        }
                    } else {
                        Error::RangeOverflow {
                            location: self.end_location,
                        }
                    }));
                }

                self.state = State::Stepping {
                    evaluator,
                    upper: next.clone(),
                    end,
                };
                Some(Ok(BoundPair {
                    lower: Some(upper),
                    upper: Some(next),
                }))
            }
        }
    }
}

fn single_value<'a>(
    clause: &'static str,
    values: &'a [Literal],
    location: Option<Location>,
) -> Result<&'a Literal> {
    match values {
        [literal] => Ok(literal),
        _ => Err(Error::InvalidBoundaryArity {
            clause,
            expected: 1,
            found: values.len(),
            location: values.first().and_then(|v| v.location).or(location),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use partgen_types::PartitionStrategy;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builtin::IntType;

    fn int_key() -> PartitionKey {
        PartitionKey::new(
            PartitionStrategy::Range,
            vec![KeyColumn::new("id", Arc::new(IntType::int4()))],
        )
    }

    fn ints(values: &[i64]) -> Vec<Literal> {
        values.iter().copied().map(Literal::integer).collect()
    }

    fn pairs(iter: BoundIterator) -> Vec<(Option<i32>, Option<i32>)> {
        let as_int = |d: Option<Datum>| match d {
            Some(Datum::Int4(v)) => Some(v),
            None => None,
            other => panic!("unexpected datum {other:?}"),
        };
        iter.map(|pair| {
            let pair = pair.unwrap();
            (as_int(pair.lower), as_int(pair.upper))
        })
        .collect()
    }

    #[test]
    fn every_divides_range() {
        let iter = BoundIterator::new(
            &int_key(),
            Some(&ints(&[1])),
            Some(&ints(&[10])),
            false,
            Some(&ints(&[3])),
            None,
        )
        .unwrap();
        assert_eq!(
            pairs(iter),
            vec![(Some(1), Some(4)), (Some(4), Some(7)), (Some(7), Some(10))]
        );
    }

    #[test]
    fn last_range_is_clamped_to_end() {
        let iter = BoundIterator::new(
            &int_key(),
            Some(&ints(&[1])),
            Some(&ints(&[10])),
            false,
            Some(&ints(&[4])),
            None,
        )
        .unwrap();
        assert_eq!(
            pairs(iter),
            vec![(Some(1), Some(5)), (Some(5), Some(9)), (Some(9), Some(10))]
        );
    }

    #[test]
    fn inclusive_end() {
        let iter = BoundIterator::new(
            &int_key(),
            Some(&ints(&[1])),
            Some(&ints(&[9])),
            true,
            Some(&ints(&[3])),
            None,
        )
        .unwrap();
        assert_eq!(
            pairs(iter),
            vec![(Some(1), Some(4)), (Some(4), Some(7)), (Some(7), Some(10))]
        );
    }

    #[test]
    fn without_every() {
        let single = |start: Option<&[Literal]>, end: Option<&[Literal]>| {
            pairs(BoundIterator::new(&int_key(), start, end, false, None, None).unwrap())
        };
        assert_eq!(
            single(Some(&ints(&[1])), Some(&ints(&[10]))),
            vec![(Some(1), Some(10))]
        );
        assert_eq!(single(Some(&ints(&[1])), None), vec![(Some(1), None)]);
        assert_eq!(single(None, Some(&ints(&[10]))), vec![(None, Some(10))]);
    }

    #[test]
    fn zero_step_is_too_small() {
        let mut iter = BoundIterator::new(
            &int_key(),
            Some(&ints(&[1])),
            Some(&ints(&[10])),
            false,
            Some(&[Literal::integer(0).at(40)]),
            None,
        )
        .unwrap();
        let err = iter.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::NonMonotonicStep { location: Some(l) } if l.offset() == 40));
        assert!(iter.next().is_none());
    }

    #[test]
    fn checked_overflow_is_a_range_overflow() {
        let key = PartitionKey::new(
            PartitionStrategy::Range,
            vec![KeyColumn::new("id", Arc::new(IntType::int2()))],
        );
        let mut iter = BoundIterator::new(
            &key,
            Some(&ints(&[0])),
            Some(&[Literal::integer(32_767).at(20)]),
            true,
            Some(&ints(&[20_000])),
            None,
        );
        // END 32767 INCLUSIVE cannot be represented exclusively
        assert!(matches!(iter, Err(Error::StepEvaluation { .. })));

        iter = BoundIterator::new(
            &key,
            Some(&ints(&[0])),
            Some(&[Literal::integer(32_767).at(20)]),
            false,
            Some(&ints(&[20_000])),
            None,
        );
        let results = iter.unwrap().collect::<Vec<_>>();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::RangeOverflow { location: Some(l) }) if l.offset() == 20
        ));
    }

    #[test]
    fn arity_and_clause_errors() {
        let err = BoundIterator::new(
            &int_key(),
            Some(&ints(&[1, 2])),
            Some(&ints(&[10])),
            false,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidBoundaryArity { clause: "START", expected: 1, found: 2, .. }
        ));

        let err = BoundIterator::new(
            &int_key(),
            Some(&ints(&[1])),
            None,
            false,
            Some(&ints(&[1])),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::EveryRequiresStartEnd { .. }));

        let err = BoundIterator::new(
            &int_key(),
            Some(&[Literal::null()]),
            None,
            false,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NullBoundaryValue { .. }));

        let two_columns = PartitionKey::new(
            PartitionStrategy::Range,
            vec![
                KeyColumn::new("a", Arc::new(IntType::int4())),
                KeyColumn::new("b", Arc::new(IntType::int4())),
            ],
        );
        let err = BoundIterator::new(&two_columns, None, Some(&ints(&[1])), false, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::MultiColumnRangeUnsupported { columns: 2 }));
    }
}
