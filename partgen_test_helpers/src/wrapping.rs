use std::cmp::Ordering;

use partgen_types::{Datum, KeyType, Literal, LiteralValue, PlusOperator, TypeError};

/// A `smallint` whose `+` wraps around on overflow, the way a poorly behaved user-defined
/// type might. Used to drive stepping past the end of the value range.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrappingSmallint;

const NAME: &str = "wrapping_smallint";

fn value(datum: &Datum) -> Result<i16, TypeError> {
    match datum {
        Datum::Int2(v) => Ok(*v),
        _ => Err(TypeError::CannotCast {
            type_name: NAME.to_string(),
        }),
    }
}

fn literal_value(literal: &Literal) -> Result<Option<i16>, TypeError> {
    let out_of_range = |_| TypeError::OutOfRange {
        type_name: NAME.to_string(),
    };
    match &literal.value {
        LiteralValue::Null => Ok(None),
        LiteralValue::Integer(i) => i16::try_from(*i).map(Some).map_err(out_of_range),
        LiteralValue::String(s) => s.trim().parse().map(Some).map_err(|_| TypeError::InvalidInput {
            type_name: NAME.to_string(),
            input: s.clone(),
        }),
    }
}

impl KeyType for WrappingSmallint {
    fn name(&self) -> &str {
        NAME
    }

    fn compare(&self, left: &Datum, right: &Datum, _collation: Option<&str>) -> Ordering {
        match (left, right) {
            (Datum::Int2(l), Datum::Int2(r)) => l.cmp(r),
            _ => left.type_name().cmp(right.type_name()),
        }
    }

    fn coerce(&self, literal: &Literal, _typmod: Option<i32>) -> Result<Option<Datum>, TypeError> {
        Ok(literal_value(literal)?.map(Datum::Int2))
    }

    fn plus_operator(
        &self,
        step: &Literal,
        _typmod: Option<i32>,
    ) -> Result<Box<dyn PlusOperator>, TypeError> {
        Ok(Box::new(WrappingPlus {
            step: literal_value(step)?,
        }))
    }
}

#[derive(Debug)]
struct WrappingPlus {
    step: Option<i16>,
}

impl PlusOperator for WrappingPlus {
    fn evaluate(&self, param: &Datum) -> Result<Option<Datum>, TypeError> {
        let current = value(param)?;
        Ok(self
            .step
            .map(|step| Datum::Int2(current.wrapping_add(step))))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn wraps() {
        let plus = WrappingSmallint
            .plus_operator(&Literal::integer(10), None)
            .unwrap();
        assert_eq!(
            plus.evaluate(&Datum::Int2(i16::MAX - 5)).unwrap(),
            Some(Datum::Int2(i16::MIN + 4))
        );
    }
}
