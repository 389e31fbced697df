//! Key types for the common partition key column types: `smallint`, `integer`,
//! `bigint`, `date`, `timestamp` and `text`.
//!
//! Arithmetic follows PostgreSQL: integer `+` is checked and fails on overflow, `date +
//! integer` adds days, `date + interval` goes through `timestamp` and is assigned back to
//! `date`, and `text` has no `+` at all.

use std::cmp::Ordering;

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use partgen_types::{Datum, Interval, KeyType, Literal, LiteralValue, PlusOperator, TypeError};

const INT_TYPE_NAMES: &[&str] = &[
    "int", "int2", "int4", "int8", "integer", "smallint", "bigint",
];
const DATE_TYPE_NAMES: &[&str] = &["date"];
const TIMESTAMP_TYPE_NAMES: &[&str] = &["timestamp", "timestamp without time zone"];
const TEXT_TYPE_NAMES: &[&str] = &["text", "varchar", "character varying"];
const INTERVAL_TYPE_NAMES: &[&str] = &["interval"];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IntWidth {
    Int2,
    Int4,
    Int8,
}

/// `smallint`, `integer` and `bigint`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IntType {
    width: IntWidth,
}

impl IntType {
    pub fn int2() -> Self {
        Self {
            width: IntWidth::Int2,
        }
    }

    pub fn int4() -> Self {
        Self {
            width: IntWidth::Int4,
        }
    }

    pub fn int8() -> Self {
        Self {
            width: IntWidth::Int8,
        }
    }

    fn type_name(&self) -> &'static str {
        match self.width {
            IntWidth::Int2 => "smallint",
            IntWidth::Int4 => "integer",
            IntWidth::Int8 => "bigint",
        }
    }

    fn to_datum(self, value: i64) -> Result<Datum, TypeError> {
        let out_of_range = |_| TypeError::OutOfRange {
            type_name: self.type_name().to_string(),
        };
        match self.width {
            IntWidth::Int2 => i16::try_from(value).map(Datum::Int2).map_err(out_of_range),
            IntWidth::Int4 => i32::try_from(value).map(Datum::Int4).map_err(out_of_range),
            IntWidth::Int8 => Ok(Datum::Int8(value)),
        }
    }

    fn parse(&self, input: &str) -> Result<i64, TypeError> {
        input.trim().parse().map_err(|_| TypeError::InvalidInput {
            type_name: self.type_name().to_string(),
            input: input.to_string(),
        })
    }
}

fn int_value(datum: &Datum) -> Option<i64> {
    match datum {
        Datum::Int2(v) => Some(i64::from(*v)),
        Datum::Int4(v) => Some(i64::from(*v)),
        Datum::Int8(v) => Some(*v),
        _ => None,
    }
}

impl KeyType for IntType {
    fn name(&self) -> &str {
        self.type_name()
    }

    fn compare(&self, left: &Datum, right: &Datum, _collation: Option<&str>) -> Ordering {
        match (int_value(left), int_value(right)) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => compare_mismatched(left, right),
        }
    }

    fn coerce(&self, literal: &Literal, _typmod: Option<i32>) -> Result<Option<Datum>, TypeError> {
        check_cast(literal, INT_TYPE_NAMES, self.type_name())?;
        match &literal.value {
            LiteralValue::Null => Ok(None),
            LiteralValue::Integer(i) => self.to_datum(*i).map(Some),
            LiteralValue::String(s) => self.to_datum(self.parse(s)?).map(Some),
        }
    }

    fn plus_operator(
        &self,
        step: &Literal,
        _typmod: Option<i32>,
    ) -> Result<Box<dyn PlusOperator>, TypeError> {
        if let Some(cast) = step_cast(step, INT_TYPE_NAMES) {
            return Err(TypeError::NoPlusOperator {
                left: self.type_name().to_string(),
                right: cast.to_string(),
            });
        }
        let step = match &step.value {
            LiteralValue::Null => None,
            LiteralValue::Integer(i) => Some(*i),
            LiteralValue::String(s) => Some(self.parse(s)?),
        };
        Ok(Box::new(IntPlus { ty: *self, step }))
    }
}

#[derive(Debug)]
struct IntPlus {
    ty: IntType,
    step: Option<i64>,
}

impl PlusOperator for IntPlus {
    fn evaluate(&self, param: &Datum) -> Result<Option<Datum>, TypeError> {
        let Some(step) = self.step else {
            return Ok(None);
        };
        let value = int_value(param).ok_or_else(|| TypeError::CannotCast {
            type_name: self.ty.type_name().to_string(),
        })?;
        let next = value
            .checked_add(step)
            .ok_or_else(|| TypeError::OutOfRange {
                type_name: self.ty.type_name().to_string(),
            })?;
        self.ty.to_datum(next).map(Some)
    }
}

/// `date`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DateType;

impl KeyType for DateType {
    fn name(&self) -> &str {
        "date"
    }

    fn compare(&self, left: &Datum, right: &Datum, _collation: Option<&str>) -> Ordering {
        match (left, right) {
            (Datum::Date(l), Datum::Date(r)) => l.cmp(r),
            _ => compare_mismatched(left, right),
        }
    }

    fn coerce(&self, literal: &Literal, _typmod: Option<i32>) -> Result<Option<Datum>, TypeError> {
        check_cast(literal, DATE_TYPE_NAMES, "date")?;
        match &literal.value {
            LiteralValue::Null => Ok(None),
            LiteralValue::Integer(_) => Err(TypeError::CannotCast {
                type_name: "date".to_string(),
            }),
            LiteralValue::String(s) => parse_date(s).map(|d| Some(Datum::Date(d))),
        }
    }

    fn plus_operator(
        &self,
        step: &Literal,
        _typmod: Option<i32>,
    ) -> Result<Box<dyn PlusOperator>, TypeError> {
        let step = match (step.cast.as_deref(), &step.value) {
            (_, LiteralValue::Null) => DateStep::Null,
            (Some(cast), value) if is_one_of(cast, INTERVAL_TYPE_NAMES) => {
                DateStep::Interval(interval_value(value)?)
            }
            (Some(cast), value) if is_one_of(cast, INT_TYPE_NAMES) => match value {
                LiteralValue::Integer(i) => DateStep::Days(*i),
                LiteralValue::String(s) => DateStep::Days(IntType::int4().parse(s)?),
                LiteralValue::Null => DateStep::Null,
            },
            (Some(cast), _) => {
                return Err(TypeError::NoPlusOperator {
                    left: "date".to_string(),
                    right: cast.to_string(),
                });
            }
            (None, LiteralValue::Integer(i)) => DateStep::Days(*i),
            (None, LiteralValue::String(s)) => match s.trim().parse::<i64>() {
                Ok(days) => DateStep::Days(days),
                Err(_) => DateStep::Interval(s.parse()?),
            },
        };
        Ok(Box::new(DatePlus { step }))
    }
}

#[derive(Debug, Clone, Copy)]
enum DateStep {
    Null,
    Days(i64),
    Interval(Interval),
}

#[derive(Debug)]
struct DatePlus {
    step: DateStep,
}

impl PlusOperator for DatePlus {
    fn evaluate(&self, param: &Datum) -> Result<Option<Datum>, TypeError> {
        let out_of_range = || TypeError::OutOfRange {
            type_name: "date".to_string(),
        };
        let Datum::Date(date) = param else {
            return Err(TypeError::CannotCast {
                type_name: "date".to_string(),
            });
        };
        let next = match self.step {
            DateStep::Null => return Ok(None),
            DateStep::Days(days) => TimeDelta::try_days(days)
                .and_then(|delta| date.checked_add_signed(delta))
                .ok_or_else(out_of_range)?,
            // date + interval yields a timestamp; assigning it back to date drops the time
            DateStep::Interval(interval) => add_interval(date.and_time(NaiveTime::MIN), interval)
                .ok_or_else(out_of_range)?
                .date(),
        };
        Ok(Some(Datum::Date(next)))
    }
}

/// `timestamp without time zone`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TimestampType;

impl KeyType for TimestampType {
    fn name(&self) -> &str {
        "timestamp without time zone"
    }

    fn compare(&self, left: &Datum, right: &Datum, _collation: Option<&str>) -> Ordering {
        match (left, right) {
            (Datum::Timestamp(l), Datum::Timestamp(r)) => l.cmp(r),
            _ => compare_mismatched(left, right),
        }
    }

    fn coerce(&self, literal: &Literal, _typmod: Option<i32>) -> Result<Option<Datum>, TypeError> {
        check_cast(literal, TIMESTAMP_TYPE_NAMES, self.name())?;
        match &literal.value {
            LiteralValue::Null => Ok(None),
            LiteralValue::Integer(_) => Err(TypeError::CannotCast {
                type_name: self.name().to_string(),
            }),
            LiteralValue::String(s) => parse_timestamp(s).map(|ts| Some(Datum::Timestamp(ts))),
        }
    }

    fn plus_operator(
        &self,
        step: &Literal,
        _typmod: Option<i32>,
    ) -> Result<Box<dyn PlusOperator>, TypeError> {
        let no_operator = |right: &str| TypeError::NoPlusOperator {
            left: self.name().to_string(),
            right: right.to_string(),
        };
        let step = match (step.cast.as_deref(), &step.value) {
            (_, LiteralValue::Null) => None,
            (Some(cast), value) if is_one_of(cast, INTERVAL_TYPE_NAMES) => {
                Some(interval_value(value)?)
            }
            (Some(cast), _) => return Err(no_operator(cast)),
            (None, LiteralValue::Integer(_)) => return Err(no_operator("integer")),
            (None, LiteralValue::String(s)) => Some(s.parse()?),
        };
        Ok(Box::new(TimestampPlus { step }))
    }
}

#[derive(Debug)]
struct TimestampPlus {
    step: Option<Interval>,
}

impl PlusOperator for TimestampPlus {
    fn evaluate(&self, param: &Datum) -> Result<Option<Datum>, TypeError> {
        let Some(step) = self.step else {
            return Ok(None);
        };
        let Datum::Timestamp(ts) = param else {
            return Err(TypeError::CannotCast {
                type_name: "timestamp without time zone".to_string(),
            });
        };
        add_interval(*ts, step)
            .map(|next| Some(Datum::Timestamp(next)))
            .ok_or_else(|| TypeError::OutOfRange {
                type_name: "timestamp".to_string(),
            })
    }
}

/// `text`, compared byte-wise.
///
/// Only the "C" ordering is implemented; any collation the column declares is accepted
/// and compared the same way.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TextType;

impl KeyType for TextType {
    fn name(&self) -> &str {
        "text"
    }

    fn compare(&self, left: &Datum, right: &Datum, _collation: Option<&str>) -> Ordering {
        match (left, right) {
            (Datum::Text(l), Datum::Text(r)) => l.as_bytes().cmp(r.as_bytes()),
            _ => compare_mismatched(left, right),
        }
    }

    fn coerce(&self, literal: &Literal, _typmod: Option<i32>) -> Result<Option<Datum>, TypeError> {
        check_cast(literal, TEXT_TYPE_NAMES, "text")?;
        match &literal.value {
            LiteralValue::Null => Ok(None),
            LiteralValue::Integer(i) => Ok(Some(Datum::Text(i.to_string()))),
            LiteralValue::String(s) => Ok(Some(Datum::Text(s.clone()))),
        }
    }

    fn plus_operator(
        &self,
        step: &Literal,
        _typmod: Option<i32>,
    ) -> Result<Box<dyn PlusOperator>, TypeError> {
        let right = match (&step.cast, &step.value) {
            (Some(cast), _) => cast.as_str(),
            (None, LiteralValue::Integer(_)) => "integer",
            (None, _) => "unknown",
        };
        Err(TypeError::NoPlusOperator {
            left: "text".to_string(),
            right: right.to_string(),
        })
    }
}

fn is_one_of(type_name: &str, names: &[&str]) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(type_name.trim()))
}

fn check_cast(literal: &Literal, accepted: &[&str], type_name: &str) -> Result<(), TypeError> {
    match &literal.cast {
        Some(cast) if !is_one_of(cast, accepted) => Err(TypeError::CannotCast {
            type_name: type_name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// The explicit cast of a step literal, if it is not one of `accepted`.
fn step_cast<'a>(step: &'a Literal, accepted: &[&str]) -> Option<&'a str> {
    step.cast
        .as_deref()
        .filter(|cast| !is_one_of(cast, accepted))
}

fn interval_value(value: &LiteralValue) -> Result<Interval, TypeError> {
    match value {
        LiteralValue::String(s) => s.parse(),
        LiteralValue::Integer(i) => Err(TypeError::InvalidInput {
            type_name: "interval".to_string(),
            input: i.to_string(),
        }),
        LiteralValue::Null => Err(TypeError::CannotCast {
            type_name: "interval".to_string(),
        }),
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, TypeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| TypeError::InvalidInput {
        type_name: "date".to_string(),
        input: input.to_string(),
    })
}

fn parse_timestamp(input: &str) -> Result<NaiveDateTime, TypeError> {
    let trimmed = input.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| parse_date(trimmed).ok().map(|d| d.and_time(NaiveTime::MIN)))
        .ok_or_else(|| TypeError::InvalidInput {
            type_name: "timestamp without time zone".to_string(),
            input: input.to_string(),
        })
}

/// `timestamp + interval`: months first (clamping to the end of the month), then days,
/// then the sub-day part.
fn add_interval(ts: NaiveDateTime, interval: Interval) -> Option<NaiveDateTime> {
    let ts = if interval.months >= 0 {
        ts.checked_add_months(Months::new(interval.months.unsigned_abs()))?
    } else {
        ts.checked_sub_months(Months::new(interval.months.unsigned_abs()))?
    };
    let ts = ts.checked_add_signed(TimeDelta::try_days(i64::from(interval.days))?)?;
    ts.checked_add_signed(TimeDelta::microseconds(interval.micros))
}

/// Values of different types never meet in a well-formed key; order them by type so
/// comparison stays total anyway.
fn compare_mismatched(left: &Datum, right: &Datum) -> Ordering {
    fn rank(datum: &Datum) -> u8 {
        match datum {
            Datum::Int2(_) | Datum::Int4(_) | Datum::Int8(_) => 0,
            Datum::Date(_) => 1,
            Datum::Timestamp(_) => 2,
            Datum::Text(_) => 3,
            Datum::Interval(_) => 4,
        }
    }
    rank(left).cmp(&rank(right))
}
