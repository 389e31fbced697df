use chrono::{NaiveDate, NaiveDateTime};
use std::{fmt::Display, str::FromStr};

use crate::TypeError;

/// A literal after coercion to a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datum {
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Text(String),
    Interval(Interval),
}

impl Datum {
    /// Name of the SQL type this value belongs to.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int2(_) => "smallint",
            Self::Int4(_) => "integer",
            Self::Int8(_) => "bigint",
            Self::Date(_) => "date",
            Self::Timestamp(_) => "timestamp without time zone",
            Self::Text(_) => "text",
            Self::Interval(_) => "interval",
        }
    }
}

impl Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int2(v) => write!(f, "{v}"),
            Self::Int4(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "'{}'", d.format("%Y-%m-%d")),
            Self::Timestamp(ts) => write!(f, "'{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Interval(i) => write!(f, "'{i}'"),
        }
    }
}

/// A calendar-aware span of time, split the way PostgreSQL splits it: months and days
/// do not have a fixed length, so they are kept apart from the sub-day part.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

impl Interval {
    pub fn new(months: i32, days: i32, micros: i64) -> Self {
        Self {
            months,
            days,
            micros,
        }
    }
}

impl FromStr for Interval {
    type Err = TypeError;

    /// Parse intervals written as a sequence of `<quantity> <unit>` pairs, such as
    /// `1 month`, `7 days` or `2 hours 30 minutes`. A leading `@` and unit
    /// abbreviations (`mon`, `d`, `h`, `min`, `s`, ...) are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidInput {
            type_name: "interval".to_string(),
            input: s.to_string(),
        };

        let mut tokens = s.trim().trim_start_matches('@').split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Err(invalid());
        }

        let mut interval = Self::default();
        while let Some(token) = tokens.next() {
            // both "3 days" and "3days" are fine
            let split = token
                .find(|c: char| c.is_ascii_alphabetic())
                .unwrap_or(token.len());
            let (quantity, unit) = token.split_at(split);
            let unit = if unit.is_empty() {
                tokens.next().ok_or_else(invalid)?
            } else {
                unit
            };
            let quantity: i64 = quantity.parse().map_err(|_| invalid())?;

            let overflow = || TypeError::OutOfRange {
                type_name: "interval".to_string(),
            };
            let add_months = |iv: &mut Self, months: i64| -> Result<(), TypeError> {
                let months = i32::try_from(months).map_err(|_| overflow())?;
                iv.months = iv.months.checked_add(months).ok_or_else(overflow)?;
                Ok(())
            };
            let add_days = |iv: &mut Self, days: i64| -> Result<(), TypeError> {
                let days = i32::try_from(days).map_err(|_| overflow())?;
                iv.days = iv.days.checked_add(days).ok_or_else(overflow)?;
                Ok(())
            };
            let add_micros = |iv: &mut Self, quantity: i64, scale: i64| -> Result<(), TypeError> {
                let micros = quantity.checked_mul(scale).ok_or_else(overflow)?;
                iv.micros = iv.micros.checked_add(micros).ok_or_else(overflow)?;
                Ok(())
            };

            match unit.to_ascii_lowercase().as_str() {
                "year" | "years" | "y" | "yr" | "yrs" => {
                    add_months(&mut interval, quantity.checked_mul(12).ok_or_else(overflow)?)?
                }
                "month" | "months" | "mon" | "mons" => add_months(&mut interval, quantity)?,
                "week" | "weeks" | "w" => {
                    add_days(&mut interval, quantity.checked_mul(7).ok_or_else(overflow)?)?
                }
                "day" | "days" | "d" => add_days(&mut interval, quantity)?,
                "hour" | "hours" | "h" | "hr" | "hrs" => {
                    add_micros(&mut interval, quantity, MICROS_PER_HOUR)?
                }
                "minute" | "minutes" | "m" | "min" | "mins" => {
                    add_micros(&mut interval, quantity, MICROS_PER_MINUTE)?
                }
                "second" | "seconds" | "s" | "sec" | "secs" => {
                    add_micros(&mut interval, quantity, MICROS_PER_SECOND)?
                }
                _ => return Err(invalid()),
            }
        }

        Ok(interval)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        let years = self.months / 12;
        let months = self.months % 12;
        if years != 0 {
            parts.push(format!("{years} {}", plural(years, "year", "years")));
        }
        if months != 0 {
            parts.push(format!("{months} {}", plural(months, "mon", "mons")));
        }
        if self.days != 0 {
            parts.push(format!("{} {}", self.days, plural(self.days, "day", "days")));
        }
        if self.micros != 0 || parts.is_empty() {
            let sign = if self.micros < 0 { "-" } else { "" };
            let micros = self.micros.unsigned_abs();
            let hours = micros / MICROS_PER_HOUR as u64;
            let minutes = (micros % MICROS_PER_HOUR as u64) / MICROS_PER_MINUTE as u64;
            let seconds = (micros % MICROS_PER_MINUTE as u64) / MICROS_PER_SECOND as u64;
            let fraction = micros % MICROS_PER_SECOND as u64;
            let mut time = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if fraction != 0 {
                time.push_str(&format!(".{fraction:06}"));
            }
            parts.push(time);
        }
        write!(f, "{}", parts.join(" "))
    }
}

fn plural(n: i32, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 || n == -1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_intervals() {
        assert_eq!("1 month".parse::<Interval>().unwrap(), Interval::new(1, 0, 0));
        assert_eq!("@ 2 years 3 days".parse::<Interval>().unwrap(), Interval::new(24, 3, 0));
        assert_eq!("1 week".parse::<Interval>().unwrap(), Interval::new(0, 7, 0));
        assert_eq!(
            "2 hours 30 minutes".parse::<Interval>().unwrap(),
            Interval::new(0, 0, 2 * MICROS_PER_HOUR + 30 * MICROS_PER_MINUTE)
        );
        assert_eq!("5days".parse::<Interval>().unwrap(), Interval::new(0, 5, 0));
        assert_eq!("0 days".parse::<Interval>().unwrap(), Interval::default());
    }

    #[test]
    fn parse_interval_failures() {
        assert!("".parse::<Interval>().is_err());
        assert!("3".parse::<Interval>().is_err());
        assert!("1 fortnight".parse::<Interval>().is_err());
        assert!("many days".parse::<Interval>().is_err());
        assert!(matches!(
            "3000000000 days".parse::<Interval>(),
            Err(TypeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn display_intervals() {
        assert_eq!(Interval::new(14, 1, 0).to_string(), "1 year 2 mons 1 day");
        assert_eq!(
            Interval::new(0, 0, MICROS_PER_HOUR + 5 * MICROS_PER_SECOND).to_string(),
            "01:00:05"
        );
        assert_eq!(Interval::default().to_string(), "00:00:00");
    }

    #[test]
    fn display_datums() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Datum::Date(date).to_string(), "'2024-02-29'");
        assert_eq!(
            Datum::Timestamp(date.and_hms_opt(13, 5, 0).unwrap()).to_string(),
            "'2024-02-29 13:05:00'"
        );
        assert_eq!(Datum::Int4(-3).to_string(), "-3");
        assert_eq!(Datum::Text("o'k".into()).to_string(), "'o''k'");
    }
}
