use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::Location;

/// An untyped constant as written in the partition clause, e.g. `10`, `'2024-01-01'`,
/// `'1 month'::interval` or `'a' COLLATE "C"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub value: LiteralValue,
    /// Explicit `::type` cast attached to the constant, if any.
    #[serde(default)]
    pub cast: Option<String>,
    /// Explicit `COLLATE` clause attached to the constant, if any.
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralValue {
    Null,
    Integer(i64),
    String(String),
}

impl Literal {
    pub fn integer(value: i64) -> Self {
        Self::new(LiteralValue::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(LiteralValue::String(value.into()))
    }

    pub fn null() -> Self {
        Self::new(LiteralValue::Null)
    }

    fn new(value: LiteralValue) -> Self {
        Self {
            value,
            cast: None,
            collation: None,
            location: None,
        }
    }

    pub fn with_cast(mut self, type_name: impl Into<String>) -> Self {
        self.cast = Some(type_name.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn at(mut self, location: impl Into<Location>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, LiteralValue::Null)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            LiteralValue::Null => write!(f, "NULL")?,
            LiteralValue::Integer(i) => write!(f, "{i}")?,
            LiteralValue::String(s) => write!(f, "'{}'", s.replace('\'', "''"))?,
        }
        if let Some(cast) = &self.cast {
            write!(f, "::{cast}")?;
        }
        if let Some(collation) = &self.collation {
            write!(f, " COLLATE \"{collation}\"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_round_trips_surface_syntax() {
        assert_eq!(Literal::integer(-4).to_string(), "-4");
        assert_eq!(
            Literal::string("1 month").with_cast("interval").to_string(),
            "'1 month'::interval"
        );
        assert_eq!(
            Literal::string("it's").with_collation("C").to_string(),
            "'it''s' COLLATE \"C\""
        );
    }

    #[test]
    fn deserializes_with_optional_fields_absent() {
        let literal: Literal = serde_json::from_str(r#"{"value":{"Integer":7}}"#).unwrap();
        assert_eq!(literal, Literal::integer(7));
    }
}
