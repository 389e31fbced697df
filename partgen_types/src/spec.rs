//! The declarative partitioning input, as produced by the parser for the legacy
//! `PARTITION BY ... ( PARTITION ... )` syntax.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{Literal, Location};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionStrategy {
    Range,
    List,
    Hash,
}

impl Display for PartitionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range => write!(f, "RANGE"),
            Self::List => write!(f, "LIST"),
            Self::Hash => write!(f, "HASH"),
        }
    }
}

/// A `PARTITION BY` / `SUBPARTITION BY` clause.
///
/// `definition` holds the partitions declared at this level. For a sub-partition key it
/// is either a `SUBPARTITION TEMPLATE` shared by every element of the level above, or
/// absent, in which case each element of the level above carries its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionBy {
    pub strategy: PartitionStrategy,
    pub columns: Vec<String>,
    #[serde(default)]
    pub definition: Option<PartitionDefinition>,
    #[serde(default)]
    pub sub_partition: Option<Box<PartitionBy>>,
    #[serde(default)]
    pub location: Option<Location>,
}

/// The list of partition elements at one level, together with the column encodings
/// declared at the partition configuration level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionDefinition {
    pub elements: Vec<PartitionElement>,
    #[serde(default)]
    pub column_encodings: Vec<ColumnEncoding>,
    /// Set when this definition is a `SUBPARTITION TEMPLATE`.
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub location: Option<Location>,
}

/// One `PARTITION` / `DEFAULT PARTITION` clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionElement {
    pub name: Option<String>,
    /// `None` only for malformed input; a DEFAULT partition carries
    /// [`BoundaryClause::Default`].
    pub boundary: Option<BoundaryClause>,
    #[serde(default)]
    pub options: Vec<StorageOption>,
    #[serde(default)]
    pub tablespace: Option<String>,
    #[serde(default)]
    pub access_method: Option<String>,
    #[serde(default)]
    pub column_encodings: Vec<ColumnEncoding>,
    /// The element's own sub-partition definition, used when the sub-partition key has
    /// no template.
    #[serde(default)]
    pub sub_partition: Option<PartitionDefinition>,
    #[serde(default)]
    pub location: Option<Location>,
}

impl PartitionElement {
    pub fn is_default(&self) -> bool {
        matches!(self.boundary, Some(BoundaryClause::Default))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundaryClause {
    /// `START (..) END (..) [INCLUSIVE] EVERY (..)`. Each present clause holds one value
    /// per key column; an absent `start` or `end` leaves that side open.
    Range {
        start: Option<Vec<Literal>>,
        end: Option<Vec<Literal>>,
        end_inclusive: bool,
        every: Option<Vec<Literal>>,
    },
    /// `VALUES ((..), (..))`, one tuple per listed value.
    List { values: Vec<Vec<Literal>> },
    Default,
}

impl BoundaryClause {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Range { .. } => "RANGE",
            Self::List { .. } => "LIST",
            Self::Default => "DEFAULT",
        }
    }
}

/// A `WITH (name = value)` storage parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOption {
    pub name: String,
    pub value: Option<OptionValue>,
}

impl StorageOption {
    pub fn new(name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl Display for StorageOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            None => write!(f, "{}", self.name),
            Some(OptionValue::String(s)) => write!(f, "{}={s}", self.name),
            Some(OptionValue::Integer(i)) => write!(f, "{}={i}", self.name),
            Some(OptionValue::Boolean(b)) => write!(f, "{}={b}", self.name),
        }
    }
}

/// A `COLUMN x ENCODING (..)` or `DEFAULT COLUMN ENCODING (..)` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEncoding {
    pub target: EncodingTarget,
    pub options: Vec<StorageOption>,
}

impl ColumnEncoding {
    pub fn column(name: impl Into<String>, options: Vec<StorageOption>) -> Self {
        Self {
            target: EncodingTarget::Column(name.into()),
            options,
        }
    }

    pub fn default_encoding(options: Vec<StorageOption>) -> Self {
        Self {
            target: EncodingTarget::Default,
            options,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self.target, EncodingTarget::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingTarget {
    Column(String),
    Default,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn spec_tree_from_json() {
        let json = r#"{
            "elements": [
                {
                    "name": "p1",
                    "boundary": {
                        "Range": {
                            "start": [{"value": {"Integer": 1}}],
                            "end": [{"value": {"Integer": 10}}],
                            "end_inclusive": false,
                            "every": [{"value": {"Integer": 3}}]
                        }
                    }
                },
                {"name": "other", "boundary": "Default"}
            ],
            "column_encodings": [
                {"target": "Default", "options": [{"name": "compresstype", "value": {"String": "zlib"}}]}
            ]
        }"#;
        let definition: PartitionDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(definition.elements.len(), 2);
        assert!(!definition.elements[0].is_default());
        assert!(definition.elements[1].is_default());
        assert!(definition.column_encodings[0].is_default());
        assert!(!definition.is_template);
    }

    #[test]
    fn storage_option_display() {
        assert_eq!(
            StorageOption::new("appendonly", true).to_string(),
            "appendonly=true"
        );
        assert_eq!(
            StorageOption::new("compresslevel", 5_i64).to_string(),
            "compresslevel=5"
        );
    }
}
