//! Shared data model for legacy partition expansion.
//!
//! The types in this crate describe both sides of an expansion:
//!
//! * the declarative input, a [`PartitionDefinition`] tree of
//!   [`PartitionElement`]s with their [`BoundaryClause`]s, storage options and
//!   column encodings, as handed over by the parser;
//! * the output, a list of [`GeneratedTableDescriptor`]s, each carrying a fully
//!   resolved [`PartitionBoundSpec`].
//!
//! The catalog collaborator plugs into the engine through the [`KeyType`] and
//! [`PlusOperator`] capability traits, which give typed access to comparison,
//! coercion and the `+` operator of a partition key column.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod bound;
pub use bound::{PartitionBoundSpec, RangeBounds, RangeDatum};
mod datum;
pub use datum::{Datum, Interval};
mod descriptor;
pub use descriptor::{DistributionPolicy, GeneratedTableDescriptor, Persistence, QualifiedName};
mod key;
pub use key::{KeyColumn, KeyType, PartitionKey, PlusOperator, TypeError};
mod literal;
pub use literal::{Literal, LiteralValue};
mod spec;
pub use spec::{
    BoundaryClause, ColumnEncoding, EncodingTarget, OptionValue, PartitionBy, PartitionDefinition,
    PartitionElement, PartitionStrategy, StorageOption,
};

/// Byte offset into the source text of the statement being expanded.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location(usize);

impl Location {
    pub fn new(offset: usize) -> Self {
        Self(offset)
    }

    pub fn offset(&self) -> usize {
        self.0
    }

    /// Resolve this offset into a 1-based `(line, column)` pair within `source_text`.
    ///
    /// Columns count characters, not bytes. Returns `None` when the offset lies
    /// past the end of the text or inside a multi-byte character.
    pub fn line_column(&self, source_text: &str) -> Option<(usize, usize)> {
        if self.0 > source_text.len() || !source_text.is_char_boundary(self.0) {
            return None;
        }
        let prefix = &source_text[..self.0];
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = prefix[line_start..].chars().count() + 1;
        Some((line, column))
    }
}

impl From<usize> for Location {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn line_column_of_first_line() {
        let sql = "CREATE TABLE t (a int)";
        assert_eq!(Location::new(0).line_column(sql), Some((1, 1)));
        assert_eq!(Location::new(7).line_column(sql), Some((1, 8)));
    }

    #[test]
    fn line_column_across_lines() {
        let sql = "CREATE TABLE t (a int)\nPARTITION BY RANGE (a)\n(START (1) END (10))";
        let offset = sql.find("END").unwrap();
        assert_eq!(Location::new(offset).line_column(sql), Some((3, 12)));
    }

    #[test]
    fn line_column_out_of_range() {
        assert_eq!(Location::new(100).line_column("short"), None);
        // offset 1 lands inside the two byte 'é'
        assert_eq!(Location::new(1).line_column("é"), None);
    }
}
