//! Expansion of the legacy `PARTITION BY` syntax into child table descriptors.
//!
//! Given a declarative partition definition (RANGE elements with `START`/`END`/`EVERY`,
//! LIST elements with value tuples, and at most one DEFAULT element), the
//! [`PartitionExpander`] produces one [`GeneratedTableDescriptor`] per child table, with:
//!
//! * boundaries resolved to the always-exclusive-upper form, `EVERY` clauses stepped out
//!   with the key type's own `+` operator, and open range sides inferred from the
//!   neighbouring partitions (see [`sort`]);
//! * storage options, access method and column encodings inherited from the parent and
//!   the partition configuration (see [`encoding`]);
//! * deterministic names compatible with historic numbering.
//!
//! The engine never touches storage: type capabilities and name lookups come from a
//! [`PartitionCatalog`](catalog::PartitionCatalog), and creating the tables is the
//! caller's business.
//!
//! [`GeneratedTableDescriptor`]: partgen_types::GeneratedTableDescriptor

use partgen_types::{Location, PartitionStrategy, TypeError};

pub mod bound_iter;
mod bound_value;
pub mod builtin;
pub mod catalog;
mod config;
pub use config::{
    DEFAULT_COLUMN_ENCODING_ACCESS_METHOD, DEFAULT_MAX_IDENTIFIER_LENGTH, DEFAULT_TABLENAME_OPTION,
    ExpansionConfig,
};
pub mod encoding;
mod expand;
pub use expand::{ExpandedPartition, InheritedSettings, PartitionExpander};
mod naming;
pub mod sort;
mod successor;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "missing boundary specification in partition {} of type {strategy}",
        display_name(.name)
    )]
    MissingBoundarySpecification {
        name: Option<String>,
        strategy: PartitionStrategy,
        location: Option<Location>,
    },

    #[error("invalid boundary specification for {strategy} partition: found a {found} boundary")]
    BoundaryStrategyMismatch {
        strategy: PartitionStrategy,
        found: &'static str,
        location: Option<Location>,
    },

    #[error("invalid number of {clause} values: expected {expected}, got {found}")]
    InvalidBoundaryArity {
        clause: &'static str,
        expected: usize,
        found: usize,
        location: Option<Location>,
    },

    #[error("cannot use NULL with range partition specification")]
    NullBoundaryValue { location: Option<Location> },

    #[error("invalid partition bound value for column \"{column}\": {source}")]
    InvalidBoundaryValue {
        column: String,
        source: TypeError,
        location: Option<Location>,
    },

    #[error(
        "collation of partition bound value for column \"{column}\" does not match partition key collation \"{expected}\""
    )]
    CollationMismatch {
        column: String,
        expected: String,
        location: Option<Location>,
    },

    #[error("too many columns for RANGE partition -- only one column is allowed, got {columns}")]
    MultiColumnRangeUnsupported { columns: usize },

    #[error("too many columns for LIST partition -- only one column is allowed, got {columns}")]
    MultiColumnListUnsupported { columns: usize },

    #[error("{strategy} partitioning is not supported by the legacy partition syntax")]
    UnsupportedStrategy { strategy: PartitionStrategy },

    #[error("EVERY clause requires START and END")]
    EveryRequiresStartEnd { location: Option<Location> },

    #[error("EVERY parameter too small")]
    NonMonotonicStep { location: Option<Location> },

    #[error("END parameter not reached before type overflows")]
    RangeOverflow { location: Option<Location> },

    #[error("cannot step partition key column \"{column}\": {source}")]
    NoOperator {
        column: String,
        source: TypeError,
        location: Option<Location>,
    },

    #[error("failed to compute next bound for partition key column \"{column}\": {source}")]
    StepEvaluation {
        column: String,
        source: TypeError,
        location: Option<Location>,
    },

    #[error("plus-operator returned NULL for partition key column \"{column}\"")]
    NullSuccessor { column: String },

    #[error("multiple default partitions are not allowed")]
    MultipleDefaultPartitions { location: Option<Location> },

    #[error("DEFAULT COLUMN ENCODING clause specified more than once for partition")]
    MultipleDefaultEncodings,

    #[error("invalid tablename specification")]
    InvalidTablenameOption,

    #[error("cannot use \"{name}\" as partition name: {reason}")]
    NameGenerationError {
        name: String,
        reason: String,
        location: Option<Location>,
    },

    #[error("no partitions specified at depth {depth}")]
    MissingSubpartitionDefinition {
        depth: usize,
        location: Option<Location>,
    },

    #[error(
        "cannot infer the upper bound of partition \"{name}\": the following partition \"{neighbour}\" has no START either"
    )]
    ImplicitBoundConflict { name: String, neighbour: String },

    #[error("relation {id} does not exist")]
    RelationNotFound { id: catalog::RelationId },

    #[error("column \"{column}\" named in partition key does not exist")]
    ColumnNotFound {
        column: String,
        location: Option<Location>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Where in the statement text the offending clause starts, when known.
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::MissingBoundarySpecification { location, .. }
            | Self::BoundaryStrategyMismatch { location, .. }
            | Self::InvalidBoundaryArity { location, .. }
            | Self::NullBoundaryValue { location }
            | Self::InvalidBoundaryValue { location, .. }
            | Self::CollationMismatch { location, .. }
            | Self::EveryRequiresStartEnd { location }
            | Self::NonMonotonicStep { location }
            | Self::RangeOverflow { location }
            | Self::NoOperator { location, .. }
            | Self::StepEvaluation { location, .. }
            | Self::MultipleDefaultPartitions { location }
            | Self::NameGenerationError { location, .. }
            | Self::MissingSubpartitionDefinition { location, .. }
            | Self::ColumnNotFound { location, .. } => *location,
            Self::MultiColumnRangeUnsupported { .. }
            | Self::MultiColumnListUnsupported { .. }
            | Self::UnsupportedStrategy { .. }
            | Self::NullSuccessor { .. }
            | Self::MultipleDefaultEncodings
            | Self::InvalidTablenameOption
            | Self::ImplicitBoundConflict { .. }
            | Self::RelationNotFound { .. } => None,
        }
    }

    fn name_generation(
        name: impl Into<String>,
        reason: impl Into<String>,
        location: Option<Location>,
    ) -> Self {
        Self::NameGenerationError {
            name: name.into(),
            reason: reason.into(),
            location,
        }
    }
}

fn display_name(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!("\"{n}\""))
        .unwrap_or_else(|| "<unnamed>".to_string())
}

fn display_position(position: &Option<(usize, usize)>) -> String {
    position
        .map(|(line, column)| format!(" at line {line}, column {column}"))
        .unwrap_or_default()
}

/// An [`Error`] together with its resolved position in the statement text.
#[derive(Debug, thiserror::Error)]
#[error("{source}{}", display_position(.position))]
pub struct ExpansionError {
    pub source: Error,
    /// 1-based `(line, column)` of the offending clause.
    pub position: Option<(usize, usize)>,
}

impl ExpansionError {
    pub(crate) fn new(source: Error, source_text: &str) -> Self {
        let position = source
            .location()
            .and_then(|location| location.line_column(source_text));
        Self { source, position }
    }

    pub fn error(&self) -> &Error {
        &self.source
    }

    pub fn into_inner(self) -> Error {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_error_reports_position() {
        let sql = "PARTITION BY RANGE (a)\n(PARTITION p START (1) END (10) EVERY (0))";
        let offset = sql.find("EVERY").unwrap();
        let err = ExpansionError::new(
            Error::NonMonotonicStep {
                location: Some(Location::new(offset)),
            },
            sql,
        );
        assert_eq!(err.position, Some((2, 33)));
        assert_eq!(
            err.to_string(),
            "EVERY parameter too small at line 2, column 33"
        );
    }

    #[test]
    fn expansion_error_without_location() {
        let err = ExpansionError::new(Error::MultipleDefaultEncodings, "whatever");
        assert_eq!(err.position, None);
        assert_eq!(
            err.to_string(),
            "DEFAULT COLUMN ENCODING clause specified more than once for partition"
        );
    }

    #[test]
    fn missing_boundary_message_names_partition() {
        let err = Error::MissingBoundarySpecification {
            name: Some("p1".into()),
            strategy: PartitionStrategy::Range,
            location: None,
        };
        assert_eq!(
            err.to_string(),
            "missing boundary specification in partition \"p1\" of type RANGE"
        );
    }
}
