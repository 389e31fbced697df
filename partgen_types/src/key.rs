use std::{cmp::Ordering, fmt::Debug, sync::Arc};

use crate::{Datum, Literal, PartitionStrategy};

/// Errors raised by a [`KeyType`] implementation while coercing or computing values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("invalid input syntax for type {type_name}: \"{input}\"")]
    InvalidInput { type_name: String, input: String },

    #[error("{type_name} out of range")]
    OutOfRange { type_name: String },

    #[error("specified value cannot be cast to type {type_name}")]
    CannotCast { type_name: String },

    #[error("operator does not exist: {left} + {right}")]
    NoPlusOperator { left: String, right: String },
}

/// Type capabilities of a partition key column, supplied by the catalog.
///
/// Implementations must be deterministic: the engine relies on `compare` being a total
/// order over the values produced by `coerce` and `PlusOperator::evaluate`.
pub trait KeyType: Debug + Send + Sync {
    /// SQL name of the type, used in diagnostics.
    fn name(&self) -> &str;

    /// Three-way comparison under the given collation.
    fn compare(&self, left: &Datum, right: &Datum, collation: Option<&str>) -> Ordering;

    /// Transform a boundary literal into a value of this type, applying an implicit or
    /// explicit cast. `Ok(None)` is returned for a SQL NULL.
    fn coerce(&self, literal: &Literal, typmod: Option<i32>) -> Result<Option<Datum>, TypeError>;

    /// Resolve `<value of this type> + <step>` and bind the step operand.
    ///
    /// The step does not need to be of this type (a timestamp steps by an interval); the
    /// operator's result must be assignable back to this type.
    fn plus_operator(
        &self,
        step: &Literal,
        typmod: Option<i32>,
    ) -> Result<Box<dyn PlusOperator>, TypeError>;

    /// Copy a value out of transient evaluation storage so it can be kept.
    fn copy_datum(&self, datum: &Datum) -> Datum {
        datum.clone()
    }
}

/// A resolved `+` operator with its right-hand operand already bound.
pub trait PlusOperator: Debug + Send {
    /// Evaluate `param + step`. `Ok(None)` means the operator produced NULL.
    fn evaluate(&self, param: &Datum) -> Result<Option<Datum>, TypeError>;
}

/// One column of a partition key.
#[derive(Debug, Clone)]
pub struct KeyColumn {
    pub name: String,
    pub key_type: Arc<dyn KeyType>,
    pub typmod: Option<i32>,
    pub collation: Option<String>,
}

impl KeyColumn {
    pub fn new(name: impl Into<String>, key_type: Arc<dyn KeyType>) -> Self {
        Self {
            name: name.into(),
            key_type,
            typmod: None,
            collation: None,
        }
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        self.key_type
            .compare(left, right, self.collation.as_deref())
    }
}

/// The partition key of a parent table: its strategy and key columns.
#[derive(Debug, Clone)]
pub struct PartitionKey {
    pub strategy: PartitionStrategy,
    pub columns: Vec<KeyColumn>,
}

impl PartitionKey {
    pub fn new(strategy: PartitionStrategy, columns: Vec<KeyColumn>) -> Self {
        Self { strategy, columns }
    }
}
