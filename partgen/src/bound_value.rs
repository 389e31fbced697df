//! Transformation of boundary literals into values of the partition key column type.

use partgen_types::{Datum, KeyColumn, Literal};

use crate::{Error, Result};

const DEFAULT_COLLATION: &str = "default";

/// Reject an explicit `COLLATE` that is neither the default collation nor the one the
/// key column declares.
pub(crate) fn check_collation(column: &KeyColumn, literal: &Literal) -> Result<()> {
    let Some(collation) = literal.collation.as_deref() else {
        return Ok(());
    };
    if collation == DEFAULT_COLLATION || column.collation.as_deref() == Some(collation) {
        return Ok(());
    }
    Err(Error::CollationMismatch {
        column: column.name.clone(),
        expected: column
            .collation
            .clone()
            .unwrap_or_else(|| DEFAULT_COLLATION.to_string()),
        location: literal.location,
    })
}

/// Coerce a LIST or RANGE bound literal. `None` is a SQL NULL.
pub(crate) fn transform_bound_value(
    column: &KeyColumn,
    literal: &Literal,
) -> Result<Option<Datum>> {
    check_collation(column, literal)?;
    column
        .key_type
        .coerce(literal, column.typmod)
        .map_err(|source| Error::InvalidBoundaryValue {
            column: column.name.clone(),
            source,
            location: literal.location,
        })
}

/// Coerce a `START` or `END` literal, which may not be NULL.
pub(crate) fn transform_range_value(column: &KeyColumn, literal: &Literal) -> Result<Datum> {
    transform_bound_value(column, literal)?.ok_or(Error::NullBoundaryValue {
        location: literal.location,
    })
}
