//! Merging of column encoding directives across the table, partition configuration and
//! partition element levels.
//!
//! A more specific level always wins: a column directive on the element is never
//! replaced by one from the configuration, and a DEFAULT directive on the element makes
//! the configuration's DEFAULT irrelevant.

use partgen_types::ColumnEncoding;

use crate::{Error, Result};

/// Column-specific directives and the (at most one) DEFAULT directive of a level.
fn split_encodings(
    encodings: &[ColumnEncoding],
) -> Result<(Vec<&ColumnEncoding>, Option<&ColumnEncoding>)> {
    let mut columns = Vec::with_capacity(encodings.len());
    let mut default = None;
    for encoding in encodings {
        if encoding.is_default() {
            if default.is_some() {
                return Err(Error::MultipleDefaultEncodings);
            }
            default = Some(encoding);
        } else {
            columns.push(encoding);
        }
    }
    Ok((columns, default))
}

/// Merge the directives of a less specific level (`config`) into those of `element`.
///
/// The element's own directives come first, in their declared order, followed by the
/// configuration's directives for columns the element does not mention and finally the
/// configuration's DEFAULT when the element has none.
pub fn merge_encodings(
    element: &[ColumnEncoding],
    config: &[ColumnEncoding],
) -> Result<Vec<ColumnEncoding>> {
    let (element_columns, element_default) = split_encodings(element)?;
    let (config_columns, config_default) = split_encodings(config)?;

    if config.is_empty() {
        return Ok(element.to_vec());
    }
    if element.is_empty() {
        return Ok(config.to_vec());
    }

    let mut merged = element.to_vec();
    merged.extend(
        config_columns
            .into_iter()
            .filter(|directive| {
                !element_columns
                    .iter()
                    .any(|own| own.target == directive.target)
            })
            .cloned(),
    );

    if element_default.is_none() {
        merged.extend(config_default.cloned());
    }

    Ok(merged)
}
