//! Test utilities for partition expansion: fluent builders for partition definitions and
//! a key type whose `+` wraps around instead of failing.

mod builder;
mod wrapping;

pub use builder::{DefinitionBuilder, ElementBuilder, int, text};
pub use wrapping::WrappingSmallint;
