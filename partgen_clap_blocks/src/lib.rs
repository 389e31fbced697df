//! Command line and environment configuration blocks for the partition expansion engine.

pub mod expansion;
