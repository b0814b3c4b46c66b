//! Delimited text output (CSV)

pub mod writer;

pub use writer::{DelimitedWriter, WriteStats};
