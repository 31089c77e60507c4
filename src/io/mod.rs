//! Report writers

pub mod output;

pub use output::{create_writer, OutputWriter};
