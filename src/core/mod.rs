pub mod errors;
pub mod types;

pub use errors::{AnalysisError, Result};
pub use types::{Diagnostic, OutputFormat, Severity, SourceLocation};
