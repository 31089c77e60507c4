//! Shared error types for the analysis pipeline

use thiserror::Error;

/// Errors that can abort the analysis of a single file.
///
/// Every variant is contained at the file level: the runner converts it into
/// exactly one diagnostic and moves on to the next file.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Structurally unrecoverable token sequence (e.g. unmatched brackets)
    #[error("syntax error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A configured depth or time budget was exceeded mid-analysis
    #[error("resource budget exceeded: {0}")]
    ResourceExhausted(String),

    /// IO errors while reading source text
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Create a parse error with a line number
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// The rule id under which this error surfaces as a diagnostic
    pub fn rule_id(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "syntaxError",
            Self::ResourceExhausted(_) => "analysisIncomplete",
            Self::Io(_) => "internalError",
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = AnalysisError::parse(12, "unmatched '{'");
        assert_eq!(err.to_string(), "syntax error at line 12: unmatched '{'");
        assert_eq!(err.rule_id(), "syntaxError");
    }

    #[test]
    fn test_resource_exhausted_rule_id() {
        let err = AnalysisError::ResourceExhausted("template depth 40 exceeds 12".into());
        assert_eq!(err.rule_id(), "analysisIncomplete");
    }
}
