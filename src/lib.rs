//! ccheck - static analyzer for C and C++ source code
//!
//! The pipeline runs in fixed stages per file: tokenize, simplify, build the
//! symbol database, then run the checkers. Files are independent; the
//! diagnostic sink is the only state shared between them.

pub mod checks;
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod lexer;
pub mod runner;
pub mod simplify;
pub mod suppress;
pub mod symbols;

pub use crate::config::Settings;
pub use crate::core::{AnalysisError, Diagnostic, OutputFormat, Severity, SourceLocation};
pub use crate::runner::{analyze_source, run_files};
pub use crate::suppress::DiagnosticSink;
