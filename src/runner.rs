//! Per-file analysis pipeline and the parallel multi-file runner
//!
//! Files are analyzed independently and in any order; the diagnostic sink is
//! the only shared object, so the reported set is identical whether the run
//! is parallel or sequential. Every per-file failure is contained: it
//! becomes exactly one diagnostic and the run moves on.

use crate::checks::{AnalysisContext, CheckEngine};
use crate::config::Settings;
use crate::core::{AnalysisError, Diagnostic, Result, Severity, SourceLocation};
use crate::lexer::{tokenize, InlineDirective};
use crate::simplify::simplify;
use crate::suppress::{self, DiagnosticSink};
use crate::symbols::SymbolDatabase;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Analyze one file's source text, pushing its findings into the sink.
pub fn analyze_source(path: &Path, source: &str, settings: &Settings, sink: &DiagnosticSink) {
    let mut directives = Vec::new();
    let diagnostics = match run_pipeline(path, source, settings, &mut directives) {
        Ok(diagnostics) => diagnostics,
        Err(err) => {
            log::debug!("{}: analysis aborted: {err}", path.display());
            vec![failure_diagnostic(path, &err)]
        }
    };

    let mut rules = suppress::rules_from_settings(settings);
    if settings.inline_suppressions {
        rules.extend(suppress::rules_from_directives(&directives, path));
    }
    let mut diagnostics = diagnostics;
    suppress::apply(&mut diagnostics, &rules);
    sink.extend(
        diagnostics
            .into_iter()
            .filter(|d| settings.is_enabled(d.severity)),
    );
}

fn run_pipeline(
    path: &Path,
    source: &str,
    settings: &Settings,
    directives_out: &mut Vec<InlineDirective>,
) -> Result<Vec<Diagnostic>> {
    let deadline = settings
        .time_budget_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let mut parsed = tokenize(source)?;
    *directives_out = std::mem::take(&mut parsed.directives);

    simplify(&mut parsed.tokens, settings)?;
    check_deadline(deadline, "simplification")?;

    let symbols = SymbolDatabase::build(&mut parsed.tokens);
    check_deadline(deadline, "symbol resolution")?;

    let ctx = AnalysisContext {
        tokens: &parsed.tokens,
        symbols: &symbols,
        settings,
        path,
    };
    CheckEngine::new().run(&ctx, deadline)
}

fn check_deadline(deadline: Option<Instant>, stage: &str) -> Result<()> {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Err(AnalysisError::ResourceExhausted(format!(
            "time budget exhausted after {stage}"
        )));
    }
    Ok(())
}

/// The single diagnostic a failed file contributes
fn failure_diagnostic(path: &Path, err: &AnalysisError) -> Diagnostic {
    let (severity, line) = match err {
        AnalysisError::Parse { line, .. } => (Severity::Error, *line),
        AnalysisError::ResourceExhausted(_) => (Severity::Information, 0),
        AnalysisError::Io(_) => (Severity::Error, 0),
    };
    Diagnostic::new(
        err.rule_id(),
        severity,
        err.to_string(),
        SourceLocation::new(path, line, 0),
    )
}

/// Analyze many files, fanning out across the rayon thread pool, and return
/// the unsuppressed findings in deterministic order.
pub fn run_files(paths: &[PathBuf], settings: &Settings) -> Vec<Diagnostic> {
    let sink = DiagnosticSink::new();
    paths.par_iter().for_each(|path| {
        match std::fs::read_to_string(path) {
            Ok(source) => analyze_source(path, &source, settings, &sink),
            Err(err) => {
                let err = AnalysisError::from(err);
                sink.push(failure_diagnostic(path, &err));
            }
        }
    });
    sink.into_reported()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(source: &str, settings: &Settings) -> Vec<Diagnostic> {
        let sink = DiagnosticSink::new();
        analyze_source(Path::new("test.c"), source, settings, &sink);
        sink.into_reported()
    }

    #[test]
    fn test_null_deref_reported_end_to_end() {
        let diagnostics = analyze("void f() { int *p = 0; *p = 5; }", &Settings::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_id, "nullPointer");
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_inline_suppression_silences_finding() {
        let source = "void f() {\n    int *p = 0;\n    // ccheck-suppress nullPointer\n    *p = 5;\n}\n";
        let diagnostics = analyze(source, &Settings::default());
        assert!(diagnostics.is_empty(), "unexpected: {diagnostics:?}");
    }

    #[test]
    fn test_inline_suppression_ignored_when_disabled() {
        let source = "void f() {\n    int *p = 0;\n    // ccheck-suppress nullPointer\n    *p = 5;\n}\n";
        let settings = Settings {
            inline_suppressions: false,
            ..Settings::default()
        };
        let diagnostics = analyze(source, &settings);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_unmatched_brace_yields_exactly_one_syntax_error() {
        let diagnostics = analyze(
            "void f() { int *p = 0; *p = 5;",
            &Settings::default(),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_id, "syntaxError");
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_configured_suppression_applies() {
        let settings = Settings {
            suppressions: vec![crate::config::SuppressionSpec {
                rule: "nullPointer".into(),
                file: None,
                line: None,
            }],
            ..Settings::default()
        };
        let diagnostics = analyze("void f() { int *p = 0; *p = 5; }", &settings);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_template_depth_overflow_abandons_file() {
        let settings = Settings {
            max_template_depth: 2,
            ..Settings::default()
        };
        let diagnostics = analyze(
            "a<b<c<d<e<int>>>>> deep; void f() { int *p = 0; *p = 5; }",
            &settings,
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_id, "analysisIncomplete");
    }

    #[test]
    fn test_missing_file_reported_not_fatal() {
        let diagnostics = run_files(
            &[PathBuf::from("/nonexistent/missing.c")],
            &Settings::default(),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_id, "internalError");
    }
}
