//! Check engine and the individual checkers
//!
//! Each checker is a read-only pattern scan over the simplified token stream
//! and the symbol database. Checkers never mutate shared analysis state and
//! never see each other's findings, so their order carries no meaning. A
//! panicking checker is contained: it loses its own findings for the file
//! and everything else proceeds.

pub mod null_pointer;
pub mod shadow;
pub mod uninit_var;
pub mod unused_var;
pub mod zero_div;

use crate::config::Settings;
use crate::core::{AnalysisError, Diagnostic, Result, Severity, SourceLocation};
use crate::lexer::{TokenId, TokenList};
use crate::symbols::SymbolDatabase;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

/// Identity of one rule a checker can report under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    pub id: &'static str,
    pub severity: Severity,
}

/// Read-only view of one analyzed file, handed to every checker
pub struct AnalysisContext<'a> {
    pub tokens: &'a TokenList,
    pub symbols: &'a SymbolDatabase,
    pub settings: &'a Settings,
    pub path: &'a Path,
}

impl AnalysisContext<'_> {
    pub fn location(&self, token: TokenId) -> SourceLocation {
        let t = self.tokens.at(token);
        SourceLocation::new(self.path, t.line, t.column)
    }

    pub fn diagnostic(
        &self,
        rule: RuleMeta,
        message: impl Into<String>,
        token: TokenId,
    ) -> Diagnostic {
        Diagnostic::new(rule.id, rule.severity, message, self.location(token))
    }
}

pub trait Check {
    fn name(&self) -> &'static str;

    /// The rules this checker can report under
    fn rules(&self) -> &'static [RuleMeta];

    fn run(&self, ctx: &AnalysisContext) -> Vec<Diagnostic>;
}

/// All registered checkers, in registration order
pub fn all_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(null_pointer::NullPointerCheck),
        Box::new(uninit_var::UninitVarCheck),
        Box::new(zero_div::ZeroDivCheck),
        Box::new(shadow::ShadowCheck),
        Box::new(unused_var::UnusedVarCheck),
    ]
}

pub struct CheckEngine {
    checks: Vec<Box<dyn Check>>,
}

impl Default for CheckEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckEngine {
    pub fn new() -> Self {
        Self {
            checks: all_checks(),
        }
    }

    pub fn with_checks(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    /// Run every checker over the context. The deadline is polled between
    /// checkers; once it passes, the file's analysis is abandoned whole so a
    /// timeout never yields a partial finding set.
    pub fn run(
        &self,
        ctx: &AnalysisContext,
        deadline: Option<Instant>,
    ) -> Result<Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();
        for check in &self.checks {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(AnalysisError::ResourceExhausted(format!(
                    "time budget exhausted before checker '{}'",
                    check.name()
                )));
            }
            match panic::catch_unwind(AssertUnwindSafe(|| check.run(ctx))) {
                Ok(found) => {
                    diagnostics.extend(
                        found
                            .into_iter()
                            .filter(|d| ctx.settings.is_enabled(d.severity)),
                    );
                }
                Err(_) => {
                    log::warn!(
                        "checker '{}' failed on {}; its findings for this file are dropped",
                        check.name(),
                        ctx.path.display()
                    );
                    if ctx.settings.is_enabled(Severity::Information) {
                        diagnostics.push(Diagnostic::new(
                            "internalError",
                            Severity::Information,
                            format!("Checker '{}' failed on this file.", check.name()),
                            SourceLocation::new(ctx.path, 0, 0),
                        ));
                    }
                }
            }
        }
        Ok(diagnostics)
    }
}

/// True when the token is the operand of a unary `*`, or is followed by
/// `->` or an index bracket. Callers decide whether the token names a
/// pointer; this only recognizes the dereference shape.
pub(crate) fn is_dereferenced(tokens: &TokenList, id: TokenId) -> bool {
    let token = tokens.at(id);
    if token.ast_parent.is_some_and(|parent| {
        tokens.matches(parent, "*") && tokens.at(parent).ast_op2.is_none()
    }) {
        return true;
    }
    if tokens.next(id).is_some_and(|next| {
        tokens.matches(next, "->") || tokens.kind(next) == crate::lexer::TokenKind::OpenBracket
    }) {
        return true;
    }
    // Inside call arguments no AST links exist, so fall back to the token
    // before the `*` to separate dereference from multiplication
    tokens.prev(id).is_some_and(|star| {
        tokens.matches(star, "*") && !value_ends_before(tokens, star)
    })
}

/// True when the token's address is taken with a unary `&`
pub(crate) fn is_address_taken(tokens: &TokenList, id: TokenId) -> bool {
    tokens.prev(id).is_some_and(|amp| {
        tokens.matches(amp, "&") && !value_ends_before(tokens, amp)
    })
}

/// True when a value expression ends right before `id`, which makes a
/// following `*` or `&` a binary operator
fn value_ends_before(tokens: &TokenList, id: TokenId) -> bool {
    use crate::lexer::TokenKind;
    tokens.prev(id).is_some_and(|before| {
        matches!(
            tokens.kind(before),
            TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::CloseParen
                | TokenKind::CloseBracket
        )
    })
}

/// True when the token is the target of a plain `=` assignment (a write
/// that does not read the previous value)
pub(crate) fn is_pure_write(tokens: &TokenList, id: TokenId) -> bool {
    if is_dereferenced(tokens, id) {
        return false;
    }
    tokens.next(id).is_some_and(|next| tokens.matches(next, "="))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::simplify::simplify;
    use std::path::PathBuf;
    use std::time::Duration;

    fn analyze(source: &str, settings: &Settings) -> Vec<Diagnostic> {
        let mut parsed = tokenize(source).unwrap();
        simplify(&mut parsed.tokens, settings).unwrap();
        let symbols = SymbolDatabase::build(&mut parsed.tokens);
        let ctx = AnalysisContext {
            tokens: &parsed.tokens,
            symbols: &symbols,
            settings,
            path: Path::new("test.c"),
        };
        CheckEngine::new().run(&ctx, None).unwrap()
    }

    struct PanickingCheck;

    impl Check for PanickingCheck {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn rules(&self) -> &'static [RuleMeta] {
            &[]
        }
        fn run(&self, _ctx: &AnalysisContext) -> Vec<Diagnostic> {
            panic!("deliberate failure");
        }
    }

    struct CountingCheck;

    impl Check for CountingCheck {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn rules(&self) -> &'static [RuleMeta] {
            &[RuleMeta {
                id: "counting",
                severity: Severity::Style,
            }]
        }
        fn run(&self, ctx: &AnalysisContext) -> Vec<Diagnostic> {
            vec![Diagnostic::new(
                "counting",
                Severity::Style,
                "ran",
                SourceLocation::new(ctx.path, 1, 1),
            )]
        }
    }

    fn run_with(checks: Vec<Box<dyn Check>>, deadline: Option<Instant>) -> Result<Vec<Diagnostic>> {
        let mut parsed = tokenize("int x;").unwrap();
        let settings = Settings::default();
        simplify(&mut parsed.tokens, &settings).unwrap();
        let symbols = SymbolDatabase::build(&mut parsed.tokens);
        let path = PathBuf::from("test.c");
        let ctx = AnalysisContext {
            tokens: &parsed.tokens,
            symbols: &symbols,
            settings: &settings,
            path: &path,
        };
        CheckEngine::with_checks(checks).run(&ctx, deadline)
    }

    #[test]
    fn test_panicking_checker_does_not_poison_others() {
        let diagnostics =
            run_with(vec![Box::new(PanickingCheck), Box::new(CountingCheck)], None).unwrap();
        assert!(diagnostics.iter().any(|d| d.rule_id == "counting"));
        assert!(diagnostics.iter().any(|d| d.rule_id == "internalError"));
    }

    #[test]
    fn test_same_finding_from_two_checkers_collapses_in_sink() {
        let diagnostics =
            run_with(vec![Box::new(CountingCheck), Box::new(CountingCheck)], None).unwrap();
        assert_eq!(diagnostics.len(), 2);
        let sink = crate::suppress::DiagnosticSink::new();
        sink.extend(diagnostics);
        assert_eq!(sink.into_reported().len(), 1);
    }

    #[test]
    fn test_expired_deadline_abandons_the_file() {
        let deadline = Some(Instant::now() - Duration::from_millis(1));
        let err = run_with(vec![Box::new(CountingCheck)], deadline).unwrap_err();
        assert!(matches!(err, AnalysisError::ResourceExhausted(_)));
    }

    #[test]
    fn test_disabled_severity_filtered() {
        let settings = Settings {
            enabled: vec![Severity::Error],
            ..Settings::default()
        };
        let diagnostics = analyze("void f() { int unused_local; }", &settings);
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn test_clean_source_reports_nothing() {
        let diagnostics = analyze(
            "int add(int a, int b) { return a + b; } void f() { int s = add(1, 2); use(s); }",
            &Settings::default(),
        );
        assert!(diagnostics.is_empty(), "unexpected: {diagnostics:?}");
    }
}
