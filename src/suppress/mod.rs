//! Suppression filter and diagnostic sink
//!
//! Suppression rules come from two places: the configured suppression list
//! and inline `ccheck-suppress` directives collected during tokenization.
//! The sink is the single object shared across parallel file analyses;
//! every append goes through one mutex and deduplicates on the diagnostic's
//! rule id and primary location.

use crate::config::{Settings, SuppressionSpec};
use crate::core::Diagnostic;
use crate::lexer::{DirectiveKind, InlineDirective};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// An active suppression rule. Matching checks the rule-id pattern, then
/// the file pattern, then the line constraint; a rule without an id pattern
/// suppresses everything its location constraints cover.
#[derive(Debug, Clone)]
pub struct SuppressionRule {
    pub rule_pattern: Option<glob::Pattern>,
    pub file_pattern: Option<glob::Pattern>,
    /// Inclusive line range; single-line rules use (line, line), block
    /// rules span their directive pair
    pub line_range: Option<(usize, usize)>,
}

impl SuppressionRule {
    pub fn matches(&self, diagnostic: &Diagnostic) -> bool {
        if let Some(pattern) = &self.rule_pattern {
            if !pattern.matches(&diagnostic.rule_id) {
                return false;
            }
        }
        let location = diagnostic.primary_location();
        if let Some(pattern) = &self.file_pattern {
            if !pattern.matches(&location.file.to_string_lossy()) {
                return false;
            }
        }
        if let Some((start, end)) = self.line_range {
            if location.line < start || location.line > end {
                return false;
            }
        }
        true
    }
}

fn compile_pattern(text: &str) -> Option<glob::Pattern> {
    match glob::Pattern::new(text) {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            log::warn!("ignoring malformed suppression pattern '{text}': {err}");
            None
        }
    }
}

fn rule_pattern(text: &str) -> Option<glob::Pattern> {
    // A bare `*` means "any rule" and is represented as no pattern at all
    if text == "*" {
        None
    } else {
        compile_pattern(text)
    }
}

/// Build rules from the configured suppression list
pub fn rules_from_settings(settings: &Settings) -> Vec<SuppressionRule> {
    settings
        .suppressions
        .iter()
        .map(|spec| rule_from_spec(spec))
        .collect()
}

fn rule_from_spec(spec: &SuppressionSpec) -> SuppressionRule {
    SuppressionRule {
        rule_pattern: rule_pattern(&spec.rule),
        file_pattern: spec.file.as_deref().and_then(compile_pattern),
        line_range: spec.line.map(|line| (line, line)),
    }
}

/// Expand inline directives from one file into suppression rules scoped to
/// that file. Begin/end pairs bracket a block; an unclosed begin runs to the
/// end of the file and is logged once.
pub fn rules_from_directives(directives: &[InlineDirective], file: &Path) -> Vec<SuppressionRule> {
    let file_pattern = compile_pattern(&glob::Pattern::escape(&file.to_string_lossy()));
    let mut rules = Vec::new();
    let mut open_blocks: Vec<(&str, usize)> = Vec::new();

    for directive in directives {
        let line_range = match directive.kind {
            DirectiveKind::SameLine => Some((directive.line, directive.line)),
            DirectiveKind::NextLine => Some((directive.line + 1, directive.line + 1)),
            DirectiveKind::File => None,
            DirectiveKind::Begin => {
                open_blocks.push((&directive.rule_pattern, directive.line));
                continue;
            }
            DirectiveKind::End => {
                let Some(position) = open_blocks
                    .iter()
                    .rposition(|(pattern, _)| *pattern == directive.rule_pattern)
                else {
                    log::warn!(
                        "{}:{}: suppress-end without matching begin",
                        file.display(),
                        directive.line
                    );
                    continue;
                };
                let (_, start) = open_blocks.remove(position);
                Some((start, directive.line))
            }
        };
        rules.push(SuppressionRule {
            rule_pattern: rule_pattern(&directive.rule_pattern),
            file_pattern: file_pattern.clone(),
            line_range,
        });
    }

    for (pattern, start) in open_blocks {
        log::warn!(
            "{}:{}: suppress-begin without matching end",
            file.display(),
            start
        );
        rules.push(SuppressionRule {
            rule_pattern: rule_pattern(pattern),
            file_pattern: file_pattern.clone(),
            line_range: Some((start, usize::MAX)),
        });
    }
    rules
}

/// Mark every diagnostic matched by a rule as suppressed. The first
/// matching rule decides; order among rules is deterministic but carries no
/// meaning.
pub fn apply(diagnostics: &mut [Diagnostic], rules: &[SuppressionRule]) {
    for diagnostic in diagnostics.iter_mut() {
        if rules.iter().any(|rule| rule.matches(diagnostic)) {
            diagnostic.suppressed = true;
        }
    }
}

type DedupKey = (String, PathBuf, usize, usize);

#[derive(Default)]
struct SinkInner {
    seen: HashSet<DedupKey>,
    diagnostics: Vec<Diagnostic>,
}

/// The shared diagnostic sink. Appends are serialized; everything else in
/// an analysis session is file-private.
#[derive(Default)]
pub struct DiagnosticSink {
    inner: Mutex<SinkInner>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one diagnostic, collapsing duplicates with an identical
    /// (rule id, primary location).
    pub fn push(&self, diagnostic: Diagnostic) {
        let mut inner = self.inner.lock();
        let location = diagnostic.primary_location();
        let key = (
            diagnostic.rule_id.clone(),
            location.file.clone(),
            location.line,
            location.column,
        );
        if inner.seen.insert(key) {
            inner.diagnostics.push(diagnostic);
        }
    }

    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    /// All retained diagnostics, suppressed ones included, in a
    /// deterministic order independent of append order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.inner.into_inner().diagnostics;
        diagnostics.sort_by(|a, b| {
            let ka = a.primary_location();
            let kb = b.primary_location();
            (&ka.file, ka.line, ka.column, &a.rule_id).cmp(&(&kb.file, kb.line, kb.column, &b.rule_id))
        });
        diagnostics
    }

    /// Only the diagnostics that survive suppression
    pub fn into_reported(self) -> Vec<Diagnostic> {
        self.into_diagnostics()
            .into_iter()
            .filter(|d| !d.suppressed)
            .collect()
    }
}
