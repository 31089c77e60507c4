//! Analysis settings
//!
//! The settings object is handed in by the external work distributor; the
//! core itself never reads configuration files.

use crate::core::Severity;
use serde::{Deserialize, Serialize};

/// One configured suppression, as written in settings or on the command
/// line: a rule-id pattern with optional file glob and line constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionSpec {
    pub rule: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Severities whose diagnostics are reported
    pub enabled: Vec<Severity>,
    /// Template nesting beyond this depth aborts the file
    pub max_template_depth: usize,
    /// Per-file wall-clock budget; None means unlimited
    pub time_budget_ms: Option<u64>,
    /// Honor `ccheck-suppress` comments found in source
    pub inline_suppressions: bool,
    pub suppressions: Vec<SuppressionSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: Severity::all(),
            max_template_depth: 12,
            time_budget_ms: None,
            inline_suppressions: true,
            suppressions: Vec::new(),
        }
    }
}

impl Settings {
    pub fn is_enabled(&self, severity: Severity) -> bool {
        self.enabled.contains(&severity)
    }
}
