//! Command line interface

use crate::config::{Settings, SuppressionSpec};
use crate::core::{OutputFormat, Severity};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ccheck")]
#[command(about = "Static analyzer for C and C++ source code", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Files or directories to analyze
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Severities to report (defaults to all)
    #[arg(long, value_delimiter = ',')]
    pub enable: Option<Vec<Severity>>,

    /// Suppress findings, as `rule`, `rule:file-glob` or `rule:file-glob:line`
    #[arg(long = "suppress")]
    pub suppress: Vec<String>,

    /// Number of analysis threads (defaults to the CPU count)
    #[arg(short, long, env = "CCHECK_JOBS")]
    pub jobs: Option<usize>,

    /// Maximum template nesting depth before a file is abandoned
    #[arg(long, default_value = "12")]
    pub max_template_depth: usize,

    /// Per-file time budget in milliseconds
    #[arg(long)]
    pub time_budget_ms: Option<u64>,

    /// Ignore inline `ccheck-suppress` comments
    #[arg(long)]
    pub no_inline_suppressions: bool,
}

impl Cli {
    pub fn to_settings(&self) -> anyhow::Result<Settings> {
        let mut suppressions = Vec::new();
        for spec in &self.suppress {
            suppressions.push(parse_suppression(spec)?);
        }
        Ok(Settings {
            enabled: self.enable.clone().unwrap_or_else(Severity::all),
            max_template_depth: self.max_template_depth,
            time_budget_ms: self.time_budget_ms,
            inline_suppressions: !self.no_inline_suppressions,
            suppressions,
        })
    }
}

fn parse_suppression(spec: &str) -> anyhow::Result<SuppressionSpec> {
    let mut parts = spec.splitn(3, ':');
    let rule = parts
        .next()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| anyhow::anyhow!("empty suppression spec"))?;
    let file = parts.next().filter(|f| !f.is_empty()).map(str::to_string);
    let line = match parts.next() {
        Some(text) => Some(
            text.parse()
                .map_err(|_| anyhow::anyhow!("bad line number in suppression '{spec}'"))?,
        ),
        None => None,
    };
    Ok(SuppressionSpec {
        rule: rule.to_string(),
        file,
        line,
    })
}
