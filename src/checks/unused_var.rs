//! Unused and write-only variable check

use super::{is_pure_write, AnalysisContext, Check, RuleMeta};
use crate::core::{Diagnostic, Severity};

static RULES: &[RuleMeta] = &[
    RuleMeta {
        id: "unusedVariable",
        severity: Severity::Style,
    },
    RuleMeta {
        id: "unreadVariable",
        severity: Severity::Style,
    },
];

pub struct UnusedVarCheck;

impl Check for UnusedVarCheck {
    fn name(&self) -> &'static str {
        "unused_var"
    }

    fn rules(&self) -> &'static [RuleMeta] {
        RULES
    }

    fn run(&self, ctx: &AnalysisContext) -> Vec<Diagnostic> {
        let tokens = ctx.tokens;
        let mut diagnostics = Vec::new();
        for (var_id, var) in ctx.symbols.variables() {
            if !ctx.symbols.is_local(var_id) || var.is_parameter {
                continue;
            }
            let references: Vec<_> = tokens
                .ids()
                .filter(|&id| tokens.at(id).variable == Some(var_id) && id != var.decl_token)
                .collect();
            if references.is_empty() {
                if var.has_initializer {
                    diagnostics.push(ctx.diagnostic(
                        RULES[1],
                        format!("Variable '{}' is assigned a value that is never used.", var.name),
                        var.decl_token,
                    ));
                } else {
                    diagnostics.push(ctx.diagnostic(
                        RULES[0],
                        format!("Unused variable: {}", var.name),
                        var.decl_token,
                    ));
                }
            } else if references.iter().all(|&id| is_pure_write(tokens, id)) {
                diagnostics.push(ctx.diagnostic(
                    RULES[1],
                    format!("Variable '{}' is assigned a value that is never used.", var.name),
                    var.decl_token,
                ));
            }
        }
        diagnostics
    }
}
