//! Variable shadowing check
//!
//! Reports a local declaration that hides another local (or parameter) from
//! an enclosing executable scope. Hiding a global or a class member is not
//! reported; that is an ordinary and usually intentional pattern.

use super::{AnalysisContext, Check, RuleMeta};
use crate::core::{Diagnostic, Severity};

static RULES: &[RuleMeta] = &[RuleMeta {
    id: "shadowVariable",
    severity: Severity::Style,
}];

pub struct ShadowCheck;

impl Check for ShadowCheck {
    fn name(&self) -> &'static str {
        "shadow"
    }

    fn rules(&self) -> &'static [RuleMeta] {
        RULES
    }

    fn run(&self, ctx: &AnalysisContext) -> Vec<Diagnostic> {
        let symbols = ctx.symbols;
        let mut diagnostics = Vec::new();
        for (var_id, var) in symbols.variables() {
            if !symbols.scope(var.scope).kind.is_executable() {
                continue;
            }
            let Some(parent) = symbols.scope(var.scope).parent else {
                continue;
            };
            let Some(outer_id) = symbols.resolve_variable(parent, &var.name) else {
                continue;
            };
            let outer = symbols.variable(outer_id);
            if outer_id == var_id || !symbols.scope(outer.scope).kind.is_executable() {
                continue;
            }
            let what = if outer.is_parameter {
                "argument"
            } else {
                "variable"
            };
            diagnostics.push(
                ctx.diagnostic(
                    RULES[0],
                    format!("Local variable '{}' shadows outer {}", var.name, what),
                    var.decl_token,
                )
                .with_related(ctx.location(outer.decl_token)),
            );
        }
        diagnostics
    }
}
