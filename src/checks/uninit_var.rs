//! Uninitialized variable check
//!
//! Reports the first read of a local builtin-typed variable declared without
//! an initializer. The first plain assignment, or passing the variable's
//! address out, counts as initialization and ends tracking.

use super::{is_address_taken, is_pure_write, AnalysisContext, Check, RuleMeta};
use crate::core::{Diagnostic, Severity};
use crate::lexer::TokenId;

static RULES: &[RuleMeta] = &[RuleMeta {
    id: "uninitvar",
    severity: Severity::Error,
}];

pub struct UninitVarCheck;

impl Check for UninitVarCheck {
    fn name(&self) -> &'static str {
        "uninit_var"
    }

    fn rules(&self) -> &'static [RuleMeta] {
        RULES
    }

    fn run(&self, ctx: &AnalysisContext) -> Vec<Diagnostic> {
        let tokens = ctx.tokens;
        let order: Vec<TokenId> = tokens.ids().collect();

        let mut diagnostics = Vec::new();
        for (var_id, var) in ctx.symbols.variables() {
            if !ctx.symbols.is_local(var_id) || var.is_parameter || var.has_initializer {
                continue;
            }
            let value_type = &var.value_type;
            // Aggregates, references and statics are outside this heuristic;
            // statics are zero-initialized anyway
            if !value_type.is_builtin()
                || value_type.is_array
                || value_type.is_reference
                || value_type.is_static
            {
                continue;
            }
            let Some(decl_pos) = order.iter().position(|&id| id == var.decl_token) else {
                continue;
            };
            for &id in &order[decl_pos + 1..] {
                if tokens.at(id).variable != Some(var_id) {
                    continue;
                }
                // An out-parameter call like `init(&x)` presumably writes it
                if is_address_taken(tokens, id) || is_pure_write(tokens, id) {
                    break;
                }
                diagnostics.push(ctx.diagnostic(
                    RULES[0],
                    format!("Uninitialized variable: {}", var.name),
                    id,
                ));
                break;
            }
        }
        diagnostics
    }
}
