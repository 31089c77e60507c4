//! Division by zero check
//!
//! Flags `/` and `%` (and their compound-assignment forms) whose right-hand
//! side is the literal zero or a variable whose folded value is still zero.

use super::{AnalysisContext, Check, RuleMeta};
use crate::core::{Diagnostic, Severity};
use crate::lexer::{TokenId, TokenKind};

static RULES: &[RuleMeta] = &[RuleMeta {
    id: "zerodiv",
    severity: Severity::Error,
}];

pub struct ZeroDivCheck;

impl Check for ZeroDivCheck {
    fn name(&self) -> &'static str {
        "zero_div"
    }

    fn rules(&self) -> &'static [RuleMeta] {
        RULES
    }

    fn run(&self, ctx: &AnalysisContext) -> Vec<Diagnostic> {
        let tokens = ctx.tokens;
        let mut diagnostics = Vec::new();
        for id in tokens.ids() {
            if tokens.kind(id) != TokenKind::Operator
                || !matches!(tokens.text(id), "/" | "%" | "/=" | "%=")
            {
                continue;
            }
            // Prefer the AST operand; in contexts the expression parser does
            // not cover (e.g. call arguments) fall back to the next token
            let rhs = tokens.at(id).ast_op2.or_else(|| tokens.next(id));
            if rhs.is_some_and(|rhs| self.is_zero(ctx, rhs)) {
                diagnostics.push(ctx.diagnostic(RULES[0], "Division by zero.", id));
            }
        }
        diagnostics
    }
}

impl ZeroDivCheck {
    fn is_zero(&self, ctx: &AnalysisContext, id: TokenId) -> bool {
        let token = ctx.tokens.at(id);
        if token.known_value == Some(0) {
            return true;
        }
        token
            .variable
            .is_some_and(|var| ctx.symbols.variable(var).known_value == Some(0))
    }
}
