//! Null pointer dereference check
//!
//! Reports a local pointer that is initialized to null and then dereferenced
//! before anything could change it. The scan is deliberately conservative:
//! a reassignment, an address-of, or any appearance of the pointer inside a
//! branch condition ends tracking for that variable.

use super::{is_address_taken, is_dereferenced, AnalysisContext, Check, RuleMeta};
use crate::core::{Diagnostic, Severity};
use crate::lexer::{TokenId, TokenKind, TokenList};
use std::collections::HashMap;

static RULES: &[RuleMeta] = &[RuleMeta {
    id: "nullPointer",
    severity: Severity::Error,
}];

pub struct NullPointerCheck;

impl Check for NullPointerCheck {
    fn name(&self) -> &'static str {
        "null_pointer"
    }

    fn rules(&self) -> &'static [RuleMeta] {
        RULES
    }

    fn run(&self, ctx: &AnalysisContext) -> Vec<Diagnostic> {
        let tokens = ctx.tokens;
        let order: Vec<TokenId> = tokens.ids().collect();
        let position: HashMap<TokenId, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let guards = condition_ranges(tokens, &order, &position);

        let mut diagnostics = Vec::new();
        for (var_id, var) in ctx.symbols.variables() {
            if !ctx.symbols.is_local(var_id) || !var.value_type.is_pointer() {
                continue;
            }
            if !null_initialized(tokens, var.decl_token) {
                continue;
            }
            let Some(&decl_pos) = position.get(&var.decl_token) else {
                continue;
            };
            for (offset, &id) in order[decl_pos + 1..].iter().enumerate() {
                if tokens.at(id).variable != Some(var_id) {
                    continue;
                }
                let pos = decl_pos + 1 + offset;
                // A pointer tested in a condition is no longer known null
                // anywhere after it
                if guards.iter().any(|&(start, end)| pos > start && pos < end) {
                    break;
                }
                if is_address_taken(tokens, id) {
                    break;
                }
                if is_dereferenced(tokens, id) {
                    diagnostics.push(ctx.diagnostic(
                        RULES[0],
                        format!("Null pointer dereference: {}", var.name),
                        id,
                    ));
                    break;
                }
                if reassigns(tokens, id) {
                    break;
                }
            }
        }
        diagnostics
    }
}

/// True when the declarator is followed by `= 0` and nothing else
fn null_initialized(tokens: &TokenList, decl: TokenId) -> bool {
    let Some(eq) = tokens.next(decl) else {
        return false;
    };
    if !tokens.matches(eq, "=") {
        return false;
    }
    let Some(value) = tokens.next(eq) else {
        return false;
    };
    if tokens.at(value).known_value != Some(0) {
        return false;
    }
    tokens.next(value).is_some_and(|after| {
        matches!(tokens.kind(after), TokenKind::Semicolon | TokenKind::Comma)
    })
}

fn reassigns(tokens: &TokenList, id: TokenId) -> bool {
    tokens.next(id).is_some_and(|next| {
        matches!(
            tokens.text(next),
            "=" | "+=" | "-=" | "++" | "--"
        )
    })
}

/// Spans (in sequence positions) of `if`/`while`/`for` condition parentheses
fn condition_ranges(
    tokens: &TokenList,
    order: &[TokenId],
    position: &HashMap<TokenId, usize>,
) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    for &id in order {
        if tokens.kind(id) != TokenKind::Keyword
            || !matches!(tokens.text(id), "if" | "while" | "for")
        {
            continue;
        }
        let Some(open) = tokens.next(id) else { continue };
        if tokens.kind(open) != TokenKind::OpenParen {
            continue;
        }
        if let (Some(&start), Some(close)) = (position.get(&open), tokens.at(open).link) {
            if let Some(&end) = position.get(&close) {
                ranges.push((start, end));
            }
        }
    }
    ranges
}
