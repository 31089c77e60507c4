//! Numeric literal normalization pass
//!
//! Strips integer/float suffixes, folds plain integer literals into the
//! token's `known_value`, and canonicalizes `NULL`/`nullptr` to `0` so null
//! checks only ever see one spelling.

use super::SimplifyPass;
use crate::config::Settings;
use crate::core::Result;
use crate::lexer::{TokenId, TokenKind, TokenList};

pub struct LiteralPass;

impl SimplifyPass for LiteralPass {
    fn name(&self) -> &'static str {
        "literals"
    }

    fn run(&self, tokens: &mut TokenList, _settings: &Settings) -> Result<bool> {
        let mut changed = false;
        let ids: Vec<TokenId> = tokens.ids().collect();
        for id in ids {
            match tokens.kind(id) {
                TokenKind::Number => changed |= normalize_number(tokens, id),
                TokenKind::Identifier if tokens.matches(id, "NULL") => {
                    rewrite_to_zero(tokens, id);
                    changed = true;
                }
                TokenKind::Keyword if tokens.matches(id, "nullptr") => {
                    rewrite_to_zero(tokens, id);
                    changed = true;
                }
                _ => {}
            }
        }
        Ok(changed)
    }
}

fn rewrite_to_zero(tokens: &mut TokenList, id: TokenId) {
    let token = tokens.at_mut(id);
    token.text = "0".into();
    token.kind = TokenKind::Number;
    token.known_value = Some(0);
}

fn normalize_number(tokens: &mut TokenList, id: TokenId) -> bool {
    let stripped = strip_suffix(tokens.text(id));
    let value = parse_integer(&stripped);
    let token = tokens.at_mut(id);
    let mut changed = false;
    if token.text != stripped {
        token.text = stripped;
        changed = true;
    }
    if token.known_value != value {
        token.known_value = value;
        changed = true;
    }
    changed
}

/// Remove integer (`u`, `l`, `ll`) and float (`f`) suffixes. Hex digits
/// share letters with suffixes, so hex literals only shed trailing `u`/`l`.
fn strip_suffix(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let is_hex = lower.starts_with("0x");
    let suffix_len = text
        .chars()
        .rev()
        .take_while(|c| {
            if is_hex {
                matches!(c, 'u' | 'U' | 'l' | 'L')
            } else {
                matches!(c, 'u' | 'U' | 'l' | 'L' | 'f' | 'F')
            }
        })
        .count();
    let kept = &text[..text.len() - suffix_len];
    // `0xF` must keep its final digit even though `f` looks like a suffix
    if kept.is_empty() || (is_hex && kept.len() <= 2) {
        text.to_string()
    } else {
        kept.to_string()
    }
}

/// Parse a suffix-free integer literal; float-looking literals yield None.
fn parse_integer(text: &str) -> Option<i64> {
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return i64::from_str_radix(bin, 2).ok();
    }
    if lower.contains('.') || lower.contains('e') {
        return None;
    }
    if lower.len() > 1 && lower.starts_with('0') {
        return i64::from_str_radix(&lower[1..], 8).ok();
    }
    lower.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(source: &str) -> TokenList {
        let mut result = tokenize(source).unwrap();
        LiteralPass
            .run(&mut result.tokens, &Settings::default())
            .unwrap();
        result.tokens
    }

    #[test]
    fn test_strips_integer_suffixes() {
        let tokens = run("a = 10UL; b = 42u; c = 7LL;");
        assert_eq!(tokens.to_text(), "a = 10 ; b = 42 ; c = 7 ;");
    }

    #[test]
    fn test_strips_float_suffix() {
        let tokens = run("float f = 2.5f;");
        assert_eq!(tokens.to_text(), "float f = 2.5 ;");
    }

    #[test]
    fn test_hex_final_digit_survives() {
        let tokens = run("a = 0xF; b = 0x1FUL;");
        assert_eq!(tokens.to_text(), "a = 0xF ; b = 0x1F ;");
    }

    #[test]
    fn test_null_becomes_zero() {
        let tokens = run("int *p = NULL; char *q = nullptr;");
        assert_eq!(tokens.to_text(), "int * p = 0 ; char * q = 0 ;");
    }

    #[test]
    fn test_known_values_folded() {
        let tokens = run("a = 0x10; b = 010; c = 12; d = 1.5;");
        let values: Vec<Option<i64>> = tokens
            .ids()
            .filter(|&id| tokens.kind(id) == TokenKind::Number)
            .map(|id| tokens.at(id).known_value)
            .collect();
        assert_eq!(values, vec![Some(16), Some(8), Some(12), None]);
    }
}
