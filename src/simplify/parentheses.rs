//! Redundant parenthesis removal pass
//!
//! Drops doubled parentheses and parentheses around a lone literal or
//! identifier in expression position. Call argument lists and control-flow
//! condition parentheses are structural and never touched.

use super::SimplifyPass;
use crate::config::Settings;
use crate::core::Result;
use crate::lexer::{TokenId, TokenKind, TokenList};

pub struct ParenthesesPass;

impl SimplifyPass for ParenthesesPass {
    fn name(&self) -> &'static str {
        "parentheses"
    }

    fn run(&self, tokens: &mut TokenList, _settings: &Settings) -> Result<bool> {
        let mut changed = false;
        loop {
            let Some((open, close)) = find_redundant_pair(tokens) else {
                break;
            };
            tokens.remove(open);
            tokens.remove(close);
            changed = true;
        }
        Ok(changed)
    }
}

fn find_redundant_pair(tokens: &TokenList) -> Option<(TokenId, TokenId)> {
    for id in tokens.ids() {
        if tokens.kind(id) != TokenKind::OpenParen {
            continue;
        }
        let close = tokens.at(id).link?;
        if is_doubled(tokens, id, close) || wraps_single_atom(tokens, id, close) {
            return Some((id, close));
        }
    }
    None
}

/// `( ( ... ) )`: the outer pair directly wraps the inner pair
fn is_doubled(tokens: &TokenList, open: TokenId, close: TokenId) -> bool {
    let Some(inner_open) = tokens.next(open) else {
        return false;
    };
    if tokens.kind(inner_open) != TokenKind::OpenParen {
        return false;
    }
    let Some(inner_close) = tokens.at(inner_open).link else {
        return false;
    };
    tokens.next(inner_close) == Some(close)
}

/// `( atom )` in expression position, e.g. after an operator, a comma or
/// `return`. Parens after an identifier are a call argument list and parens
/// after a control keyword are a condition; both stay.
fn wraps_single_atom(tokens: &TokenList, open: TokenId, close: TokenId) -> bool {
    let Some(inner) = tokens.next(open) else {
        return false;
    };
    if tokens.next(inner) != Some(close) {
        return false;
    }
    if !matches!(
        tokens.kind(inner),
        TokenKind::Identifier | TokenKind::Number | TokenKind::String | TokenKind::Char
    ) {
        return false;
    }
    match tokens.prev(open) {
        Some(prev) => match tokens.kind(prev) {
            TokenKind::Operator | TokenKind::Comma => true,
            TokenKind::Keyword => tokens.matches(prev, "return"),
            _ => false,
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(source: &str) -> String {
        let mut result = tokenize(source).unwrap();
        ParenthesesPass
            .run(&mut result.tokens, &Settings::default())
            .unwrap();
        result.tokens.to_text()
    }

    #[test]
    fn test_doubled_parens_removed() {
        assert_eq!(run("x = ((a + b));"), "x = ( a + b ) ;");
    }

    #[test]
    fn test_atom_parens_removed_after_operator() {
        assert_eq!(run("x = (0);"), "x = 0 ;");
        assert_eq!(run("x = a + (b);"), "x = a + b ;");
    }

    #[test]
    fn test_return_parens_removed() {
        assert_eq!(run("return (x);"), "return x ;");
    }

    #[test]
    fn test_call_arguments_kept() {
        assert_eq!(run("f(x);"), "f ( x ) ;");
        assert_eq!(run("g(a, (b));"), "g ( a , b ) ;");
    }

    #[test]
    fn test_condition_parens_kept() {
        assert_eq!(run("if (x) { }"), "if ( x ) { }");
        assert_eq!(run("while (1) { }"), "while ( 1 ) { }");
    }

    #[test]
    fn test_nested_removal_reaches_fixed_point() {
        assert_eq!(run("x = (((a)));"), "x = a ;");
    }
}
