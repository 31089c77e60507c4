//! Expression AST links
//!
//! A precedence-climbing pass over each expression statement fills the
//! `ast_op1`/`ast_op2`/`ast_parent` links on operator tokens, giving
//! checkers a tree view of expressions without a separate node arena. The
//! builder is best-effort: a statement it cannot parse keeps whatever links
//! were already placed and is otherwise left alone. Links always form a
//! tree, never a cycle, because every node receives at most one parent.

use crate::lexer::{TokenId, TokenKind, TokenList};

/// Binary operator precedence; higher binds tighter. Assignment is handled
/// separately because it associates right.
fn binary_precedence(text: &str) -> Option<u8> {
    match text {
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" => Some(2),
        "||" => Some(4),
        "&&" => Some(5),
        "|" => Some(6),
        "^" => Some(7),
        "&" => Some(8),
        "==" | "!=" => Some(9),
        "<" | ">" | "<=" | ">=" => Some(10),
        "<<" | ">>" => Some(11),
        "+" | "-" => Some(12),
        "*" | "/" | "%" => Some(13),
        "." | "->" => Some(14),
        _ => None,
    }
}

fn is_right_associative(text: &str) -> bool {
    text.ends_with('=') && !matches!(text, "==" | "!=" | "<=" | ">=")
}

/// Build AST links for every expression statement in the token list.
pub fn build_expression_asts(tokens: &mut TokenList) {
    let ids: Vec<TokenId> = tokens.ids().collect();
    let mut statement: Vec<TokenId> = Vec::new();
    for &id in &ids {
        match tokens.kind(id) {
            TokenKind::Semicolon | TokenKind::OpenBrace | TokenKind::CloseBrace => {
                build_statement(tokens, &statement);
                statement.clear();
            }
            _ => statement.push(id),
        }
    }
    build_statement(tokens, &statement);
}

fn build_statement(tokens: &mut TokenList, statement: &[TokenId]) {
    let mut range = statement;
    // `return expr` carries an expression; other keyword statements are
    // declarations or control flow the expression parser does not model
    if let Some((&first, rest)) = range.split_first() {
        if tokens.kind(first) == TokenKind::Keyword {
            if tokens.matches(first, "return") {
                range = rest;
            } else {
                return;
            }
        }
    }
    if range.len() < 2 {
        return;
    }
    // The conditional operator is not modeled
    if range.iter().any(|&id| tokens.matches(id, "?")) {
        return;
    }
    let mut parser = ExprParser {
        tokens,
        ids: range,
        pos: 0,
    };
    parser.parse_expression(0);
}

struct ExprParser<'t, 'i> {
    tokens: &'t mut TokenList,
    ids: &'i [TokenId],
    pos: usize,
}

impl ExprParser<'_, '_> {
    fn peek(&self) -> Option<TokenId> {
        self.ids.get(self.pos).copied()
    }

    fn parse_expression(&mut self, min_prec: u8) -> Option<TokenId> {
        let mut lhs = self.parse_unary()?;
        while let Some(op_id) = self.peek() {
            let text = self.tokens.text(op_id).to_string();
            let Some(prec) = binary_precedence(&text) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let next_min = if is_right_associative(&text) {
                prec
            } else {
                prec + 1
            };
            let rhs = self.parse_expression(next_min)?;
            self.tokens.at_mut(op_id).ast_op1 = Some(lhs);
            self.tokens.at_mut(op_id).ast_op2 = Some(rhs);
            self.tokens.at_mut(lhs).ast_parent = Some(op_id);
            self.tokens.at_mut(rhs).ast_parent = Some(op_id);
            lhs = op_id;
        }
        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<TokenId> {
        let id = self.peek()?;
        let text = self.tokens.text(id);
        if self.tokens.kind(id) == TokenKind::Operator
            && matches!(text, "*" | "&" | "!" | "~" | "-" | "+" | "++" | "--")
        {
            self.pos += 1;
            let operand = self.parse_unary()?;
            self.tokens.at_mut(id).ast_op1 = Some(operand);
            self.tokens.at_mut(operand).ast_parent = Some(id);
            return Some(id);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<TokenId> {
        let id = self.peek()?;
        match self.tokens.kind(id) {
            TokenKind::Number | TokenKind::String | TokenKind::Char => {
                self.pos += 1;
                Some(self.postfix(id))
            }
            TokenKind::Identifier | TokenKind::Keyword => {
                self.pos += 1;
                // Calls and index expressions keep the name as the node;
                // their bracketed internals are opaque to this pass
                while let Some(next) = self.peek() {
                    if matches!(
                        self.tokens.kind(next),
                        TokenKind::OpenParen | TokenKind::OpenBracket
                    ) {
                        self.skip_group(next)?;
                    } else {
                        break;
                    }
                }
                Some(self.postfix(id))
            }
            TokenKind::OpenParen => {
                let close = self.tokens.at(id).link?;
                self.pos += 1;
                let inner = self.parse_expression(0)?;
                // Step past the matching close paren
                while let Some(next) = self.peek() {
                    self.pos += 1;
                    if next == close {
                        break;
                    }
                }
                Some(self.postfix(inner))
            }
            _ => None,
        }
    }

    /// Attach a postfix increment/decrement if present
    fn postfix(&mut self, node: TokenId) -> TokenId {
        if let Some(next) = self.peek() {
            if self.tokens.matches(next, "++") || self.tokens.matches(next, "--") {
                self.pos += 1;
                self.tokens.at_mut(next).ast_op1 = Some(node);
                self.tokens.at_mut(node).ast_parent = Some(next);
                return next;
            }
        }
        node
    }

    /// Advance past a bracketed group, returning None at a malformed link
    fn skip_group(&mut self, open: TokenId) -> Option<()> {
        let close = self.tokens.at(open).link?;
        while let Some(id) = self.peek() {
            self.pos += 1;
            if id == close {
                return Some(());
            }
        }
        None
    }
}
