//! Token arena and linked token sequence
//!
//! Tokens live in an arena owned by [`TokenList`] and reference each other by
//! [`TokenId`] rather than pointers, so bracket links and AST operand links
//! can never dangle or form ownership cycles.

use crate::symbols::{FunctionId, ScopeId, VariableId};

/// Index of a token inside its owning [`TokenList`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(pub usize);

/// Syntactic classification assigned during tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    String,
    Char,
    Operator,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
}

impl TokenKind {
    pub fn is_open_bracket(self) -> bool {
        matches!(
            self,
            TokenKind::OpenParen | TokenKind::OpenBrace | TokenKind::OpenBracket
        )
    }

    pub fn is_close_bracket(self) -> bool {
        matches!(
            self,
            TokenKind::CloseParen | TokenKind::CloseBrace | TokenKind::CloseBracket
        )
    }

    /// The closing kind that matches this opening kind
    pub fn closing_kind(self) -> Option<TokenKind> {
        match self {
            TokenKind::OpenParen => Some(TokenKind::CloseParen),
            TokenKind::OpenBrace => Some(TokenKind::CloseBrace),
            TokenKind::OpenBracket => Some(TokenKind::CloseBracket),
            _ => None,
        }
    }
}

/// A node in the doubly linked token sequence.
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    pub prev: Option<TokenId>,
    pub next: Option<TokenId>,
    /// Matched partner for bracket/paren/brace tokens
    pub link: Option<TokenId>,
    /// Resolved symbol back-references, filled by the symbol database
    pub scope: Option<ScopeId>,
    pub variable: Option<VariableId>,
    pub function: Option<FunctionId>,
    /// Expression AST operand links, filled by the symbol database
    pub ast_op1: Option<TokenId>,
    pub ast_op2: Option<TokenId>,
    pub ast_parent: Option<TokenId>,
    /// Locally derivable constant value, filled during simplification
    pub known_value: Option<i64>,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, line: usize, column: usize) -> Self {
        Self {
            text: text.into(),
            kind,
            line,
            column,
            prev: None,
            next: None,
            link: None,
            scope: None,
            variable: None,
            function: None,
            ast_op1: None,
            ast_op2: None,
            ast_parent: None,
            known_value: None,
        }
    }
}

/// The linked token sequence for one translation unit.
#[derive(Debug, Clone, Default)]
pub struct TokenList {
    arena: Vec<Token>,
    front: Option<TokenId>,
    back: Option<TokenId>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.front.is_none()
    }

    pub fn front(&self) -> Option<TokenId> {
        self.front
    }

    pub fn back(&self) -> Option<TokenId> {
        self.back
    }

    pub fn at(&self, id: TokenId) -> &Token {
        &self.arena[id.0]
    }

    pub fn at_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.arena[id.0]
    }

    pub fn text(&self, id: TokenId) -> &str {
        &self.arena[id.0].text
    }

    pub fn kind(&self, id: TokenId) -> TokenKind {
        self.arena[id.0].kind
    }

    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        self.arena[id.0].next
    }

    pub fn prev(&self, id: TokenId) -> Option<TokenId> {
        self.arena[id.0].prev
    }

    /// True if the token at `id` has exactly the given text
    pub fn matches(&self, id: TokenId, text: &str) -> bool {
        self.arena[id.0].text == text
    }

    /// Append a token at the back of the sequence
    pub fn push(&mut self, mut token: Token) -> TokenId {
        let id = TokenId(self.arena.len());
        token.prev = self.back;
        token.next = None;
        self.arena.push(token);
        match self.back {
            Some(back) => self.arena[back.0].next = Some(id),
            None => self.front = Some(id),
        }
        self.back = Some(id);
        id
    }

    /// Insert a new token directly after `anchor`
    pub fn insert_after(&mut self, anchor: TokenId, mut token: Token) -> TokenId {
        let id = TokenId(self.arena.len());
        let old_next = self.arena[anchor.0].next;
        token.prev = Some(anchor);
        token.next = old_next;
        self.arena.push(token);
        self.arena[anchor.0].next = Some(id);
        match old_next {
            Some(next) => self.arena[next.0].prev = Some(id),
            None => self.back = Some(id),
        }
        id
    }

    /// Insert a new token directly before `anchor`
    pub fn insert_before(&mut self, anchor: TokenId, token: Token) -> TokenId {
        match self.arena[anchor.0].prev {
            Some(prev) => self.insert_after(prev, token),
            None => {
                let id = TokenId(self.arena.len());
                let mut token = token;
                token.prev = None;
                token.next = Some(anchor);
                self.arena.push(token);
                self.arena[anchor.0].prev = Some(id);
                self.front = Some(id);
                id
            }
        }
    }

    /// Unlink a token from the sequence. The arena slot stays allocated; the
    /// token simply becomes unreachable from iteration.
    pub fn remove(&mut self, id: TokenId) {
        let (prev, next) = (self.arena[id.0].prev, self.arena[id.0].next);
        match prev {
            Some(p) => self.arena[p.0].next = next,
            None => self.front = next,
        }
        match next {
            Some(n) => self.arena[n.0].prev = prev,
            None => self.back = prev,
        }
        self.arena[id.0].prev = None;
        self.arena[id.0].next = None;
    }

    /// Iterate token ids from front to back
    pub fn ids(&self) -> TokenIdIter<'_> {
        TokenIdIter {
            list: self,
            current: self.front,
        }
    }

    /// The token texts joined with single spaces, mainly for tests and traces
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for id in self.ids() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(self.text(id));
        }
        out
    }
}

pub struct TokenIdIter<'a> {
    list: &'a TokenList,
    current: Option<TokenId>,
}

impl Iterator for TokenIdIter<'_> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        let id = self.current?;
        self.current = self.list.at(id).next;
        Some(id)
    }
}
