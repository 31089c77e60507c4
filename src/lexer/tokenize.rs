//! Tokenizer for already-preprocessed C/C++ source text
//!
//! Produces the linked [`TokenList`] consumed by the simplifier, matches
//! every bracket pair, and collects inline suppression directives found in
//! comments. Unmatched brackets are a hard parse failure for the file; the
//! caller converts that into a single `syntaxError` diagnostic and skips the
//! file.

use super::token::{Token, TokenId, TokenKind, TokenList};
use crate::core::{AnalysisError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// C and C++ keywords recognized during classification.
static KEYWORDS: &[&str] = &[
    "alignas", "alignof", "auto", "bool", "break", "case", "catch", "char", "class", "const",
    "constexpr", "const_cast", "continue", "decltype", "default", "delete", "do", "double",
    "dynamic_cast", "else", "enum", "explicit", "extern", "false", "float", "for", "friend",
    "goto", "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "nullptr",
    "operator", "override", "private", "protected", "public", "register", "reinterpret_cast",
    "return", "short", "signed", "sizeof", "static", "static_cast", "struct", "switch",
    "template", "this", "throw", "true", "try", "typedef", "typeid", "typename", "union",
    "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "while",
];

/// Multi-character operators, longest first so maximal munch falls out of a
/// linear scan over the table.
static OPERATORS: &[&str] = &[
    "<<=", ">>=", "...", "->*", "::", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&",
    "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", ".*", "+", "-", "*", "/", "%", "=", "<",
    ">", "!", "&", "|", "^", "~", "?", ":", ".", "#",
];

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ccheck-suppress(-begin|-end|-file)?\s+([\w.*]+)").unwrap()
});

/// How an inline suppression directive applies, before the suppression
/// filter expands it into a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Directive alone on a line: applies to the next code line
    NextLine,
    /// Trailing directive after code: applies to its own line
    SameLine,
    /// Start of a suppression block
    Begin,
    /// End of a suppression block
    End,
    /// Applies to the whole file
    File,
}

/// A raw suppression directive discovered during the comment scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineDirective {
    pub kind: DirectiveKind,
    pub rule_pattern: String,
    pub line: usize,
}

/// The tokenizer output: the token sequence plus any inline suppression
/// directives found in comments.
#[derive(Debug, Clone)]
pub struct TokenizedSource {
    pub tokens: TokenList,
    pub directives: Vec<InlineDirective>,
}

pub fn tokenize(source: &str) -> Result<TokenizedSource> {
    Tokenizer::new(source).run()
}

struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: TokenList,
    directives: Vec<InlineDirective>,
    /// Line number of the last token pushed, used to decide whether a
    /// directive comment trails code on its line
    last_token_line: usize,
    bracket_stack: Vec<TokenId>,
}

impl Tokenizer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: TokenList::new(),
            directives: Vec::new(),
            last_token_line: 0,
            bracket_stack: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn run(mut self) -> Result<TokenizedSource> {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
                continue;
            }
            if ch == '/' && self.peek_at(1) == Some('/') {
                self.line_comment();
                continue;
            }
            if ch == '/' && self.peek_at(1) == Some('*') {
                self.block_comment()?;
                continue;
            }
            self.next_token()?;
        }
        if let Some(&open) = self.bracket_stack.last() {
            let token = self.tokens.at(open);
            return Err(AnalysisError::parse(
                token.line,
                format!("unmatched '{}'", token.text),
            ));
        }
        Ok(TokenizedSource {
            tokens: self.tokens,
            directives: self.directives,
        })
    }

    fn next_token(&mut self) -> Result<()> {
        let line = self.line;
        let column = self.column;
        let ch = self.peek().unwrap();

        match ch {
            '"' => {
                let text = self.string_literal(line)?;
                self.push(text, TokenKind::String, line, column)
            }
            '\'' => {
                let text = self.char_literal(line)?;
                self.push(text, TokenKind::Char, line, column)
            }
            '0'..='9' => {
                let text = self.number_literal();
                self.push(text, TokenKind::Number, line, column)
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let text = self.identifier();
                let kind = if KEYWORDS.contains(&text.as_str()) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                self.push(text, kind, line, column)
            }
            '(' => self.open_bracket("(", TokenKind::OpenParen, line, column),
            '{' => self.open_bracket("{", TokenKind::OpenBrace, line, column),
            '[' => self.open_bracket("[", TokenKind::OpenBracket, line, column),
            ')' => self.close_bracket(")", TokenKind::CloseParen, line, column),
            '}' => self.close_bracket("}", TokenKind::CloseBrace, line, column),
            ']' => self.close_bracket("]", TokenKind::CloseBracket, line, column),
            ';' => {
                self.advance();
                self.push(";".into(), TokenKind::Semicolon, line, column)
            }
            ',' => {
                self.advance();
                self.push(",".into(), TokenKind::Comma, line, column)
            }
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                let text = self.number_literal();
                self.push(text, TokenKind::Number, line, column)
            }
            _ => {
                for op in OPERATORS {
                    if self.lookahead_is(op) {
                        for _ in 0..op.len() {
                            self.advance();
                        }
                        return self.push((*op).into(), TokenKind::Operator, line, column);
                    }
                }
                Err(AnalysisError::parse(
                    line,
                    format!("unexpected character '{ch}'"),
                ))
            }
        }
    }

    fn lookahead_is(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn push(&mut self, text: String, kind: TokenKind, line: usize, column: usize) -> Result<()> {
        self.tokens.push(Token::new(text, kind, line, column));
        self.last_token_line = line;
        Ok(())
    }

    fn open_bracket(
        &mut self,
        text: &str,
        kind: TokenKind,
        line: usize,
        column: usize,
    ) -> Result<()> {
        self.advance();
        let id = self.tokens.push(Token::new(text, kind, line, column));
        self.last_token_line = line;
        self.bracket_stack.push(id);
        Ok(())
    }

    fn close_bracket(
        &mut self,
        text: &str,
        kind: TokenKind,
        line: usize,
        column: usize,
    ) -> Result<()> {
        self.advance();
        let open = self
            .bracket_stack
            .pop()
            .ok_or_else(|| AnalysisError::parse(line, format!("unmatched '{text}'")))?;
        let expected = self.tokens.kind(open).closing_kind();
        if expected != Some(kind) {
            let open_text = self.tokens.text(open).to_string();
            return Err(AnalysisError::parse(
                line,
                format!("'{open_text}' is closed by '{text}'"),
            ));
        }
        let id = self.tokens.push(Token::new(text, kind, line, column));
        self.last_token_line = line;
        self.tokens.at_mut(open).link = Some(id);
        self.tokens.at_mut(id).link = Some(open);
        Ok(())
    }

    fn line_comment(&mut self) {
        let line = self.line;
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        self.scan_directive(&text, line);
    }

    fn block_comment(&mut self) -> Result<()> {
        let line = self.line;
        let mut text = String::new();
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
                None => {
                    return Err(AnalysisError::parse(line, "unterminated comment"));
                }
            }
        }
        self.scan_directive(&text, line);
        Ok(())
    }

    fn scan_directive(&mut self, comment: &str, line: usize) {
        let Some(captures) = DIRECTIVE_RE.captures(comment) else {
            return;
        };
        let kind = match captures.get(1).map(|m| m.as_str()) {
            Some("-begin") => DirectiveKind::Begin,
            Some("-end") => DirectiveKind::End,
            Some("-file") => DirectiveKind::File,
            _ if self.last_token_line == line => DirectiveKind::SameLine,
            _ => DirectiveKind::NextLine,
        };
        self.directives.push(InlineDirective {
            kind,
            rule_pattern: captures[2].to_string(),
            line,
        });
    }

    fn string_literal(&mut self, line: usize) -> Result<String> {
        let mut text = String::from("\"");
        self.advance();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    text.push('"');
                    return Ok(text);
                }
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                Some(ch) if ch != '\n' => {
                    text.push(ch);
                    self.advance();
                }
                _ => return Err(AnalysisError::parse(line, "unterminated string literal")),
            }
        }
    }

    fn char_literal(&mut self, line: usize) -> Result<String> {
        let mut text = String::from("'");
        self.advance();
        loop {
            match self.peek() {
                Some('\'') => {
                    self.advance();
                    text.push('\'');
                    return Ok(text);
                }
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                Some(ch) if ch != '\n' => {
                    text.push(ch);
                    self.advance();
                }
                _ => return Err(AnalysisError::parse(line, "unterminated character literal")),
            }
        }
    }

    fn number_literal(&mut self) -> String {
        let mut text = String::new();
        // Hex and binary prefixes take their own digit alphabet
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X' | 'b' | 'B')) {
            text.push(self.advance().unwrap());
            text.push(self.advance().unwrap());
            while let Some(ch) = self.peek() {
                if ch.is_ascii_alphanumeric() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            return text;
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '.' {
                text.push(ch);
                self.advance();
            } else if (ch == '+' || ch == '-') && text.ends_with(['e', 'E']) {
                // Exponent sign, e.g. 1.5e-3
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_basic_tokens() {
        let result = tokenize("int x = 42;").unwrap();
        let kinds: Vec<TokenKind> = result
            .tokens
            .ids()
            .map(|id| result.tokens.kind(id))
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_maximal_munch_operators() {
        let result = tokenize("a <<= b >> c->d;").unwrap();
        assert_eq!(result.tokens.to_text(), "a <<= b >> c -> d ;");
    }

    #[test]
    fn test_bracket_links_are_pairwise() {
        let result = tokenize("void f() { int a[3]; }").unwrap();
        let tokens = &result.tokens;
        for id in tokens.ids() {
            let kind = tokens.kind(id);
            if kind.is_open_bracket() || kind.is_close_bracket() {
                let link = tokens.at(id).link.expect("bracket must be linked");
                assert_eq!(tokens.at(link).link, Some(id));
            }
        }
    }

    #[test]
    fn test_unmatched_open_brace_is_parse_failure() {
        let err = tokenize("void f() {").unwrap_err();
        match err {
            AnalysisError::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("unmatched"));
            }
            other => panic!("expected parse failure, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_bracket_kind_is_parse_failure() {
        assert!(tokenize("int a[2);").is_err());
    }

    #[test]
    fn test_line_and_column_tracking() {
        let result = tokenize("int x;\n  float y;").unwrap();
        let ids: Vec<_> = result.tokens.ids().collect();
        let float_tok = result.tokens.at(ids[3]);
        assert_eq!(float_tok.text, "float");
        assert_eq!(float_tok.line, 2);
        assert_eq!(float_tok.column, 3);
    }

    #[test]
    fn test_string_and_char_literals() {
        let result = tokenize(r#"const char *s = "a\"b"; char c = '\n';"#).unwrap();
        let texts: Vec<&str> = result.tokens.ids().map(|id| result.tokens.text(id)).collect();
        assert!(texts.contains(&"\"a\\\"b\""));
        assert!(texts.contains(&"'\\n'"));
    }

    #[test]
    fn test_next_line_directive() {
        let result = tokenize("// ccheck-suppress nullPointer\n*p = 1;").unwrap();
        assert_eq!(
            result.directives,
            vec![InlineDirective {
                kind: DirectiveKind::NextLine,
                rule_pattern: "nullPointer".into(),
                line: 1,
            }]
        );
    }

    #[test]
    fn test_same_line_directive() {
        let result = tokenize("*p = 1; // ccheck-suppress nullPointer").unwrap();
        assert_eq!(result.directives[0].kind, DirectiveKind::SameLine);
    }

    #[test]
    fn test_block_directives() {
        let source = "\
// ccheck-suppress-begin zerodiv
int a = 1 / 0;
// ccheck-suppress-end zerodiv
";
        let result = tokenize(source).unwrap();
        let kinds: Vec<DirectiveKind> = result.directives.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DirectiveKind::Begin, DirectiveKind::End]);
    }

    #[test]
    fn test_file_directive_in_block_comment() {
        let result = tokenize("/* ccheck-suppress-file unusedVariable */\nint x;").unwrap();
        assert_eq!(result.directives[0].kind, DirectiveKind::File);
        assert_eq!(result.directives[0].rule_pattern, "unusedVariable");
    }

    #[test]
    fn test_unterminated_comment_is_parse_failure() {
        assert!(tokenize("int x; /* never closed").is_err());
    }

    #[test]
    fn test_hex_and_exponent_literals() {
        let result = tokenize("a = 0x1F; b = 1.5e-3;").unwrap();
        let texts: Vec<&str> = result.tokens.ids().map(|id| result.tokens.text(id)).collect();
        assert!(texts.contains(&"0x1F"));
        assert!(texts.contains(&"1.5e-3"));
    }
}
