//! Typedef substitution pass
//!
//! Replaces uses of a typedef'd name with its underlying type tokens and
//! drops the typedef declaration. Function-pointer and struct-definition
//! typedefs are left unchanged; downstream stages tolerate the original
//! spelling.

use super::SimplifyPass;
use crate::config::Settings;
use crate::core::Result;
use crate::lexer::{Token, TokenId, TokenKind, TokenList};

pub struct TypedefPass;

struct TypedefDecl {
    name: String,
    /// (text, kind) of the underlying type tokens, in order
    replacement: Vec<(String, TokenKind)>,
    /// Every token of the declaration, `typedef` through `;`
    decl_tokens: Vec<TokenId>,
}

impl SimplifyPass for TypedefPass {
    fn name(&self) -> &'static str {
        "typedefs"
    }

    fn run(&self, tokens: &mut TokenList, _settings: &Settings) -> Result<bool> {
        let mut changed = false;
        // One declaration per round so that a typedef of a typedef picks up
        // the already-substituted underlying type.
        while let Some(decl) = find_typedef(tokens) {
            substitute(tokens, &decl);
            for &id in &decl.decl_tokens {
                tokens.remove(id);
            }
            changed = true;
        }
        Ok(changed)
    }
}

fn find_typedef(tokens: &TokenList) -> Option<TypedefDecl> {
    let mut current: Option<TokenId> = tokens.front();
    while let Some(id) = current {
        current = tokens.next(id);
        if tokens.kind(id) != TokenKind::Keyword || !tokens.matches(id, "typedef") {
            continue;
        }
        if let Some(decl) = parse_typedef(tokens, id) {
            return Some(decl);
        }
    }
    None
}

/// Parse `typedef <type tokens> name ;` starting at the `typedef` keyword.
/// Returns None for shapes this pass does not rewrite (function pointers,
/// inline struct bodies, arrays).
fn parse_typedef(tokens: &TokenList, typedef_id: TokenId) -> Option<TypedefDecl> {
    let mut decl_tokens = vec![typedef_id];
    let mut body = Vec::new();
    let mut current = tokens.next(typedef_id)?;
    loop {
        let kind = tokens.kind(current);
        if kind == TokenKind::Semicolon {
            decl_tokens.push(current);
            break;
        }
        if !matches!(
            kind,
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Operator
        ) {
            return None;
        }
        decl_tokens.push(current);
        body.push(current);
        current = tokens.next(current)?;
    }
    // The trailing identifier is the typedef name; everything before it is
    // the underlying type.
    let name_id = *body.last()?;
    if tokens.kind(name_id) != TokenKind::Identifier {
        return None;
    }
    let replacement: Vec<(String, TokenKind)> = body[..body.len() - 1]
        .iter()
        .map(|&id| (tokens.text(id).to_string(), tokens.kind(id)))
        .collect();
    if replacement.is_empty() {
        return None;
    }
    Some(TypedefDecl {
        name: tokens.text(name_id).to_string(),
        replacement,
        decl_tokens,
    })
}

fn substitute(tokens: &mut TokenList, decl: &TypedefDecl) {
    let uses: Vec<TokenId> = tokens
        .ids()
        .filter(|&id| {
            tokens.kind(id) == TokenKind::Identifier
                && tokens.matches(id, &decl.name)
                && !decl.decl_tokens.contains(&id)
                && !is_member_access(tokens, id)
        })
        .collect();
    for use_id in uses {
        let (first_text, first_kind) = decl.replacement[0].clone();
        let (line, column) = {
            let token = tokens.at(use_id);
            (token.line, token.column)
        };
        {
            let token = tokens.at_mut(use_id);
            token.text = first_text;
            token.kind = first_kind;
        }
        let mut anchor = use_id;
        for (text, kind) in &decl.replacement[1..] {
            anchor = tokens.insert_after(anchor, Token::new(text.clone(), *kind, line, column));
        }
    }
}

/// `s.size_t` or `p->value_type` must not be substituted
fn is_member_access(tokens: &TokenList, id: TokenId) -> bool {
    tokens
        .prev(id)
        .is_some_and(|prev| tokens.matches(prev, ".") || tokens.matches(prev, "->"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(source: &str) -> String {
        let mut result = tokenize(source).unwrap();
        TypedefPass
            .run(&mut result.tokens, &Settings::default())
            .unwrap();
        result.tokens.to_text()
    }

    #[test]
    fn test_simple_typedef_substitution() {
        assert_eq!(
            run("typedef unsigned long size_t; size_t n;"),
            "unsigned long n ;"
        );
    }

    #[test]
    fn test_pointer_typedef() {
        assert_eq!(run("typedef char * str; str s;"), "char * s ;");
    }

    #[test]
    fn test_typedef_of_typedef() {
        assert_eq!(
            run("typedef int myint; typedef myint other; other x;"),
            "int x ;"
        );
    }

    #[test]
    fn test_function_pointer_typedef_untouched() {
        let source = "typedef void (*fn)(int); fn handler;";
        assert_eq!(run(source), "typedef void ( * fn ) ( int ) ; fn handler ;");
    }

    #[test]
    fn test_member_access_not_substituted() {
        assert_eq!(
            run("typedef int width; obj.width = 3;"),
            "obj . width = 3 ;"
        );
    }

    #[test]
    fn test_no_typedef_reports_unchanged() {
        let mut result = tokenize("int x = 1;").unwrap();
        let changed = TypedefPass
            .run(&mut result.tokens, &Settings::default())
            .unwrap();
        assert!(!changed);
    }
}
