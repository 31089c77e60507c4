//! Template instantiation canonicalization pass
//!
//! Collapses `name < args >` into a single identifier token with a canonical
//! spelling (`vector<int>`), splitting `>>` closers on the way, so later
//! stages never reason about template arity. Argument lists are detected
//! heuristically; anything that does not look like a type list is left
//! unchanged. Nesting deeper than the configured maximum aborts the file
//! with `ResourceExhausted`.

use super::SimplifyPass;
use crate::config::Settings;
use crate::core::{AnalysisError, Result};
use crate::lexer::{Token, TokenId, TokenKind, TokenList};

pub struct TemplatePass;

impl SimplifyPass for TemplatePass {
    fn name(&self) -> &'static str {
        "templates"
    }

    fn run(&self, tokens: &mut TokenList, settings: &Settings) -> Result<bool> {
        let mut changed = false;
        // Innermost instantiations collapse first; the scan repeats until no
        // instantiation is left.
        loop {
            match find_instantiation(tokens, settings.max_template_depth)? {
                Some(inst) => {
                    collapse(tokens, inst);
                    changed = true;
                }
                None => break,
            }
        }
        Ok(changed)
    }
}

struct Instantiation {
    name: TokenId,
    open: TokenId,
    close: TokenId,
}

fn find_instantiation(
    tokens: &mut TokenList,
    max_depth: usize,
) -> Result<Option<Instantiation>> {
    let ids: Vec<TokenId> = tokens.ids().collect();
    for &id in &ids {
        if tokens.kind(id) != TokenKind::Identifier {
            continue;
        }
        let Some(open) = tokens.next(id) else {
            continue;
        };
        if !tokens.matches(open, "<") {
            continue;
        }
        // `template` declarations keep their angle brackets
        if preceded_by_keyword(tokens, id, "template") {
            continue;
        }
        if let Some(close) = scan_argument_list(tokens, open, max_depth)? {
            return Ok(Some(Instantiation {
                name: id,
                open,
                close,
            }));
        }
    }
    Ok(None)
}

fn preceded_by_keyword(tokens: &TokenList, id: TokenId, keyword: &str) -> bool {
    tokens.prev(id).is_some_and(|prev| {
        tokens.kind(prev) == TokenKind::Keyword && tokens.matches(prev, keyword)
    })
}

/// Walk from the `<` looking for its matching `>`, tolerating only tokens
/// that can appear in a template argument list. Splits `>>` into two `>`
/// tokens when it closes nested lists. Returns the matching `>` or None when
/// the construct is a comparison rather than an instantiation.
fn scan_argument_list(
    tokens: &mut TokenList,
    open: TokenId,
    max_depth: usize,
) -> Result<Option<TokenId>> {
    let mut depth = 1usize;
    let mut current = tokens.next(open);
    while let Some(id) = current {
        match tokens.kind(id) {
            TokenKind::Operator if tokens.matches(id, "<") => {
                depth += 1;
                if depth > max_depth {
                    return Err(AnalysisError::ResourceExhausted(format!(
                        "template nesting depth exceeds {max_depth}"
                    )));
                }
            }
            TokenKind::Operator if tokens.matches(id, ">") => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(id));
                }
            }
            TokenKind::Operator if tokens.matches(id, ">>") && depth >= 2 => {
                let (line, column) = {
                    let token = tokens.at(id);
                    (token.line, token.column)
                };
                tokens.at_mut(id).text = ">".into();
                tokens.insert_after(id, Token::new(">", TokenKind::Operator, line, column));
                depth -= 1;
                if depth == 1 {
                    // Re-examine from the freshly inserted `>`
                    current = tokens.next(id);
                    continue;
                }
            }
            TokenKind::Operator
                if tokens.matches(id, "*")
                    || tokens.matches(id, "&")
                    || tokens.matches(id, "::") => {}
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Number | TokenKind::Comma => {}
            // Anything else means this `<` was a comparison
            _ => return Ok(None),
        }
        current = tokens.next(id);
    }
    Ok(None)
}

fn collapse(tokens: &mut TokenList, inst: Instantiation) {
    let mut canonical = tokens.text(inst.name).to_string();
    canonical.push('<');
    let mut to_remove = Vec::new();
    let mut current = tokens.next(inst.open);
    while let Some(id) = current {
        if id == inst.close {
            break;
        }
        let text = tokens.text(id);
        // Keep a separator between adjacent word-like tokens (`unsigned int`)
        if canonical
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
            && text.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
        {
            canonical.push(' ');
        }
        canonical.push_str(text);
        to_remove.push(id);
        current = tokens.next(id);
    }
    canonical.push('>');
    tokens.at_mut(inst.name).text = canonical;
    tokens.remove(inst.open);
    for id in to_remove {
        tokens.remove(id);
    }
    tokens.remove(inst.close);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(source: &str) -> String {
        let mut result = tokenize(source).unwrap();
        TemplatePass
            .run(&mut result.tokens, &Settings::default())
            .unwrap();
        result.tokens.to_text()
    }

    #[test]
    fn test_simple_instantiation_collapses() {
        assert_eq!(run("vector<int> v;"), "vector<int> v ;");
        let mut result = tokenize("vector<int> v;").unwrap();
        TemplatePass
            .run(&mut result.tokens, &Settings::default())
            .unwrap();
        let ids: Vec<_> = result.tokens.ids().collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(result.tokens.kind(ids[0]), TokenKind::Identifier);
    }

    #[test]
    fn test_nested_instantiation_with_shift_closer() {
        assert_eq!(
            run("vector<pair<int, long>> v;"),
            "vector<pair<int,long>> v ;"
        );
    }

    #[test]
    fn test_multiword_argument_keeps_separator() {
        assert_eq!(run("vector<unsigned int> v;"), "vector<unsigned int> v ;");
    }

    #[test]
    fn test_comparison_not_collapsed() {
        assert_eq!(run("bool b = a < x;"), "bool b = a < x ;");
        assert_eq!(run("if (a < b) { }"), "if ( a < b ) { }");
    }

    #[test]
    fn test_template_declaration_untouched() {
        assert_eq!(
            run("template <typename T> void f();"),
            "template < typename T > void f ( ) ;"
        );
    }

    #[test]
    fn test_depth_budget_enforced() {
        let mut settings = Settings::default();
        settings.max_template_depth = 3;
        let source = "a<b<c<d<int>>>> x;";
        let mut result = tokenize(source).unwrap();
        let err = TemplatePass.run(&mut result.tokens, &settings).unwrap_err();
        assert!(matches!(err, AnalysisError::ResourceExhausted(_)));
    }
}
