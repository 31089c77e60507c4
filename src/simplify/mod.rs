//! Token stream simplification
//!
//! A fixed, ordered list of rewrite passes that reduce syntactic variety
//! before symbol resolution and checking. Each pass runs to its own fixed
//! point and is best-effort: a construct it cannot simplify is left
//! unchanged. Later passes assume the normal forms of earlier ones, so the
//! order of [`PASSES`] is part of the contract and must not change.

pub mod literals;
pub mod parentheses;
pub mod templates;
pub mod typedefs;

use crate::config::Settings;
use crate::core::Result;
use crate::lexer::TokenList;

pub trait SimplifyPass {
    fn name(&self) -> &'static str;

    /// Rewrite the token list to this pass's fixed point.
    /// Returns true if anything changed.
    fn run(&self, tokens: &mut TokenList, settings: &Settings) -> Result<bool>;
}

/// The pass list, in the only supported order.
const PASSES: &[&dyn SimplifyPass] = &[
    &typedefs::TypedefPass,
    &literals::LiteralPass,
    &parentheses::ParenthesesPass,
    &templates::TemplatePass,
];

/// Run every simplification pass once, in order.
pub fn simplify(tokens: &mut TokenList, settings: &Settings) -> Result<()> {
    for pass in PASSES {
        let changed = pass.run(tokens, settings)?;
        if changed {
            log::debug!("simplify pass '{}' rewrote the token stream", pass.name());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn simplified(source: &str) -> String {
        let mut result = tokenize(source).unwrap();
        simplify(&mut result.tokens, &Settings::default()).unwrap();
        result.tokens.to_text()
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let sources = [
            "typedef unsigned long size_t; size_t n = 0;",
            "int x = ((1)); int *p = NULL;",
            "std::vector<std::pair<int, int>> v;",
            "int a = 10UL; float f = 2.5f;",
            "void f() { if (a < b) { return; } }",
        ];
        for source in sources {
            let mut result = tokenize(source).unwrap();
            let settings = Settings::default();
            simplify(&mut result.tokens, &settings).unwrap();
            let once = result.tokens.to_text();
            simplify(&mut result.tokens, &settings).unwrap();
            assert_eq!(once, result.tokens.to_text(), "not idempotent for: {source}");
        }
    }

    #[test]
    fn test_full_pipeline_normal_form() {
        assert_eq!(
            simplified("typedef long myint; myint x = ((10L));"),
            "long x = 10 ;"
        );
    }

    #[test]
    fn test_unrecognized_constructs_left_unchanged() {
        // A pass that cannot simplify must leave the construct alone
        assert_eq!(
            simplified("typedef int (*callback)(void);"),
            "typedef int ( * callback ) ( void ) ;"
        );
    }
}
