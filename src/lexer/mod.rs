//! Tokenizer: source text to a linked, classified token sequence

pub mod token;
pub mod tokenize;

pub use token::{Token, TokenId, TokenKind, TokenList};
pub use tokenize::{tokenize, DirectiveKind, InlineDirective, TokenizedSource};
