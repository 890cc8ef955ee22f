//! Lexing and class model extraction

pub mod extractor;
pub mod lexer;
pub mod patterns;

pub use extractor::{mask_comments_and_literals, normalize_params, ClassExtractor};
pub use lexer::{classify, tokenize, LexicalClass, Token, TokenKind};
