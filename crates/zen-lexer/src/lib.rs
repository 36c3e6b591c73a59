//! Zen lexer: converts source text into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind, ALL_KEYWORDS};

use zen_types::{Result, SourceFile};

/// Tokenize a whole source file, stopping at the first malformed lexeme.
pub fn tokenize(source: &SourceFile) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}
