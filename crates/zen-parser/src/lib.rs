//! Zen parser: converts a token stream into an AST.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{Parser, MAX_NESTING_DEPTH};

use zen_types::ast::Program;
use zen_types::{Result, SourceFile};

/// Lex and parse a whole source file.
///
/// Both stages are fail-fast; the returned error carries the file name.
pub fn parse(source: &SourceFile) -> Result<Program> {
    let tokens = zen_lexer::tokenize(source).map_err(|e| e.with_file(source.name.as_str()))?;
    Parser::new(tokens, source).parse()
}
