//! Core parser infrastructure: token cursor, nesting guard, expect helpers.

use zen_lexer::token::{Token, TokenKind};
use zen_types::ast::{Ident, Program};
use zen_types::{ErrorKind, Result, SourceFile, Span, ZenError};

/// Maximum nesting of expressions and blocks before the parser gives up.
pub const MAX_NESTING_DEPTH: u32 = 256;

/// Stack headroom kept free while recursing through nested constructs.
const RED_ZONE: usize = 64 * 1024;
/// Size of each new stack segment when the headroom runs out.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// The Zen parser.
///
/// Consumes a token stream produced by the lexer and builds an AST. Parsing
/// is fail-fast: the first malformed construct aborts the whole unit.
pub struct Parser<'src> {
    /// The token stream. Always ends with `Eof`.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// Current expression/block nesting depth.
    depth: u32,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(Span::point(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, end));
        }
        Self {
            tokens,
            pos: 0,
            source_file,
            depth: 0,
        }
    }

    /// Parse a complete program.
    ///
    /// Errors carry the source file name.
    pub fn parse(mut self) -> Result<Program> {
        let file = self.source_file.name.clone();
        self.parse_program().map_err(|e| e.with_file(file))
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(idx) => self.tokens[idx].span,
            None => Span::point(1, 1),
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Result<Token> {
        if self.check_exact(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(format!("'{expected}'")))
        }
    }

    /// Expect an identifier token. Returns the name and span.
    pub(crate) fn expect_identifier(&mut self) -> Result<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Ok(Ident::new(name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Expect a parameter name: an identifier or the `self` keyword.
    pub(crate) fn expect_param_name(&mut self) -> Result<Ident> {
        if self.check_exact(&TokenKind::SelfKw) {
            let span = self.advance().span;
            return Ok(Ident::new("self", span));
        }
        self.expect_identifier()
    }

    /// Expect a string literal token. Returns the string value and its span.
    pub(crate) fn expect_string_literal(&mut self) -> Result<(String, Span)> {
        match self.peek_kind().clone() {
            TokenKind::StringLit(s) => {
                let span = self.advance().span;
                Ok((s, span))
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    /// Eat an optional `;` statement terminator.
    pub(crate) fn eat_semicolon(&mut self) {
        self.eat(&TokenKind::Semicolon);
    }

    // ── Nesting Guard ─────────────────────────────────────────────────────────

    /// Run `f` one nesting level deeper, failing once the limit is exceeded.
    ///
    /// The host stack is grown on demand so deep but legal input never
    /// overflows it.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let base = self.depth;
        self.deepen()?;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || f(self));
        self.depth = base;
        result
    }

    /// Count one more level of tree depth against the nesting limit.
    ///
    /// Left-associative chains (`a + b + c`, `a.b.c`, `f()()`) are built in
    /// a loop but still produce one tree level per link, so each link is
    /// counted here. The enclosing [`Parser::nested`] call resets the depth.
    pub(crate) fn deepen(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ZenError::at(
                ErrorKind::ParseError,
                format!("maximum nesting depth of {MAX_NESTING_DEPTH} exceeded"),
                self.current_span(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Build an "expected X, found Y" error at the current token.
    pub(crate) fn unexpected(&self, expected: impl Into<String>) -> ZenError {
        ZenError::unexpected(expected, self.peek_kind().to_string(), self.current_span())
    }

    /// Build a parse error with a custom message.
    pub(crate) fn error_at(&self, message: impl Into<String>, span: Span) -> ZenError {
        ZenError::at(ErrorKind::ParseError, message, span)
    }
}
