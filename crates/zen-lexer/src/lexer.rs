//! Core Zen lexer: converts source text to a token stream.
//!
//! - Whitespace and newlines are insignificant and skipped
//! - `//` line comments and `/* */` block comments are skipped
//! - Integer and floating-point literals, strings with escape decoding
//! - Fail-fast: the first malformed lexeme aborts tokenization

use zen_types::{ErrorKind, Result, SourceFile, Span, ZenError};

use crate::token::{Token, TokenKind};

/// The Zen lexer.
///
/// Converts source text into a vector of [`Token`]s that always ends with
/// [`TokenKind::Eof`].
pub struct Lexer<'src> {
    /// The full source text.
    source: &'src str,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, counted in characters).
    col: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self::from_source(&source_file.source)
    }

    /// Create a lexer directly over a string slice.
    pub fn from_source(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Lex the entire source into a token stream.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(start_line, start_col, self.line, self.col)
    }

    fn error(&self, message: impl Into<String>, span: Span) -> ZenError {
        ZenError::at(ErrorKind::LexError, message, span)
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and comments until the next significant character.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|ch| ch != '\n') {
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let (start_line, start_col) = (self.line, self.col);
        self.advance();
        self.advance();
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    return Err(self.error(
                        "unterminated block comment",
                        self.span_from(start_line, start_col),
                    ))
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;

        let start_line = self.line;
        let start_col = self.col;
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, self.current_span()));
        };

        let kind = match ch {
            '"' => return self.scan_string(start_line, start_col),
            '0'..='9' => return self.scan_number(start, start_line, start_col),
            c if c.is_alphabetic() || c == '_' => {
                return Ok(self.scan_identifier(start, start_line, start_col))
            }

            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,

            '=' if self.eat('=') => TokenKind::EqEq,
            '=' => TokenKind::Eq,
            '!' if self.eat('=') => TokenKind::BangEq,
            '!' => TokenKind::Bang,
            '<' if self.eat('=') => TokenKind::LessEq,
            '<' => TokenKind::Less,
            '>' if self.eat('=') => TokenKind::GreaterEq,
            '>' => TokenKind::Greater,
            '&' if self.eat('&') => TokenKind::AndAnd,
            '|' if self.eat('|') => TokenKind::OrOr,

            other => {
                return Err(self.error(
                    format!("unexpected character '{other}'"),
                    self.span_from(start_line, start_col),
                ))
            }
        };

        Ok(Token::new(kind, self.span_from(start_line, start_col)))
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: usize, start_line: u32, start_col: u32) -> Result<Token> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let is_float =
            self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let span = self.span_from(start_line, start_col);
        let text = &self.source[start..self.pos];
        let kind = if is_float {
            text.parse::<f64>()
                .map(TokenKind::FloatLit)
                .map_err(|_| self.error(format!("invalid float literal '{text}'"), span))?
        } else {
            text.parse::<i64>().map(TokenKind::IntLit).map_err(|_| {
                self.error(format!("integer literal '{text}' is out of range"), span)
            })?
        };
        Ok(Token::new(kind, span))
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        let kind =
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        Token::new(kind, self.span_from(start_line, start_col))
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a string literal starting after the opening `"`.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Result<Token> {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error(
                        "unterminated string literal",
                        self.span_from(start_line, start_col),
                    ))
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::new(
                        TokenKind::StringLit(buf),
                        self.span_from(start_line, start_col),
                    ));
                }
                Some('\\') => buf.push(self.scan_escape_sequence()?),
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Decode an escape sequence starting at the `\`.
    fn scan_escape_sequence(&mut self) -> Result<char> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();

        match self.advance() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some(ch) => Err(self.error(
                format!("invalid escape sequence '\\{ch}'"),
                self.span_from(start_line, start_col),
            )),
            None => Err(self.error(
                "unterminated string literal",
                self.span_from(start_line, start_col),
            )),
        }
    }
}
