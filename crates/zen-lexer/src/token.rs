//! Token types for the Zen lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the language and
//! [`Token`], which pairs a kind with a source [`Span`].

use std::fmt;
use zen_types::Span;

/// All reserved words. These cannot be used as user-defined names.
pub const ALL_KEYWORDS: &[&str] = &[
    "bag", "load", "fx", "clx", "return", "if", "else", "true", "false", "nil", "self",
];

/// A token with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every kind of token the lexer can produce.
///
/// Literal and identifier kinds carry their decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ─────────────────────────────────────────────

    /// Integer literal, e.g. `42`
    IntLit(i64),
    /// Floating-point literal, e.g. `3.14`
    FloatLit(f64),
    /// String literal with escapes already decoded
    StringLit(String),

    /// User identifier
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    /// `bag`
    Bag,
    /// `load`
    Load,
    /// `fx`
    Fx,
    /// `clx`
    Clx,
    /// `return`
    Return,
    /// `if`
    If,
    /// `else`
    Else,
    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,
    /// `self`
    SelfKw,

    // ── Operators ────────────────────────────────────────────

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `!`
    Bang,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `None` for user identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "bag" => TokenKind::Bag,
            "load" => TokenKind::Load,
            "fx" => TokenKind::Fx,
            "clx" => TokenKind::Clx,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            "self" => TokenKind::SelfKw,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Bag
                | TokenKind::Load
                | TokenKind::Fx
                | TokenKind::Clx
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Nil
                | TokenKind::SelfKw
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLit(n) => write!(f, "{n}"),
            TokenKind::FloatLit(n) => write!(f, "{n:?}"),
            TokenKind::StringLit(s) => write!(f, "\"{s}\""),
            TokenKind::Identifier(s) => f.write_str(s),
            TokenKind::Bag => f.write_str("bag"),
            TokenKind::Load => f.write_str("load"),
            TokenKind::Fx => f.write_str("fx"),
            TokenKind::Clx => f.write_str("clx"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Nil => f.write_str("nil"),
            TokenKind::SelfKw => f.write_str("self"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::Eq => f.write_str("="),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::AndAnd => f.write_str("&&"),
            TokenKind::OrOr => f.write_str("||"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all() {
        for &kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw);
            assert!(kind.as_ref().is_some_and(TokenKind::is_keyword), "keyword '{kw}'");
            assert_eq!(kind.unwrap().to_string(), kw);
        }
    }

    #[test]
    fn test_from_keyword_returns_none_for_identifiers() {
        for ident in ["Add", "self_", "loader", "fxx", "If", "print"] {
            assert_eq!(TokenKind::from_keyword(ident), None, "'{ident}'");
        }
    }

    #[test]
    fn test_display_float_keeps_fraction() {
        assert_eq!(TokenKind::FloatLit(2.0).to_string(), "2.0");
        assert_eq!(TokenKind::FloatLit(0.5).to_string(), "0.5");
    }
}
