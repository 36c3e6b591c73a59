use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every error the interpreter can report.
///
/// `LexError` and `ParseError` are produced before evaluation starts; all
/// other kinds are raised while a program (or a module it loads) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    LexError,
    ParseError,
    NameError,
    TypeError,
    ArityError,
    ZeroDivisionError,
    OverflowError,
    VisibilityError,
    ModuleNotFoundError,
    CircularImportError,
    StackExhaustedError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::LexError => "LexError",
            Self::ParseError => "ParseError",
            Self::NameError => "NameError",
            Self::TypeError => "TypeError",
            Self::ArityError => "ArityError",
            Self::ZeroDivisionError => "ZeroDivisionError",
            Self::OverflowError => "OverflowError",
            Self::VisibilityError => "VisibilityError",
            Self::ModuleNotFoundError => "ModuleNotFoundError",
            Self::CircularImportError => "CircularImportError",
            Self::StackExhaustedError => "StackExhaustedError",
        }
    }

    /// Whether the error is detected before any code runs.
    pub fn is_syntax(self) -> bool {
        matches!(self, Self::LexError | Self::ParseError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A structured Zen error.
///
/// Serialises to JSON so front ends can render diagnostics without parsing
/// free-form strings.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}{}", position_suffix(.span))]
pub struct ZenError {
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Source location, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Name of the source unit the error came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// What the parser was looking for (parse errors only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// The token the parser found instead (parse errors only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<String>,
}

fn position_suffix(span: &Option<Span>) -> String {
    span.map(|s| format!(" (at {s})")).unwrap_or_default()
}

impl ZenError {
    /// Create an error without a source location.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
            file: None,
            expected: None,
            found: None,
        }
    }

    /// Create an error at a source location.
    pub fn at(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::new(kind, message).with_span(span)
    }

    /// Create a parse error for a token that does not fit the grammar.
    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        let expected = expected.into();
        let found = found.into();
        let mut err = Self::at(
            ErrorKind::ParseError,
            format!("expected {expected}, found '{found}'"),
            span,
        );
        err.expected = Some(expected);
        err.found = Some(found);
        err
    }

    /// Attach a location unless the error already carries a more precise one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    /// Attach the source unit name unless one is already recorded.
    ///
    /// Errors raised inside a loaded module keep the module's file name as
    /// they propagate out through the caller.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        if self.file.is_none() {
            self.file = Some(file.into());
        }
        self
    }

    /// Render a diagnostic with the offending source line and a caret.
    ///
    /// The source line is only shown when `source` is the unit the error
    /// came from.
    pub fn render(&self, source: &SourceFile) -> String {
        let mut out = format!("{}: {}", self.kind, self.message);
        let Some(span) = self.span else {
            return out;
        };
        let file = self.file.as_deref().unwrap_or(&source.name);
        out.push_str(&format!("\n  --> {file}:{span}"));
        if file != source.name {
            return out;
        }
        if let Some(line) = source.line(span.start_line) {
            let gutter = span.start_line.to_string();
            let pad = " ".repeat(gutter.len());
            let caret_col = span.start_col.saturating_sub(1) as usize;
            let width = if span.end_line == span.start_line {
                (span.end_col.saturating_sub(span.start_col) as usize).max(1)
            } else {
                1
            };
            out.push_str(&format!(
                "\n {pad} |\n {gutter} | {line}\n {pad} | {}{}",
                " ".repeat(caret_col),
                "^".repeat(width)
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_span() {
        let err = ZenError::new(ErrorKind::NameError, "undefined variable 'x'");
        assert_eq!(err.to_string(), "NameError: undefined variable 'x'");

        let err = err.with_span(Span::new(2, 4, 2, 5));
        assert_eq!(err.to_string(), "NameError: undefined variable 'x' (at 2:4)");
    }

    #[test]
    fn test_with_span_keeps_first_location() {
        let err = ZenError::at(ErrorKind::TypeError, "bad", Span::point(1, 1))
            .with_span(Span::point(9, 9));
        assert_eq!(err.span, Some(Span::point(1, 1)));
    }

    #[test]
    fn test_unexpected_records_expected_and_found() {
        let err = ZenError::unexpected("')'", "}", Span::point(3, 2));
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert_eq!(err.expected.as_deref(), Some("')'"));
        assert_eq!(err.found.as_deref(), Some("}"));
        assert_eq!(err.message, "expected ')', found '}'");
    }

    #[test]
    fn test_render_points_at_column() {
        let src = SourceFile::new("main.zen", "x = 1\ny = 5 + \"a\"");
        let err = ZenError::at(
            ErrorKind::TypeError,
            "cannot add integer and string",
            Span::new(2, 5, 2, 12),
        );
        let rendered = err.render(&src);
        assert!(rendered.contains("--> main.zen:2:5"));
        assert!(rendered.contains(" 2 | y = 5 + \"a\""));
        assert!(rendered.ends_with("    ^^^^^^^"));
    }

    #[test]
    fn test_render_other_file_omits_source_line() {
        let src = SourceFile::new("main.zen", "load(\"m\")");
        let err = ZenError::at(ErrorKind::NameError, "boom", Span::point(1, 1)).with_file("m.zen");
        let rendered = err.render(&src);
        assert!(rendered.ends_with("--> m.zen:1:1"));
    }

    #[test]
    fn test_json_serialization() {
        let err = ZenError::at(ErrorKind::ArityError, "expected 2 arguments, got 1", Span::point(4, 2))
            .with_file("main.zen");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"kind\":\"ArityError\""));
        assert!(json.contains("\"line\":4"));
        assert!(json.contains("\"column\":2"));
        assert!(!json.contains("expected\":"));

        let back: ZenError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_syntax_kinds() {
        assert!(ErrorKind::LexError.is_syntax());
        assert!(ErrorKind::ParseError.is_syntax());
        assert!(!ErrorKind::NameError.is_syntax());
    }
}
