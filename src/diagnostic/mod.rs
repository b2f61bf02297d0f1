pub mod ansi;
pub mod json;
pub mod registry;

use crate::ast::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into(), is_primary: true });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl From<&crate::lexer::LexError> for Diagnostic {
    fn from(e: &crate::lexer::LexError) -> Self {
        let mut d = Diagnostic::error(e.to_string())
            .with_code("LE-S001")
            .with_span(e.span, "here");
        if let Some(suggestion) = &e.suggestion {
            d = d.with_suggestion(suggestion.clone());
        }
        d
    }
}

impl From<&crate::parser::ParseError> for Diagnostic {
    fn from(e: &crate::parser::ParseError) -> Self {
        Diagnostic::error(&e.message)
            .with_code(e.code)
            .with_span(e.span, "here")
    }
}

impl From<&crate::error::Error> for Diagnostic {
    fn from(e: &crate::error::Error) -> Self {
        // A call-site wrapper puts the failing call on the first line and the
        // cause on the rest.
        let message = e.message();
        let (head, cause) = match message.split_once('\n') {
            Some((head, cause)) => (head.to_string(), Some(cause.to_string())),
            None => (message, None),
        };
        let label = if e.is_syntax() { "here" } else { "while evaluating this" };
        let mut d = Diagnostic::error(head).with_code(e.code());
        if let Some(span) = e.span() {
            d = d.with_span(span, label);
        }
        if let Some(cause) = cause {
            d = d.with_note(cause);
        }
        if e.code() == "LE-R009" {
            d = d.with_suggestion("raise the limit with --max-depth");
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::{Scope, compile, eval};

    fn span(start: usize, end: usize) -> Span {
        Span { start, end, line: 1, column: start as u32 }
    }

    #[test]
    fn diagnostic_error_builder() {
        let d = Diagnostic::error("something went wrong");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "something went wrong");
        assert!(d.code.is_none());
        assert!(d.labels.is_empty());
        assert!(d.notes.is_empty());
        assert!(d.suggestion.is_none());
    }

    #[test]
    fn diagnostic_with_span() {
        let d = Diagnostic::error("bad token").with_span(span(5, 8), "here");
        assert_eq!(d.labels.len(), 1);
        assert_eq!(d.labels[0].span.start, 5);
        assert_eq!(d.labels[0].span.end, 8);
        assert!(d.labels[0].is_primary);
    }

    #[test]
    fn diagnostic_with_note_and_suggestion() {
        let d = Diagnostic::error("type mismatch")
            .with_note("in FOREACH body")
            .with_suggestion("use an array");
        assert_eq!(d.notes, vec!["in FOREACH body"]);
        assert_eq!(d.suggestion.as_deref(), Some("use an array"));
    }

    #[test]
    fn from_lex_error() {
        let e = crate::lexer::lex("x = 'a'").unwrap_err();
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("LE-S001"));
        assert!(d.message.contains('\''));
        assert_eq!(d.labels[0].span.start, 4);
        assert_eq!(d.suggestion.as_deref(), Some("string literals use double quotes"));
    }

    #[test]
    fn from_parse_error() {
        let e = crate::parser::ParseError {
            code: "LE-S001",
            span: span(10, 15),
            message: "Unexpected token `)`".to_string(),
        };
        let d = Diagnostic::from(&e);
        assert_eq!(d.message, "Unexpected token `)`");
        assert_eq!(d.code, Some("LE-S001"));
        assert_eq!(d.labels[0].span.start, 10);
    }

    #[test]
    fn from_runtime_error() {
        let e = eval("x = 1;\nx / 0", &Scope::new()).unwrap_err();
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("LE-R002"));
        assert_eq!(d.message, "Division by zero: (1 / 0)");
        assert_eq!(d.labels[0].span.line, 2);
        assert!(d.notes.is_empty());
    }

    #[test]
    fn call_wrapper_splits_into_note() {
        let e = eval("LEN(1)", &Scope::new()).unwrap_err();
        let d = Diagnostic::from(&e);
        assert_eq!(d.message, "Runtime error while executing `LEN(1)`:");
        assert_eq!(d.notes, vec!["Unsupported argument to `LEN()`: (INTEGER)"]);
        assert_eq!(d.code, Some("LE-R008"));
    }

    #[test]
    fn compile_error_keeps_code() {
        let e = compile("1 +").unwrap_err();
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("LE-S001"));
        assert_eq!(d.labels[0].message, "here");
    }

    #[test]
    fn unpositioned_error_has_no_label() {
        let e = Error::from(crate::BasicError::DepthExceeded(3));
        let d = Diagnostic::from(&e);
        assert!(d.labels.is_empty());
        assert_eq!(d.code, Some("LE-R009"));
        assert!(d.suggestion.is_some());
    }
}
