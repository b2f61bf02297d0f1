//! Two-tier error model.
//!
//! [`BasicError`] is raised where no syntax is in reach: value operators,
//! codecs, scopes, idents and built-ins. The evaluator turns it into a
//! positioned [`Error`] at the node that was being visited; nothing else
//! attaches positions.

use crate::ast::Span;

/// An error without a source position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BasicError {
    #[error("Unsupported operation `{op}()`: {ty}")]
    UnsupportedOperation { op: &'static str, ty: &'static str },

    #[error("Unsupported operand type for `{op}`: ({ty})")]
    UnsupportedOperand { op: &'static str, ty: &'static str },

    #[error("Unsupported operand type(s) for `{op}`: ({left},{right})")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("Division by zero: ({left} / {right})")]
    DivisionByZero { left: i64, right: i64 },

    #[error("Modulus by zero: ({left} % {right})")]
    ModulusByZero { left: i64, right: i64 },

    #[error("Invalid attempt to shift `{op}` by a negative amount: {amount}")]
    NegativeShift { op: &'static str, amount: i64 },

    #[error("Array index `{index}` out of range, expected < {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Array index `{index}` out of range, expected <= {len}")]
    InsertOutOfRange { index: i64, len: usize },

    #[error("{key} is not a valid symbol")]
    UnknownSymbol { key: String },

    #[error("Invalid identifier {access} type: {ty}")]
    NotAContainer { access: &'static str, ty: &'static str },

    #[error("`{name}` is not a function: ({ty})")]
    NotCallable { name: String, ty: &'static str },

    #[error("Unsupported argument to `{func}()`: ({ty})")]
    UnsupportedArgument { func: &'static str, ty: &'static str },

    #[error("Argument 2 to `FOREACH` must be an iterable, got ({ty})")]
    NotIterable { ty: &'static str },

    #[error("Invalid argument count. min={min}, max={max}, got={got}")]
    ArgumentCount { min: usize, max: usize, got: usize },

    #[error("{ch} is an invalid function signature")]
    InvalidSignature { ch: char },

    #[error("Invalid decimal character: {0}")]
    InvalidDecimal(char),

    #[error("Invalid hexadecimal character: {0}")]
    InvalidHex(char),

    #[error("Invalid double literal: {0}")]
    InvalidDouble(String),

    #[error("Invalid backslash sequence in string at position {0}")]
    InvalidEscape(usize),

    #[error("Invalid code point {0:#x} in string")]
    InvalidCodePoint(u32),

    #[error("Maximum evaluation depth of {0} exceeded")]
    DepthExceeded(usize),
}

impl BasicError {
    /// Literal decoding and call-shape problems are syntax errors; everything
    /// else happens at run time.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            BasicError::ArgumentCount { .. }
                | BasicError::InvalidDecimal(_)
                | BasicError::InvalidHex(_)
                | BasicError::InvalidDouble(_)
                | BasicError::InvalidEscape(_)
                | BasicError::InvalidCodePoint(_)
        )
    }

    /// Stable diagnostic code, see [`crate::diagnostic::registry`].
    pub fn code(&self) -> &'static str {
        match self {
            BasicError::UnsupportedOperation { .. }
            | BasicError::UnsupportedOperand { .. }
            | BasicError::UnsupportedOperands { .. } => "LE-R001",
            BasicError::DivisionByZero { .. } | BasicError::ModulusByZero { .. } => "LE-R002",
            BasicError::NegativeShift { .. } => "LE-R003",
            BasicError::IndexOutOfRange { .. } | BasicError::InsertOutOfRange { .. } => "LE-R004",
            BasicError::UnknownSymbol { .. } => "LE-R005",
            BasicError::NotAContainer { .. } => "LE-R006",
            BasicError::NotCallable { .. } => "LE-R007",
            BasicError::UnsupportedArgument { .. }
            | BasicError::NotIterable { .. }
            | BasicError::InvalidSignature { .. } => "LE-R008",
            BasicError::DepthExceeded(_) => "LE-R009",
            BasicError::ArgumentCount { .. } => "LE-S002",
            BasicError::InvalidDecimal(_)
            | BasicError::InvalidHex(_)
            | BasicError::InvalidDouble(_) => "LE-S003",
            BasicError::InvalidEscape(_) | BasicError::InvalidCodePoint(_) => "LE-S004",
        }
    }
}

/// Any error surfacing from compile or eval.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Not yet attached to a node. Only escapes to a host that calls value
    /// or scope operations directly.
    #[error(transparent)]
    Basic(#[from] BasicError),

    #[error("[line {line}, col {column}] {message}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
        span: Span,
        code: &'static str,
    },

    #[error("[line {line}, col {column}] {message}")]
    Runtime {
        message: String,
        line: u32,
        column: u32,
        span: Span,
        code: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn syntax(message: impl Into<String>, span: Span, code: &'static str) -> Self {
        Error::Syntax {
            message: message.into(),
            line: span.line,
            column: span.column + 1,
            span,
            code,
        }
    }

    pub(crate) fn runtime(message: impl Into<String>, span: Span, code: &'static str) -> Self {
        Error::Runtime {
            message: message.into(),
            line: span.line,
            column: span.column + 1,
            span,
            code,
        }
    }

    /// Attach `span` to a basic error. Positioned errors pass through.
    pub fn locate(self, span: Span) -> Self {
        match self {
            Error::Basic(e) => {
                let code = e.code();
                if e.is_syntax() {
                    Error::syntax(e.to_string(), span, code)
                } else {
                    Error::runtime(e.to_string(), span, code)
                }
            }
            positioned => positioned,
        }
    }

    /// Like [`Error::locate`], prefixing the message with the text of the
    /// call that failed.
    pub fn locate_call(self, span: Span, text: &str) -> Self {
        match self {
            Error::Basic(e) => {
                let code = e.code();
                if e.is_syntax() {
                    Error::syntax(format!("Syntax error while executing `{text}`:\n{e}"), span, code)
                } else {
                    Error::runtime(format!("Runtime error while executing `{text}`:\n{e}"), span, code)
                }
            }
            positioned => positioned,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Error::Basic(e) => e.to_string(),
            Error::Syntax { message, .. } | Error::Runtime { message, .. } => message.clone(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Basic(_) => None,
            Error::Syntax { span, .. } | Error::Runtime { span, .. } => Some(*span),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Basic(e) => e.code(),
            Error::Syntax { code, .. } | Error::Runtime { code, .. } => code,
        }
    }

    pub fn is_syntax(&self) -> bool {
        match self {
            Error::Basic(e) => e.is_syntax(),
            Error::Syntax { .. } => true,
            Error::Runtime { .. } => false,
        }
    }
}
