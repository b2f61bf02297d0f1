use std::rc::Rc;

use serde::Serialize;

pub mod source_map;
pub use source_map::{Snippet, SourceMap};

// ---- Span infrastructure ----

/// Byte range within source text, plus the line (1-based) and column
/// (0-based) of its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0, line: 0, column: 0 };

    pub fn merge(self, other: Span) -> Span {
        let first = if self.start <= other.start { self } else { other };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }
}

/// Wraps a node with its source span. Transparent to serde (serializes as inner node only).
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Spanned { node, span }
    }

    pub fn unknown(node: T) -> Self {
        Spanned { node, span: Span::UNKNOWN }
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.node
    }
}

impl<T: Serialize> Serialize for Spanned<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node.serialize(serializer)
    }
}

// ---- Syntax tree ----

/// Identity of a literal node, used to cache its decoded value for one
/// evaluation pass. Unique within one compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub u32);

pub type Node = Spanned<Expr>;

/// Expressions. Literal variants keep their raw source text; decoding is
/// the evaluator's job so that bad escapes surface as positioned errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// `"..."`, quotes included
    String { id: NodeId, text: String },
    /// `1.5`, `2e10`
    Double { id: NodeId, text: String },
    /// `0x1f`, prefix included
    Hex { id: NodeId, text: String },
    /// `42`
    Int { id: NodeId, text: String },

    /// `[a, b, c]`
    Array(Vec<Node>),

    /// `{ key: value, ... }`, pairs in source order
    Object(Vec<(String, Node)>),

    /// `callee(args)`. Arguments are shared so a closure can keep its body
    /// alive after the compiled program that defined it is dropped.
    Call {
        callee: Box<Node>,
        args: Vec<Rc<Node>>,
        #[serde(skip)]
        text: String,
    },

    /// `(expr)`
    Paren(Box<Node>),

    /// `++x`, `--x`
    Prefix { op: Spanned<StepOp>, target: Box<Node> },

    /// `x++`, `x--`
    Postfix { op: Spanned<StepOp>, target: Box<Node> },

    /// `!x`, `~x`, `+x`, `-x`
    Unary { op: Spanned<UnaryOp>, operand: Box<Node> },

    /// `a OP b`, including `&&`, `||` and `;`
    Binary {
        op: Spanned<BinaryOp>,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// `cond ? then : otherwise`
    Ternary {
        #[serde(skip)]
        op: Span,
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },

    /// `x = v`, `x += v`, ...
    Assign {
        op: Spanned<AssignOp>,
        target: Box<Node>,
        value: Box<Node>,
    },

    /// `name`
    Var(String),

    /// `base.member`
    Member { base: Box<Node>, member: String },

    /// `base[index]`
    Index { base: Box<Node>, index: Box<Node> },

    /// `expr;` at the end of a sequence
    Term(Box<Node>),
}

impl Expr {
    /// True for the variable forms that evaluate to an lvalue.
    pub fn is_var(&self) -> bool {
        matches!(self, Expr::Var(_) | Expr::Member { .. } | Expr::Index { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepOp {
    Inc,
    Dec,
}

impl StepOp {
    pub fn symbol(self) -> &'static str {
        match self {
            StepOp::Inc => "++",
            StepOp::Dec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Inv,
    Pos,
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Inv => "~",
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Pow,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Asr,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Seq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Pow => "**",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Asr => ">>",
            BinaryOp::Shr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Seq => ";",
        }
    }
}

/// Assignment operators. `Compound` covers every `OP=` form whose operator
/// dispatches through the value protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
    OrAssign,
    AndAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Compound(BinaryOp::Pow) => "**=",
            AssignOp::Compound(BinaryOp::Mul) => "*=",
            AssignOp::Compound(BinaryOp::Div) => "/=",
            AssignOp::Compound(BinaryOp::Mod) => "%=",
            AssignOp::Compound(BinaryOp::Add) => "+=",
            AssignOp::Compound(BinaryOp::Sub) => "-=",
            AssignOp::Compound(BinaryOp::Shl) => "<<=",
            AssignOp::Compound(BinaryOp::Asr) => ">>=",
            AssignOp::Compound(BinaryOp::Shr) => ">>>=",
            AssignOp::Compound(BinaryOp::BitAnd) => "&=",
            AssignOp::Compound(BinaryOp::BitXor) => "^=",
            AssignOp::Compound(BinaryOp::BitOr) => "|=",
            AssignOp::Compound(_) => "?=",
            AssignOp::OrAssign => "||=",
            AssignOp::AndAssign => "&&=",
        }
    }
}

/// A compiled source file: at most one top-level expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub body: Option<Rc<Node>>,
    #[serde(skip)]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Span {
        Span { start, end, line: 1, column: start as u32 }
    }

    #[test]
    fn span_unknown_is_zero() {
        assert_eq!(Span::UNKNOWN, Span::default());
    }

    #[test]
    fn span_merge_takes_extremes() {
        let a = span(5, 10);
        let b = span(2, 15);
        let merged = a.merge(b);
        assert_eq!(merged, span(2, 15));
    }

    #[test]
    fn span_merge_keeps_position_of_first() {
        let a = Span { start: 10, end: 12, line: 2, column: 3 };
        let b = Span { start: 0, end: 4, line: 1, column: 0 };
        let merged = a.merge(b);
        assert_eq!((merged.line, merged.column), (1, 0));
        assert_eq!(merged.end, 12);
    }

    #[test]
    fn spanned_deref() {
        let s = Spanned::new(42, span(0, 2));
        assert_eq!(*s, 42);
    }

    #[test]
    fn spanned_serialize_transparent() {
        let s = Spanned::new(42i32, span(5, 10));
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn call_text_not_serialized() {
        let call = Expr::Call {
            callee: Box::new(Spanned::unknown(Expr::Var("PRINT".into()))),
            args: vec![],
            text: "PRINT()".into(),
        };
        let json = serde_json::to_string(&call).unwrap();
        assert!(json.contains("PRINT"));
        assert!(!json.contains("PRINT()"));
    }

    #[test]
    fn program_source_not_serialized() {
        let prog = Program {
            body: Some(Rc::new(Spanned::unknown(Expr::Int { id: NodeId(0), text: "1".into() }))),
            source: Some("1".to_string()),
        };
        let json = serde_json::to_string(&prog).unwrap();
        assert!(!json.contains("source"));
        assert!(json.contains("Int"));
    }

    #[test]
    fn assign_symbols() {
        assert_eq!(AssignOp::Compound(BinaryOp::Shr).symbol(), ">>>=");
        assert_eq!(AssignOp::OrAssign.symbol(), "||=");
        assert_eq!(BinaryOp::Seq.symbol(), ";");
    }

    #[test]
    fn var_forms() {
        assert!(Expr::Var("x".into()).is_var());
        assert!(!Expr::Int { id: NodeId(0), text: "1".into() }.is_var());
    }
}
