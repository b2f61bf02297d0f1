use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::*;
use crate::error::{BasicError, Error, Result};
use crate::value::{codec, ops, Ident, Scope, Value};

pub mod builtins;

/// Stack headroom kept free before growing onto a new segment.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Deepest node nesting an evaluation may reach, counted across closure
    /// calls and `EVAL`.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions { max_depth: 10_000 }
    }
}

/// Tree-walking evaluator bound to one scope.
///
/// Literal values are decoded once per node and cached for the lifetime of
/// the evaluator. Basic errors are given a position here and nowhere else.
pub struct Evaluator {
    scope: Scope,
    cache: FxHashMap<NodeId, Value>,
    depth: usize,
    options: EvalOptions,
}

impl Evaluator {
    pub fn new(scope: Scope, options: EvalOptions) -> Self {
        Evaluator {
            scope,
            cache: FxHashMap::default(),
            depth: 0,
            options,
        }
    }

    /// A fresh evaluator on `scope` that continues this one's depth count.
    pub fn nested(&self, scope: Scope) -> Evaluator {
        Evaluator {
            scope,
            cache: FxHashMap::default(),
            depth: self.depth,
            options: self.options,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Evaluate `node`. Variable forms produce an [`Ident`].
    pub fn eval(&mut self, node: &Node) -> Result<Value> {
        if self.depth >= self.options.max_depth {
            tracing::debug!(max_depth = self.options.max_depth, line = node.span.line, "depth limit reached");
            return Err(Error::from(BasicError::DepthExceeded(self.options.max_depth)).locate(node.span));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.visit(node));
        self.depth -= 1;
        result
    }

    /// Evaluate `node` and dereference the result.
    pub fn eval_value(&mut self, node: &Node) -> Result<Value> {
        self.eval(node)?
            .into_resolved()
            .map_err(|e| Error::from(e).locate(node.span))
    }

    /// Evaluate `node`, which must produce an assignable location.
    pub fn eval_ident(&mut self, node: &Node, func: &'static str) -> Result<Rc<Ident>> {
        match self.eval(node)? {
            Value::Ident(ident) => Ok(ident),
            other => Err(Error::from(BasicError::UnsupportedArgument { func, ty: other.type_name() }).locate(node.span)),
        }
    }

    fn visit(&mut self, node: &Node) -> Result<Value> {
        match &node.node {
            Expr::String { id, text } => self.literal(*id, node.span, || codec::decode_string(text).map(Value::String)),
            Expr::Double { id, text } => self.literal(*id, node.span, || codec::decode_double(text).map(Value::Double)),
            Expr::Hex { id, text } => self.literal(*id, node.span, || codec::decode_hex(text).map(Value::Integer)),
            Expr::Int { id, text } => self.literal(*id, node.span, || codec::decode_integer(text).map(Value::Integer)),

            Expr::Array(items) => {
                let values = items.iter().map(|item| self.eval_value(item)).collect::<Result<Vec<_>>>()?;
                Ok(Value::array(values))
            }
            Expr::Object(pairs) => {
                let mut entries = Vec::with_capacity(pairs.len());
                for (key, item) in pairs {
                    entries.push((key.as_str(), self.eval_value(item)?));
                }
                Ok(Value::object(entries))
            }

            Expr::Call { callee, args, text } => self.call(node.span, callee, args, text),
            Expr::Paren(inner) | Expr::Term(inner) => self.eval(inner),

            Expr::Prefix { op, target } => {
                let ident = self.eval_ident(target, op.node.symbol())?;
                let updated = ident
                    .get()
                    .and_then(|old| ops::step(op.node, &old))
                    .and_then(|new| ident.set(new.clone()).map(|_| new))
                    .map_err(|e| Error::from(e).locate(op.span))?;
                Ok(updated)
            }
            Expr::Postfix { op, target } => {
                let ident = self.eval_ident(target, op.node.symbol())?;
                let old = ident
                    .get()
                    .and_then(|old| {
                        let new = ops::step(op.node, &old)?;
                        ident.set(new)?;
                        Ok(old)
                    })
                    .map_err(|e| Error::from(e).locate(op.span))?;
                Ok(old)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                ops::unary(op.node, &value).map_err(|e| Error::from(e).locate(op.span))
            }

            Expr::Binary { op, left, right } => self.binary(op, left, right),

            Expr::Ternary { op, condition, then, otherwise } => {
                let cond = self.eval(condition)?;
                let truthy = cond.is_truthy().map_err(|e| Error::from(e).locate(*op))?;
                if truthy { self.eval(then) } else { self.eval(otherwise) }
            }

            Expr::Assign { op, target, value } => self.assign(op, target, value),

            Expr::Var(name) => Ok(Value::Ident(Rc::new(Ident::new(
                Value::Scope(self.scope.clone()),
                Value::string(name.as_str()),
            )))),
            Expr::Member { base, member } => {
                let container = self.eval_value(base)?;
                Ok(Value::Ident(Rc::new(Ident::new(container, Value::string(member.as_str())))))
            }
            Expr::Index { base, index } => {
                let container = self.eval_value(base)?;
                let key = self.eval_value(index)?;
                Ok(Value::Ident(Rc::new(Ident::new(container, key))))
            }
        }
    }

    fn literal(
        &mut self,
        id: NodeId,
        span: Span,
        decode: impl FnOnce() -> std::result::Result<Value, BasicError>,
    ) -> Result<Value> {
        if let Some(value) = self.cache.get(&id) {
            return Ok(value.clone());
        }
        let value = decode().map_err(|e| Error::from(e).locate(span))?;
        self.cache.insert(id, value.clone());
        Ok(value)
    }

    fn call(&mut self, span: Span, callee: &Node, args: &[Rc<Node>], text: &str) -> Result<Value> {
        let target = self.eval(callee)?;
        let result = target.resolve().map_err(Error::from).and_then(|f| match f {
            Value::Function(func) => func.call(args, self),
            other => {
                let name = text.get(..callee.span.end.saturating_sub(span.start)).unwrap_or(text);
                Err(BasicError::NotCallable { name: name.to_string(), ty: other.type_name() }.into())
            }
        });
        result
            .and_then(|v| v.into_resolved().map_err(Error::from))
            .map_err(|e| e.locate_call(span, text))
    }

    fn binary(&mut self, op: &Spanned<BinaryOp>, left: &Node, right: &Node) -> Result<Value> {
        match op.node {
            BinaryOp::And | BinaryOp::Or => {
                let l = self.eval_value(left)?;
                let truthy = l.is_truthy().map_err(|e| Error::from(e).locate(op.span))?;
                let decided = if op.node == BinaryOp::And { !truthy } else { truthy };
                if decided { Ok(l) } else { self.eval_value(right) }
            }
            BinaryOp::Seq => {
                self.eval(left)?;
                self.eval(right)
            }
            _ => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                ops::binary(op.node, &l, &r).map_err(|e| Error::from(e).locate(op.span))
            }
        }
    }

    fn assign(&mut self, op: &Spanned<AssignOp>, target: &Node, value: &Node) -> Result<Value> {
        let ident = self.eval_ident(target, op.node.symbol())?;
        let at_op = |e: BasicError| Error::from(e).locate(op.span);

        match op.node {
            AssignOp::Assign => {
                let v = self.eval_value(value)?;
                ident.set(v.clone()).map_err(at_op)?;
                Ok(v)
            }
            AssignOp::Compound(bin) => {
                let current = ident.get().map_err(at_op)?;
                let rhs = self.eval_value(value)?;
                let v = ops::binary(bin, &current, &rhs).map_err(at_op)?;
                ident.set(v.clone()).map_err(at_op)?;
                Ok(v)
            }
            AssignOp::OrAssign | AssignOp::AndAssign => {
                let current = ident.get().map_err(at_op)?;
                let truthy = current.is_truthy().map_err(at_op)?;
                let keep = if op.node == AssignOp::OrAssign { truthy } else { !truthy };
                let v = if keep { current } else { self.eval_value(value)? };
                ident.set(v.clone()).map_err(at_op)?;
                Ok(v)
            }
        }
    }
}
