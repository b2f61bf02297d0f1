use std::rc::Rc;

use super::{Scope, Value};
use crate::ast::Node;
use crate::error::{BasicError, Error, Result};
use crate::interpreter::Evaluator;

/// Upper arity bound used for "any number of arguments".
pub const MAX_ARGS: usize = i32::MAX as usize;

/// Eager built-in: receives fully evaluated, dereferenced arguments.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, BasicError>;

/// Lazy built-in: receives the argument syntax and decides what to evaluate.
pub type SpecialFn = fn(&[Rc<Node>], &mut Evaluator) -> Result<Value>;

pub enum Function {
    Native {
        name: &'static str,
        func: NativeFn,
        min_args: usize,
        max_args: usize,
    },
    Special {
        name: &'static str,
        func: SpecialFn,
        min_args: usize,
        max_args: usize,
    },
    /// User function created by `FUNCTION`. Runs `body` in a child of the
    /// scope it was created in.
    Closure {
        body: Rc<Node>,
        scope: Scope,
        min_args: usize,
        max_args: usize,
    },
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Native { name, .. } | Function::Special { name, .. } => name,
            Function::Closure { .. } => "<closure>",
        }
    }

    pub fn arity(&self) -> (usize, usize) {
        match self {
            Function::Native { min_args, max_args, .. }
            | Function::Special { min_args, max_args, .. }
            | Function::Closure { min_args, max_args, .. } => (*min_args, *max_args),
        }
    }

    /// Invoke with unevaluated argument syntax. Arity problems come back
    /// as a basic syntax error for the call site to position.
    pub fn call(&self, args: &[Rc<Node>], evaluator: &mut Evaluator) -> Result<Value> {
        let (min, max) = self.arity();
        if args.len() < min || args.len() > max {
            return Err(BasicError::ArgumentCount { min, max, got: args.len() }.into());
        }

        match self {
            Function::Native { func, .. } => {
                let values = args
                    .iter()
                    .map(|arg| evaluator.eval_value(arg))
                    .collect::<Result<Vec<_>>>()?;
                func(&values).map_err(Error::from)
            }
            Function::Special { func, .. } => func(args, evaluator),
            Function::Closure { body, scope, .. } => {
                let values = args
                    .iter()
                    .map(|arg| evaluator.eval_value(arg))
                    .collect::<Result<Vec<_>>>()?;
                let call_scope = Scope::with_parent(scope);
                call_scope.define("ARG", Value::array(values));
                tracing::trace!(args = args.len(), depth = evaluator.depth(), "closure call");
                evaluator.nested(call_scope).eval_value(body)
            }
        }
    }
}
