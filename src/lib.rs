//! liteexpr: a small embeddable expression language.
//!
//! ```
//! use liteexpr::{eval, Scope, Value};
//!
//! let scope = Scope::with_values([("x", Value::from(20))]);
//! let result = eval("y = x * 2 + 2; y", &scope).unwrap();
//! assert_eq!(result, Value::from(42));
//! assert_eq!(scope.get("y").unwrap(), Value::from(42));
//! ```

use std::rc::Rc;

pub mod ast;
pub mod diagnostic;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{BasicError, Error, Result};
pub use interpreter::{EvalOptions, Evaluator};
pub use value::{Array, Function, Ident, Object, Scope, Value};

/// A parsed program, ready to be evaluated any number of times.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    program: ast::Program,
}

impl CompiledProgram {
    pub fn new(program: ast::Program) -> Self {
        CompiledProgram { program }
    }

    pub fn program(&self) -> &ast::Program {
        &self.program
    }

    pub fn body(&self) -> Option<&Rc<ast::Node>> {
        self.program.body.as_ref()
    }

    pub fn eval(&self, scope: &Scope) -> Result<Value> {
        self.eval_with(scope, EvalOptions::default())
    }

    /// Evaluate against `scope`. The result is always dereferenced; an
    /// empty program yields `0`.
    pub fn eval_with(&self, scope: &Scope, options: EvalOptions) -> Result<Value> {
        let Some(body) = self.body() else {
            return Ok(Value::Integer(0));
        };
        let mut evaluator = Evaluator::new(scope.clone(), options);
        evaluator.eval_value(body)
    }
}

pub fn compile(source: &str) -> Result<CompiledProgram> {
    let tokens = lexer::lex(source).map_err(|e| Error::syntax(e.to_string(), e.span, "LE-S001"))?;
    let program = parser::parse(source, tokens).map_err(|e| Error::syntax(e.message, e.span, e.code))?;
    tracing::debug!(bytes = source.len(), empty = program.body.is_none(), "compiled");
    Ok(CompiledProgram::new(program))
}

/// Compile and evaluate in one step.
pub fn eval(source: &str, scope: &Scope) -> Result<Value> {
    compile(source)?.eval(scope)
}
