//! Built-in function table.
//!
//! Natives see evaluated arguments. Specials see the argument syntax and
//! drive evaluation themselves, which is how the language gets conditionals
//! and loops without any dedicated grammar.

use std::io::Write;
use std::rc::Rc;

use super::Evaluator;
use crate::ast::Node;
use crate::error::{BasicError, Error, Result};
use crate::value::function::{NativeFn, SpecialFn, MAX_ARGS};
use crate::value::{Function, Value};

pub enum Kind {
    Native(NativeFn),
    Special(SpecialFn),
}

pub struct Builtin {
    pub name: &'static str,
    pub kind: Kind,
    pub min_args: usize,
    pub max_args: usize,
}

impl Builtin {
    pub fn to_value(&self) -> Value {
        let func = match self.kind {
            Kind::Native(func) => Function::Native {
                name: self.name,
                func,
                min_args: self.min_args,
                max_args: self.max_args,
            },
            Kind::Special(func) => Function::Special {
                name: self.name,
                func,
                min_args: self.min_args,
                max_args: self.max_args,
            },
        };
        Value::Function(Rc::new(func))
    }
}

const fn native(name: &'static str, func: NativeFn, min_args: usize, max_args: usize) -> Builtin {
    Builtin { name, kind: Kind::Native(func), min_args, max_args }
}

const fn special(name: &'static str, func: SpecialFn, min_args: usize, max_args: usize) -> Builtin {
    Builtin { name, kind: Kind::Special(func), min_args, max_args }
}

/// Every root scope is seeded from this table.
pub static REGISTRY: &[Builtin] = &[
    native("CEIL", ceil, 1, 1),
    special("EVAL", eval, 1, 1),
    native("FLOOR", floor, 1, 1),
    special("FOR", for_loop, 4, 4),
    special("FOREACH", foreach, 3, 3),
    special("FUNCTION", function, 2, 2),
    special("IF", if_chain, 2, MAX_ARGS),
    native("LEN", len, 1, 1),
    native("PRINT", print, 0, MAX_ARGS),
    native("ROUND", round, 1, 1),
    native("SQRT", sqrt, 1, 1),
    special("WHILE", while_loop, 2, 2),
];

// ---- Natives ----

/// Shared body of CEIL, FLOOR and ROUND. Doubles that fit in an integer
/// become integers; NaN, infinities and out-of-range values stay doubles.
fn integral(name: &'static str, v: &Value, f: fn(f64) -> f64) -> std::result::Result<Value, BasicError> {
    match v {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        Value::Double(d) if d.is_nan() || d.is_infinite() => Ok(Value::Double(*d)),
        Value::Double(d) => {
            let r = f(*d);
            if r >= i64::MAX as f64 || r < i64::MIN as f64 {
                Ok(Value::Double(r))
            } else {
                Ok(Value::Integer(r as i64))
            }
        }
        other => Err(BasicError::UnsupportedArgument { func: name, ty: other.type_name() }),
    }
}

fn ceil(args: &[Value]) -> std::result::Result<Value, BasicError> {
    integral("CEIL", &args[0], f64::ceil)
}

fn floor(args: &[Value]) -> std::result::Result<Value, BasicError> {
    integral("FLOOR", &args[0], f64::floor)
}

fn round(args: &[Value]) -> std::result::Result<Value, BasicError> {
    integral("ROUND", &args[0], f64::round)
}

fn sqrt(args: &[Value]) -> std::result::Result<Value, BasicError> {
    match &args[0] {
        Value::Integer(i) => Ok(Value::Double((*i as f64).sqrt())),
        Value::Double(d) => Ok(Value::Double(d.sqrt())),
        other => Err(BasicError::UnsupportedArgument { func: "SQRT", ty: other.type_name() }),
    }
}

fn len(args: &[Value]) -> std::result::Result<Value, BasicError> {
    let n = match &args[0] {
        Value::String(s) => s.len(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        Value::Scope(s) => s.len(),
        other => return Err(BasicError::UnsupportedArgument { func: "LEN", ty: other.type_name() }),
    };
    Ok(Value::Integer(n as i64))
}

fn print(args: &[Value]) -> std::result::Result<Value, BasicError> {
    print_to(&mut std::io::stdout().lock(), args)
}

/// A failed write, such as a closed pipe, is logged and the call still
/// succeeds.
fn print_to(out: &mut impl Write, args: &[Value]) -> std::result::Result<Value, BasicError> {
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&arg.text()?);
    }
    if let Err(error) = writeln!(out, "{line}") {
        tracing::debug!(%error, "PRINT output dropped");
    }
    Ok(Value::Integer(args.len() as i64))
}

// ---- Specials ----

fn truthy(evaluator: &mut Evaluator, node: &Node) -> Result<bool> {
    let v = evaluator.eval_value(node)?;
    v.is_truthy().map_err(|e| Error::from(e).locate(node.span))
}

/// `IF(c1, b1, c2, b2, ..., [else])`
fn if_chain(args: &[Rc<Node>], evaluator: &mut Evaluator) -> Result<Value> {
    let mut i = 0;
    while i + 1 < args.len() {
        if truthy(evaluator, &args[i])? {
            return evaluator.eval_value(&args[i + 1]);
        }
        i += 2;
    }
    if i + 1 == args.len() {
        return evaluator.eval_value(&args[i]);
    }
    Ok(Value::Integer(0))
}

/// `FOR(init, cond, step, body)`
fn for_loop(args: &[Rc<Node>], evaluator: &mut Evaluator) -> Result<Value> {
    let mut result = Value::Integer(0);
    evaluator.eval(&args[0])?;
    while truthy(evaluator, &args[1])? {
        result = evaluator.eval_value(&args[3])?;
        evaluator.eval(&args[2])?;
    }
    Ok(result)
}

/// `WHILE(cond, body)`
fn while_loop(args: &[Rc<Node>], evaluator: &mut Evaluator) -> Result<Value> {
    let mut result = Value::Integer(0);
    while truthy(evaluator, &args[0])? {
        result = evaluator.eval_value(&args[1])?;
    }
    Ok(result)
}

/// `FOREACH(var, iterable, body)`. Objects yield `[key, value]` pairs in key
/// order. The entries are copied before the first iteration, so the body
/// may freely modify the container.
fn foreach(args: &[Rc<Node>], evaluator: &mut Evaluator) -> Result<Value> {
    let ident = evaluator.eval_ident(&args[0], "FOREACH")?;
    let iterable = evaluator.eval_value(&args[1])?;
    let items: Vec<Value> = match &iterable {
        Value::Array(a) => a.snapshot(),
        Value::Object(o) => pairs(o.snapshot()),
        Value::Scope(s) => pairs(s.local_entries()),
        other => return Err(BasicError::NotIterable { ty: other.type_name() }.into()),
    };

    let mut result = Value::Integer(0);
    for item in items {
        ident.set(item).map_err(|e| Error::from(e).locate(args[0].span))?;
        result = evaluator.eval_value(&args[2])?;
    }
    Ok(result)
}

fn pairs(entries: Vec<(String, Value)>) -> Vec<Value> {
    entries
        .into_iter()
        .map(|(k, v)| Value::array([Value::String(k), v]))
        .collect()
}

/// `FUNCTION(argspec, body)`. Each `?` in the argspec adds a required
/// argument; a `*` lifts the upper bound.
fn function(args: &[Rc<Node>], evaluator: &mut Evaluator) -> Result<Value> {
    let spec = match evaluator.eval_value(&args[0])? {
        Value::String(s) => s,
        other => {
            return Err(BasicError::UnsupportedArgument { func: "FUNCTION", ty: other.type_name() }.into());
        }
    };

    let mut min_args = 0;
    let mut max_args = 0;
    for ch in spec.chars() {
        match ch {
            '?' => min_args += 1,
            '*' => max_args = MAX_ARGS,
            _ => return Err(Error::from(BasicError::InvalidSignature { ch }).locate(args[0].span)),
        }
        max_args = max_args.max(min_args);
    }

    Ok(Value::Function(Rc::new(Function::Closure {
        body: Rc::clone(&args[1]),
        scope: evaluator.scope().clone(),
        min_args,
        max_args,
    })))
}

/// `EVAL(source)`: compile and run `source` in the caller's scope.
fn eval(args: &[Rc<Node>], evaluator: &mut Evaluator) -> Result<Value> {
    let source = match evaluator.eval_value(&args[0])? {
        Value::String(s) => s,
        other => return Err(BasicError::UnsupportedArgument { func: "EVAL", ty: other.type_name() }.into()),
    };
    tracing::debug!(depth = evaluator.depth(), len = source.len(), "EVAL re-entry");
    let program = crate::compile(&source)?;
    let mut inner = evaluator.nested(evaluator.scope().clone());
    match program.body() {
        Some(body) => inner.eval_value(body),
        None => Ok(Value::Integer(0)),
    }
}
