//! Operator protocol. Every entry point dereferences idents first and
//! dispatches on the concrete types of its operands.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use super::{Array, Value};
use crate::ast::{BinaryOp, StepOp, UnaryOp};
use crate::error::BasicError;

pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, BasicError> {
    let v = operand.resolve()?;
    let result = match (op, &v) {
        (UnaryOp::Not, _) => Value::bool(!v.is_truthy()?),
        (UnaryOp::Inv, Value::Integer(a)) => Value::Integer(!a),
        (UnaryOp::Pos, Value::Integer(_) | Value::Double(_)) => v.clone(),
        (UnaryOp::Neg, Value::Integer(a)) => Value::Integer(a.wrapping_neg()),
        (UnaryOp::Neg, Value::Double(a)) => Value::Double(-a),
        _ => {
            return Err(BasicError::UnsupportedOperand { op: op.symbol(), ty: v.type_name() });
        }
    };
    Ok(result)
}

/// `++`/`--`: the stepped value. Writing it back is the caller's job.
pub fn step(op: StepOp, operand: &Value) -> Result<Value, BasicError> {
    match (op, operand.resolve()?) {
        (StepOp::Inc, Value::Integer(a)) => Ok(Value::Integer(a.wrapping_add(1))),
        (StepOp::Dec, Value::Integer(a)) => Ok(Value::Integer(a.wrapping_sub(1))),
        (_, other) => Err(BasicError::UnsupportedOperand { op: op.symbol(), ty: other.type_name() }),
    }
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, BasicError> {
    use Value::{Double as D, Integer as I, String as S};

    let l = left.resolve()?;
    let r = right.resolve()?;
    let unsupported = || BasicError::UnsupportedOperands {
        op: op.symbol(),
        left: l.type_name(),
        right: r.type_name(),
    };

    let result = match op {
        BinaryOp::Eq => Value::bool(equals(&l, &r)?),
        BinaryOp::Ne => Value::bool(!equals(&l, &r)?),
        BinaryOp::Lt => Value::bool(order(op, &l, &r)? == Some(Ordering::Less)),
        BinaryOp::Gt => Value::bool(order(op, &l, &r)? == Some(Ordering::Greater)),
        BinaryOp::Le => Value::bool(matches!(order(op, &l, &r)?, Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Ge => Value::bool(matches!(order(op, &l, &r)?, Some(Ordering::Greater | Ordering::Equal))),

        BinaryOp::And => if l.is_truthy()? { r.clone() } else { l.clone() },
        BinaryOp::Or => if l.is_truthy()? { l.clone() } else { r.clone() },
        BinaryOp::Seq => r.clone(),

        BinaryOp::Add => match (&l, &r) {
            (I(a), I(b)) => I(a.wrapping_add(*b)),
            (S(a), S(_) | I(_) | D(_)) => S(format!("{a}{}", r.text()?)),
            (I(_) | D(_), S(b)) => S(format!("{}{b}", l.text()?)),
            (Value::Array(a), Value::Array(b)) => {
                let mut items = a.snapshot();
                items.extend(b.snapshot());
                Value::Array(Array::new(items))
            }
            _ => D(float_op(op, &l, &r).ok_or_else(unsupported)?),
        },
        BinaryOp::Sub | BinaryOp::Mul => match (&l, &r) {
            (I(a), I(b)) if op == BinaryOp::Sub => I(a.wrapping_sub(*b)),
            (I(a), I(b)) => I(a.wrapping_mul(*b)),
            _ => D(float_op(op, &l, &r).ok_or_else(unsupported)?),
        },
        BinaryOp::Div => match (&l, &r) {
            (I(a), I(0)) => return Err(BasicError::DivisionByZero { left: *a, right: 0 }),
            (I(a), I(b)) => I(a.wrapping_div(*b)),
            _ => D(float_op(op, &l, &r).ok_or_else(unsupported)?),
        },
        BinaryOp::Mod => match (&l, &r) {
            (I(a), I(0)) => return Err(BasicError::ModulusByZero { left: *a, right: 0 }),
            (I(a), I(b)) => I(a.wrapping_rem(*b)),
            _ => return Err(unsupported()),
        },
        BinaryOp::Pow => match (&l, &r) {
            (I(a), I(b)) => integer_pow(*a, *b),
            _ => D(float_op(op, &l, &r).ok_or_else(unsupported)?),
        },

        BinaryOp::Shl | BinaryOp::Asr | BinaryOp::Shr => match (&l, &r) {
            (I(a), I(b)) => I(shift(op, *a, *b)?),
            _ => return Err(unsupported()),
        },
        BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => match (&l, &r) {
            (I(a), I(b)) if op == BinaryOp::BitAnd => I(a & b),
            (I(a), I(b)) if op == BinaryOp::BitXor => I(a ^ b),
            (I(a), I(b)) => I(a | b),
            _ => return Err(unsupported()),
        },
    };
    Ok(result)
}

/// Arithmetic on two numbers where at least one is a double.
fn float_op(op: BinaryOp, l: &Value, r: &Value) -> Option<f64> {
    let (a, b) = match (l, r) {
        (Value::Integer(a), Value::Double(b)) => (*a as f64, *b),
        (Value::Double(a), Value::Integer(b)) => (*a, *b as f64),
        (Value::Double(a), Value::Double(b)) => (*a, *b),
        _ => return None,
    };
    match op {
        BinaryOp::Add => Some(a + b),
        BinaryOp::Sub => Some(a - b),
        BinaryOp::Mul => Some(a * b),
        BinaryOp::Div => Some(a / b),
        BinaryOp::Pow => Some(a.powf(b)),
        _ => None,
    }
}

/// Negative exponents give a double; otherwise square-and-multiply with
/// wrapping, so any `i64` exponent works.
fn integer_pow(base: i64, exp: i64) -> Value {
    if exp < 0 {
        return Value::Double((base as f64).powf(exp as f64));
    }
    let (mut acc, mut base, mut exp) = (1i64, base, exp as u64);
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    Value::Integer(acc)
}

/// Shift amounts of 64 or more produce 0 for every shift, including an
/// arithmetic shift of a negative number.
fn shift(op: BinaryOp, value: i64, amount: i64) -> Result<i64, BasicError> {
    if amount < 0 {
        return Err(BasicError::NegativeShift { op: op.symbol(), amount });
    }
    if amount >= 64 {
        return Ok(0);
    }
    Ok(match op {
        BinaryOp::Shl => value << amount,
        BinaryOp::Asr => value >> amount,
        _ => ((value as u64) >> amount) as i64,
    })
}

/// Pairs of containers already under comparison. Meeting a pair again
/// means the containers are cyclic; the revisit is treated as equal so the
/// remaining elements decide.
type Visited = FxHashSet<(usize, usize)>;

/// Headroom kept free before comparing nested containers.
const RED_ZONE: usize = 64 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Total equality: mismatched types are simply unequal.
pub fn equals(left: &Value, right: &Value) -> Result<bool, BasicError> {
    equals_in(left, right, &mut Visited::default())
}

fn equals_in(left: &Value, right: &Value, visited: &mut Visited) -> Result<bool, BasicError> {
    let l = left.resolve()?;
    let r = right.resolve()?;
    let eq = match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Integer(a), Value::Double(b)) => (*a as f64) == *b,
        (Value::Double(a), Value::Integer(b)) => *a == (*b as f64),
        (Value::Double(a), Value::Double(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            if !visited.insert((a.addr(), b.addr())) {
                return Ok(true);
            }
            let (a, b) = (a.snapshot(), b.snapshot());
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(&b) {
                if !stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || equals_in(x, y, visited))? {
                    return Ok(false);
                }
            }
            true
        }
        (Value::Object(a), Value::Object(b)) => {
            if !visited.insert((a.addr(), b.addr())) {
                return Ok(true);
            }
            let (a, b) = (a.snapshot(), b.snapshot());
            if a.len() != b.len() {
                return Ok(false);
            }
            for ((ka, va), (kb, vb)) in a.iter().zip(&b) {
                if ka != kb || !stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || equals_in(va, vb, visited))? {
                    return Ok(false);
                }
            }
            true
        }
        (Value::Scope(a), Value::Scope(b)) => a.ptr_eq(b),
        (Value::Function(a), Value::Function(b)) => std::rc::Rc::ptr_eq(a, b),
        _ => false,
    };
    Ok(eq)
}

/// Ordering for `<`, `>`, `<=`, `>=`. `None` means unordered (a NaN was
/// involved); incompatible types are an error naming `op`.
pub fn order(op: BinaryOp, left: &Value, right: &Value) -> Result<Option<Ordering>, BasicError> {
    order_in(op, left, right, &mut Visited::default())
}

fn order_in(op: BinaryOp, left: &Value, right: &Value, visited: &mut Visited) -> Result<Option<Ordering>, BasicError> {
    let l = left.resolve()?;
    let r = right.resolve()?;
    match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Some(a.cmp(b))),
        (Value::Integer(a), Value::Double(b)) => Ok((*a as f64).partial_cmp(b)),
        (Value::Double(a), Value::Integer(b)) => Ok(a.partial_cmp(&(*b as f64))),
        (Value::Double(a), Value::Double(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.as_bytes().cmp(b.as_bytes()))),
        (Value::Array(a), Value::Array(b)) => {
            if !visited.insert((a.addr(), b.addr())) {
                return Ok(Some(Ordering::Equal));
            }
            let (a, b) = (a.snapshot(), b.snapshot());
            for (x, y) in a.iter().zip(&b) {
                match stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || order_in(op, x, y, visited))? {
                    Some(Ordering::Equal) => continue,
                    decided => return Ok(decided),
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(BasicError::UnsupportedOperands {
            op: op.symbol(),
            left: l.type_name(),
            right: r.type_name(),
        }),
    }
}
