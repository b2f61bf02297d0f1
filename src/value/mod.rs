//! Runtime values.
//!
//! Scalars are held inline; arrays, objects and scopes are shared handles,
//! so mutation through one alias is visible through every other.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::BasicError;

pub mod codec;
pub mod function;
pub mod ident;
pub mod ops;
pub mod scope;

pub use function::Function;
pub use ident::Ident;
pub use scope::Scope;

#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Double(f64),
    String(String),
    Array(Array),
    Object(Object),
    Scope(Scope),
    Function(Rc<Function>),
    Ident(Rc<Ident>),
}

impl Value {
    pub fn integer(v: i64) -> Value {
        Value::Integer(v)
    }

    pub fn double(v: f64) -> Value {
        Value::Double(v)
    }

    pub fn string(v: impl Into<String>) -> Value {
        Value::String(v.into())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(Array::new(items.into_iter().collect()))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Object(Object::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()))
    }

    pub fn bool(v: bool) -> Value {
        Value::Integer(v as i64)
    }

    /// Type name as shown in error messages. An ident reports the type of
    /// whatever it currently refers to.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Double(_) => "DOUBLE",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Object(_) | Value::Scope(_) => "OBJECT",
            Value::Function(_) => "FUNCTION",
            Value::Ident(ident) => match ident.get() {
                Ok(v) => v.type_name(),
                Err(_) => "IDENT",
            },
        }
    }

    /// Dereference an ident; any other value is returned as is.
    pub fn resolve(&self) -> Result<Value, BasicError> {
        match self {
            Value::Ident(ident) => ident.get(),
            other => Ok(other.clone()),
        }
    }

    pub fn into_resolved(self) -> Result<Value, BasicError> {
        match self {
            Value::Ident(ident) => ident.get(),
            other => Ok(other),
        }
    }

    pub fn is_truthy(&self) -> Result<bool, BasicError> {
        Ok(match self.resolve()? {
            Value::Integer(v) => v != 0,
            Value::Double(v) => v != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Scope(s) => !s.is_empty(),
            Value::Function(_) => true,
            Value::Ident(_) => true,
        })
    }

    /// Canonical encoding: literal syntax for scalars, pretty-printed
    /// layout for containers.
    pub fn encoded(&self) -> Result<String, BasicError> {
        Ok(match self.resolve()? {
            Value::Integer(v) => codec::encode_integer(v),
            Value::Double(v) => codec::encode_double(v),
            Value::String(s) => codec::encode_string(&s),
            Value::Array(a) => codec::encode_array(&a)?,
            Value::Object(o) => codec::encode_object(&o.borrow(), None)?,
            Value::Scope(s) => codec::encode_scope(&s)?,
            Value::Function(_) | Value::Ident(_) => "<Function>".to_string(),
        })
    }

    /// Native textual form, used by `PRINT` and string concatenation.
    /// Strings are raw; everything else is its encoding.
    pub fn text(&self) -> Result<String, BasicError> {
        match self.resolve()? {
            Value::String(s) => Ok(s),
            other => other.encoded(),
        }
    }

    /// Integer view used for array indexing; doubles truncate.
    pub fn as_index(&self) -> Result<i64, BasicError> {
        match self.resolve()? {
            Value::Integer(v) => Ok(v),
            Value::Double(v) => Ok(v as i64),
            other => Err(BasicError::UnsupportedOperation { op: "ivalue", ty: other.type_name() }),
        }
    }

    /// String view used for object keys.
    pub fn as_key(&self) -> Result<String, BasicError> {
        match self.resolve()? {
            Value::String(s) => Ok(s),
            v @ (Value::Integer(_) | Value::Double(_)) => v.text(),
            other => Err(BasicError::UnsupportedOperation { op: "svalue", ty: other.type_name() }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "Integer({v})"),
            Value::Double(v) => write!(f, "Double({v})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(a) => f.debug_tuple("Array").field(&*a.borrow()).finish(),
            Value::Object(o) => f.debug_tuple("Object").field(&*o.borrow()).finish(),
            Value::Scope(_) => write!(f, "Scope(..)"),
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::Ident(ident) => write!(f, "Ident({:?})", ident.key()),
        }
    }
}

/// Structural equality using the language's `==` rules. Values that cannot
/// be dereferenced compare unequal.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        ops::equals(self, other).unwrap_or(false)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Ok(text) => f.write_str(&text),
            Err(e) => write!(f, "<{e}>"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::Array(Array::new(v))
    }
}

impl From<Scope> for Value {
    fn from(v: Scope) -> Value {
        Value::Scope(v)
    }
}

/// Shared, growable sequence.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    /// Copy of the current elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn get(&self, index: i64) -> Result<Value, BasicError> {
        let items = self.0.borrow();
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or(BasicError::IndexOutOfRange { index, len: items.len() })
    }

    /// Overwrite `index`, or append when `index == len`.
    pub fn set(&self, index: i64, value: Value) -> Result<(), BasicError> {
        let mut items = self.0.borrow_mut();
        let len = items.len();
        match usize::try_from(index) {
            Ok(i) if i < len => items[i] = value,
            Ok(i) if i == len => items.push(value),
            _ => return Err(BasicError::InsertOutOfRange { index, len }),
        }
        Ok(())
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// Shared string-keyed map, enumerated in key order.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<BTreeMap<String, Value>>>);

impl Object {
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Object(Rc::new(RefCell::new(entries)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn borrow(&self) -> Ref<'_, BTreeMap<String, Value>> {
        self.0.borrow()
    }

    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.0.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<Value, BasicError> {
        self.0
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| BasicError::UnknownSymbol { key: key.to_string() })
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(Value::from(1).type_name(), "INTEGER");
        assert_eq!(Value::from(1.5).type_name(), "DOUBLE");
        assert_eq!(Value::from("x").type_name(), "STRING");
        assert_eq!(Value::array([]).type_name(), "ARRAY");
        assert_eq!(Value::object::<&str>([]).type_name(), "OBJECT");
        assert_eq!(Value::Scope(Scope::new()).type_name(), "OBJECT");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::from(0).is_truthy().unwrap());
        assert!(Value::from(-3).is_truthy().unwrap());
        assert!(!Value::from(0.0).is_truthy().unwrap());
        assert!(Value::from(f64::NAN).is_truthy().unwrap());
        assert!(!Value::from("").is_truthy().unwrap());
        assert!(Value::from("x").is_truthy().unwrap());
        assert!(!Value::array([]).is_truthy().unwrap());
        assert!(Value::array([Value::from(0)]).is_truthy().unwrap());
        assert!(!Value::object::<&str>([]).is_truthy().unwrap());
    }

    #[test]
    fn arrays_alias() {
        let a = Array::new(vec![Value::from(1)]);
        let b = a.clone();
        b.push(Value::from(2));
        assert_eq!(a.len(), 2);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn array_set_bounds() {
        let a = Array::new(vec![Value::from(1)]);
        a.set(0, Value::from(5)).unwrap();
        a.set(1, Value::from(6)).unwrap();
        assert_eq!(a.snapshot(), vec![Value::from(5), Value::from(6)]);
        assert_eq!(
            a.set(3, Value::from(7)).unwrap_err(),
            BasicError::InsertOutOfRange { index: 3, len: 2 }
        );
        assert_eq!(
            a.set(-1, Value::from(7)).unwrap_err().to_string(),
            "Array index `-1` out of range, expected <= 2"
        );
    }

    #[test]
    fn array_get_bounds() {
        let a = Array::new(vec![Value::from(1)]);
        assert_eq!(a.get(0).unwrap(), Value::from(1));
        assert_eq!(a.get(1).unwrap_err().to_string(), "Array index `1` out of range, expected < 1");
        assert!(a.get(-1).is_err());
    }

    #[test]
    fn object_missing_key() {
        let o = Object::default();
        assert_eq!(o.get("nope").unwrap_err().to_string(), "nope is not a valid symbol");
        o.set("k", Value::from(1));
        assert!(o.has("k"));
    }

    #[test]
    fn native_text() {
        assert_eq!(Value::from(42).text().unwrap(), "42");
        assert_eq!(Value::from(2.5).text().unwrap(), "2.5");
        assert_eq!(Value::from("a\"b").text().unwrap(), "a\"b");
        assert_eq!(Value::array([Value::from(1)]).text().unwrap(), "[\n  1\n]");
    }

    #[test]
    fn key_coercions() {
        assert_eq!(Value::from(3.9).as_index().unwrap(), 3);
        assert_eq!(Value::from(7).as_key().unwrap(), "7");
        assert_eq!(Value::from(1.5).as_key().unwrap(), "1.5");
        assert!(Value::array([]).as_key().is_err());
    }

    #[test]
    fn display_uses_text() {
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(1.0).to_string(), "1.0");
    }
}
