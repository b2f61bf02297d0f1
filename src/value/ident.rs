use super::Value;
use crate::error::BasicError;

/// An assignable location: a container plus the key inside it.
///
/// Arrays are indexed by the key's integer value, objects and scopes by its
/// string value. Nothing is looked up until `get` or `set` is called.
#[derive(Clone)]
pub struct Ident {
    container: Value,
    key: Value,
}

impl Ident {
    pub fn new(container: Value, key: Value) -> Self {
        Ident { container, key }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn get(&self) -> Result<Value, BasicError> {
        match &self.container {
            Value::Array(a) => a.get(self.key.as_index()?),
            Value::Object(o) => o.get(&self.key.as_key()?),
            Value::Scope(s) => s.get(&self.key.as_key()?),
            other => Err(BasicError::NotAContainer { access: "get", ty: other.type_name() }),
        }
    }

    /// Store `value`, dereferenced, at this location.
    pub fn set(&self, value: Value) -> Result<(), BasicError> {
        let value = value.into_resolved()?;
        match &self.container {
            Value::Array(a) => a.set(self.key.as_index()?, value),
            Value::Object(o) => {
                o.set(self.key.as_key()?, value);
                Ok(())
            }
            Value::Scope(s) => {
                s.set(self.key.as_key()?, value);
                Ok(())
            }
            other => Err(BasicError::NotAContainer { access: "set", ty: other.type_name() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scope;

    #[test]
    fn array_slot() {
        let arr = Value::array([Value::from(10), Value::from(20)]);
        let ident = Ident::new(arr.clone(), Value::from(1.7));
        assert_eq!(ident.get().unwrap(), Value::from(20));
        ident.set(Value::from(21)).unwrap();
        assert_eq!(arr, Value::array([Value::from(10), Value::from(21)]));
    }

    #[test]
    fn array_append_slot() {
        let arr = Value::array([]);
        Ident::new(arr.clone(), Value::from(0)).set(Value::from("x")).unwrap();
        assert_eq!(arr, Value::array([Value::from("x")]));
    }

    #[test]
    fn object_slot_with_numeric_key() {
        let obj = Value::object::<&str>([]);
        Ident::new(obj.clone(), Value::from(3)).set(Value::from(1)).unwrap();
        assert_eq!(obj, Value::object([("3", Value::from(1))]));
    }

    #[test]
    fn scope_slot() {
        let scope = Scope::empty();
        let ident = Ident::new(Value::Scope(scope.clone()), Value::from("v"));
        assert_eq!(ident.get().unwrap_err().to_string(), "v is not a valid symbol");
        ident.set(Value::from(1)).unwrap();
        assert_eq!(scope.get("v").unwrap(), Value::from(1));
    }

    #[test]
    fn scalar_container_rejected() {
        let ident = Ident::new(Value::from(1), Value::from("k"));
        assert_eq!(ident.get().unwrap_err().to_string(), "Invalid identifier get type: INTEGER");
        assert_eq!(ident.set(Value::from(1)).unwrap_err().to_string(), "Invalid identifier set type: INTEGER");
    }

    #[test]
    fn bad_key_type() {
        let obj = Value::object::<&str>([]);
        let err = Ident::new(obj, Value::array([])).get().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported operation `svalue()`: ARRAY");
    }
}
