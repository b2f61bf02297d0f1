//! Lexical scope chain.
//!
//! A scope is an object with an optional parent. Reads fall through to
//! ancestors; an assignment to a name an ancestor already holds updates the
//! ancestor and also caches the value locally. New names only ever land in
//! the scope being written.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::Value;
use crate::error::BasicError;
use crate::interpreter::builtins;

#[derive(Clone)]
pub struct Scope(Rc<ScopeData>);

struct ScopeData {
    vars: RefCell<BTreeMap<String, Value>>,
    parent: Option<Scope>,
    root: Option<Scope>,
}

impl Scope {
    /// A root scope holding the built-in functions.
    pub fn new() -> Self {
        let scope = Scope::empty();
        {
            let mut vars = scope.0.vars.borrow_mut();
            for builtin in builtins::REGISTRY {
                vars.insert(builtin.name.to_string(), builtin.to_value());
            }
        }
        scope
    }

    /// A root scope with no built-ins at all.
    pub fn empty() -> Self {
        Scope(Rc::new(ScopeData {
            vars: RefCell::new(BTreeMap::new()),
            parent: None,
            root: None,
        }))
    }

    /// A root scope pre-seeded with host variables. Host entries shadow
    /// built-ins of the same name.
    pub fn with_values<K: Into<String>>(values: impl IntoIterator<Item = (K, Value)>) -> Self {
        let scope = Scope::new();
        for (key, value) in values {
            scope.define(key, value);
        }
        scope
    }

    /// A child of `parent`, with `UPSCOPE` and `GLOBAL` bound.
    pub fn with_parent(parent: &Scope) -> Self {
        let root = parent.root();
        let scope = Scope(Rc::new(ScopeData {
            vars: RefCell::new(BTreeMap::new()),
            parent: Some(parent.clone()),
            root: Some(root.clone()),
        }));
        scope.define("UPSCOPE", Value::Scope(parent.clone()));
        scope.define("GLOBAL", Value::Scope(root));
        scope
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0.parent.clone()
    }

    /// The outermost ancestor, or this scope if it has no parent.
    pub fn root(&self) -> Scope {
        match &self.0.root {
            Some(root) => root.clone(),
            None => self.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Result<Value, BasicError> {
        if let Some(value) = self.0.vars.borrow().get(key) {
            return Ok(value.clone());
        }
        match &self.0.parent {
            Some(parent) => parent.get(key),
            None => Err(BasicError::UnknownSymbol { key: key.to_string() }),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(parent) = &self.0.parent {
            if parent.has(&key) {
                parent.set(key.clone(), value.clone());
            }
        }
        self.0.vars.borrow_mut().insert(key, value);
    }

    /// Bind `key` in this scope only, ignoring ancestors.
    pub fn define(&self, key: impl Into<String>, value: Value) {
        self.0.vars.borrow_mut().insert(key.into(), value);
    }

    pub fn has(&self, key: &str) -> bool {
        self.has_local(key) || self.0.parent.as_ref().is_some_and(|p| p.has(key))
    }

    pub fn has_local(&self, key: &str) -> bool {
        self.0.vars.borrow().contains_key(key)
    }

    /// Number of locally bound names.
    pub fn len(&self) -> usize {
        self.0.vars.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.vars.borrow().is_empty()
    }

    pub fn local_entries(&self) -> Vec<(String, Value)> {
        self.0.vars.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_builtins() {
        let root = Scope::new();
        for name in ["CEIL", "EVAL", "FLOOR", "FOR", "FOREACH", "FUNCTION", "IF", "LEN", "PRINT", "ROUND", "SQRT", "WHILE"] {
            assert!(root.has_local(name), "missing {name}");
        }
        assert!(root.parent().is_none());
        assert!(!root.has("UPSCOPE"));
    }

    #[test]
    fn child_links() {
        let root = Scope::new();
        let mid = Scope::with_parent(&root);
        let leaf = Scope::with_parent(&mid);
        match (leaf.get("UPSCOPE").unwrap(), leaf.get("GLOBAL").unwrap()) {
            (Value::Scope(up), Value::Scope(global)) => {
                assert!(up.ptr_eq(&mid));
                assert!(global.ptr_eq(&root));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(leaf.root().ptr_eq(&root));
    }

    #[test]
    fn lookup_falls_through() {
        let root = Scope::empty();
        root.set("x", Value::from(1));
        let child = Scope::with_parent(&root);
        assert_eq!(child.get("x").unwrap(), Value::from(1));
        assert_eq!(child.get("y").unwrap_err().to_string(), "y is not a valid symbol");
    }

    #[test]
    fn set_propagates_to_ancestor_and_caches() {
        let root = Scope::empty();
        root.set("x", Value::from(1));
        let child = Scope::with_parent(&root);
        child.set("x", Value::from(2));
        assert_eq!(root.get("x").unwrap(), Value::from(2));
        assert!(child.has_local("x"));
    }

    #[test]
    fn new_names_stay_local() {
        let root = Scope::empty();
        let child = Scope::with_parent(&root);
        child.set("fresh", Value::from(1));
        assert!(!root.has("fresh"));
        assert!(child.has("fresh"));
    }

    #[test]
    fn define_ignores_ancestors() {
        let root = Scope::empty();
        root.set("ARG", Value::from(1));
        let child = Scope::with_parent(&root);
        child.define("ARG", Value::from(2));
        assert_eq!(root.get("ARG").unwrap(), Value::from(1));
        assert_eq!(child.get("ARG").unwrap(), Value::from(2));
    }

    #[test]
    fn with_values_seeds_root() {
        let scope = Scope::with_values([("x", Value::from(5))]);
        assert_eq!(scope.get("x").unwrap(), Value::from(5));
        assert!(scope.has("PRINT"));
    }
}
