//! Chained lexical scopes.
//!
//! Each [`Environment`] holds its own bindings and an optional parent. Scopes
//! are shared through [`EnvRef`] so a closure can keep its defining scope
//! alive after the call that created it has returned.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use zen_types::{ErrorKind, Result, Span, ZenError};

use crate::value::Value;

/// Shared handle to a scope.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope.
///
/// `define` always writes to this scope. `get` and `assign` walk the parent
/// chain from innermost to outermost.
#[derive(Default)]
pub struct Environment {
    parent: Option<EnvRef>,
    bindings: IndexMap<String, Value>,
}

impl Environment {
    /// Create a top-level scope with no parent.
    pub fn root() -> EnvRef {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Create a child scope of `parent`.
    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self {
            parent: Some(Rc::clone(parent)),
            bindings: IndexMap::new(),
        }))
    }

    /// Create or overwrite a binding in this scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Look up a binding in this scope only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bindings of this scope in definition order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn parent(&self) -> Option<EnvRef> {
        self.parent.clone()
    }

    /// Search `env` and then each parent for `name`.
    pub fn lookup(env: &EnvRef, name: &str) -> Option<Value> {
        let mut current = Rc::clone(env);
        loop {
            let next = {
                let scope = current.borrow();
                if let Some(value) = scope.bindings.get(name) {
                    return Some(value.clone());
                }
                scope.parent.clone()?
            };
            current = next;
        }
    }

    /// Like [`Environment::lookup`], failing with `NameError` when the chain
    /// is exhausted.
    pub fn get(env: &EnvRef, name: &str, span: Span) -> Result<Value> {
        Self::lookup(env, name).ok_or_else(|| undefined(name, span))
    }

    /// Rebind `name` in the innermost scope that already holds it.
    ///
    /// Returns the value back when no scope in the chain binds `name`.
    pub fn assign_existing(env: &EnvRef, name: &str, value: Value) -> std::result::Result<(), Value> {
        let mut current = Rc::clone(env);
        loop {
            let next = {
                let mut scope = current.borrow_mut();
                if let Some(slot) = scope.bindings.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
                match scope.parent.clone() {
                    Some(parent) => parent,
                    None => return Err(value),
                }
            };
            current = next;
        }
    }

    /// Rebind an existing name anywhere in the chain, failing with
    /// `NameError` if it is undefined.
    pub fn assign(env: &EnvRef, name: &str, value: Value, span: Span) -> Result<()> {
        Self::assign_existing(env, name, value).map_err(|_| undefined(name, span))
    }
}

fn undefined(name: &str, span: Span) -> ZenError {
    ZenError::at(
        ErrorKind::NameError,
        format!("undefined variable '{name}'"),
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::point(1, 1)
    }

    #[test]
    fn test_define_and_get() {
        let env = Environment::root();
        env.borrow_mut().define("x", Value::Integer(1));
        assert_eq!(Environment::get(&env, "x", span()).unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_get_undefined_is_name_error() {
        let env = Environment::root();
        let err = Environment::get(&env, "missing", span()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameError);
        assert_eq!(err.message, "undefined variable 'missing'");
    }

    #[test]
    fn test_child_sees_parent_and_shadows() {
        let root = Environment::root();
        root.borrow_mut().define("x", Value::Integer(1));
        root.borrow_mut().define("y", Value::Integer(2));
        let child = Environment::child(&root);
        child.borrow_mut().define("x", Value::Integer(10));

        assert_eq!(Environment::lookup(&child, "x"), Some(Value::Integer(10)));
        assert_eq!(Environment::lookup(&child, "y"), Some(Value::Integer(2)));
        assert_eq!(Environment::lookup(&root, "x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_assign_rebinds_in_defining_scope() {
        let root = Environment::root();
        root.borrow_mut().define("count", Value::Integer(0));
        let inner = Environment::child(&Environment::child(&root));

        Environment::assign(&inner, "count", Value::Integer(5), span()).unwrap();
        assert_eq!(root.borrow().get_local("count"), Some(Value::Integer(5)));
        assert!(!inner.borrow().contains_local("count"));
    }

    #[test]
    fn test_assign_undefined_is_name_error() {
        let env = Environment::child(&Environment::root());
        let err = Environment::assign(&env, "nope", Value::Nil, span()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameError);
        assert!(env.borrow().is_empty());
    }

    #[test]
    fn test_bindings_keep_definition_order() {
        let env = Environment::root();
        for name in ["b", "a", "c"] {
            env.borrow_mut().define(name, Value::Nil);
        }
        let scope = env.borrow();
        let names: Vec<&str> = scope.bindings().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
