//! Lexical environment: a chain of variable scopes.
//!
//! Scopes stack up during evaluation: the root scope holds the query's
//! arguments, and child scopes cover the dynamic extent of per-element and
//! per-row evaluation contexts. A name resolves by walking from the
//! innermost scope outward.
//!
//! Bindings come in two kinds. A plain binding snapshots the value when
//! defined and hands out a deep copy on every lookup, so nobody can mutate
//! through it. A *referencable* binding aliases the live value both ways:
//! mutating the `Dict`/`List` it was defined with is visible on the next
//! lookup. That aliasing is the language's one deliberate escape from
//! copy-on-read semantics.

use std::collections::HashMap;

use crate::error::EvalError;
use crate::value::Value;

struct Binding {
    value: Value,
    referencable: bool,
}

#[derive(Default)]
struct Scope {
    bindings: HashMap<String, Binding>,
}

/// The scope chain one evaluator owns for the duration of one query.
pub struct Environment {
    // innermost scope last
    scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    /// Creates an environment holding only the root scope.
    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope::default()],
        }
    }

    /// Defines `name` in the current scope with copy semantics.
    ///
    /// The stored value is a snapshot: later mutation of the value the
    /// caller passed in is not observable through this binding. Fails if
    /// `name` already exists in the current scope; redefinition is a user
    /// error, never a silent overwrite.
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        self.insert(name, value.deep_clone(), false)
    }

    /// Defines `name` in the current scope as an alias of `value`.
    ///
    /// Lookup returns the live value; mutation through any alias is
    /// visible to every other one. Same redefinition rules as
    /// [`Environment::define`].
    pub fn define_referencable(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        self.insert(name, value, true)
    }

    /// Resolves `name` against the chain, innermost scope first.
    ///
    /// Plain bindings yield a deep copy; referencable bindings yield the
    /// live value.
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        for scope in self.scopes.iter().rev() {
            if let Some(binding) = scope.bindings.get(name) {
                return Ok(if binding.referencable {
                    binding.value.clone()
                } else {
                    binding.value.deep_clone()
                });
            }
        }
        Err(EvalError::UndefinedVariable(name.to_string()))
    }

    /// Opens a child scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Discards the innermost scope and every binding it holds.
    ///
    /// The root scope cannot be popped.
    pub fn pop_scope(&mut self) -> Result<(), EvalError> {
        if self.scopes.len() == 1 {
            return Err(EvalError::RootScopePop);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Number of scopes currently on the chain.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn insert(&mut self, name: &str, value: Value, referencable: bool) -> Result<(), EvalError> {
        let Some(scope) = self.scopes.last_mut() else {
            unreachable!("environment always holds the root scope")
        };
        if scope.bindings.contains_key(name) {
            return Err(EvalError::Redefinition(name.to_string()));
        }
        scope
            .bindings
            .insert(name.to_string(), Binding { value, referencable });
        Ok(())
    }
}
