//! The process-wide operator catalog.
//!
//! Registration is an explicit, ordered step performed once at process
//! start: modules contribute their operators to a [`RegistryBuilder`],
//! which freezes into an immutable [`Registry`]. Lookups during
//! evaluation are lock-free; the registry is shared across evaluation
//! workers behind an `Arc` and never mutated again.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::builtin;
use crate::error::EvalError;
use crate::operator::OperatorDef;

fn key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Accumulates operator definitions before the catalog freezes.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    ops: HashMap<String, Arc<OperatorDef>>,
}

impl RegistryBuilder {
    /// An empty builder.
    pub fn new() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Adds an operator definition.
    ///
    /// Fails if `(namespace, name)` is already taken; registration must be
    /// completed before any evaluation that references the operator.
    pub fn register(&mut self, def: OperatorDef) -> Result<(), EvalError> {
        let key = key(def.namespace, def.name);
        if self.ops.contains_key(&key) {
            return Err(EvalError::DuplicateOperator {
                namespace: def.namespace.to_string(),
                name: def.name.to_string(),
            });
        }
        debug!("registered operator {}", key);
        self.ops.insert(key, Arc::new(def));
        Ok(())
    }

    /// Freezes the catalog.
    pub fn build(self) -> Registry {
        Registry { ops: self.ops }
    }
}

/// The immutable operator catalog used during evaluation.
#[derive(Debug)]
pub struct Registry {
    ops: HashMap<String, Arc<OperatorDef>>,
}

impl Registry {
    /// A catalog holding the standard operator library.
    pub fn with_builtins() -> Result<Registry, EvalError> {
        let mut builder = RegistryBuilder::new();
        builtin::install(&mut builder)?;
        Ok(builder.build())
    }

    /// Resolves `(namespace, name)` to its definition.
    pub fn resolve(&self, namespace: &str, name: &str) -> Result<Arc<OperatorDef>, EvalError> {
        self.ops
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| EvalError::UnknownOperator {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
