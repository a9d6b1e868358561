//! The operator extension contract.
//!
//! Operators are the language's only extension mechanism: named,
//! namespaced row-stream transformations registered into a catalog and
//! invoked through [`Expr::OpCall`](crate::ast::Expr::OpCall) /
//! [`Expr::FnCall`](crate::ast::Expr::FnCall). An operator implementation
//! receives its once-per-query static kwargs, an on-demand iterator of
//! `(row, per-row kwargs)` pairs, and an output sink it fully controls:
//! it may drop rows, duplicate them, or append synthetic trailing values.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EvalError;
use crate::signature::Signature;
use crate::value::Value;

/// A named bag of evaluated operator arguments.
#[derive(Debug, Default)]
pub struct Kwargs {
    entries: HashMap<String, Value>,
}

impl Kwargs {
    /// An empty bag.
    pub fn new() -> Kwargs {
        Kwargs::default()
    }

    /// Inserts an argument, replacing any previous value for the name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// The argument, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// The argument, or a missing-argument error.
    pub fn require(&self, name: &str) -> Result<&Value, EvalError> {
        self.entries
            .get(name)
            .ok_or_else(|| EvalError::MissingArgument(name.to_string()))
    }

    /// The argument as a boolean.
    pub fn get_bool(&self, name: &str) -> Result<bool, EvalError> {
        match self.require(name)? {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::ArgumentType {
                name: name.to_string(),
                expected: "bool",
                actual: other.type_name(),
            }),
        }
    }

    /// The argument as an integer.
    pub fn get_int(&self, name: &str) -> Result<i64, EvalError> {
        match self.require(name)? {
            Value::Int(n) => Ok(*n),
            other => Err(EvalError::ArgumentType {
                name: name.to_string(),
                expected: "int",
                actual: other.type_name(),
            }),
        }
    }

    /// The argument as a string slice.
    pub fn get_str(&self, name: &str) -> Result<&str, EvalError> {
        match self.require(name)? {
            Value::String(s) => Ok(s),
            other => Err(EvalError::ArgumentType {
                name: name.to_string(),
                expected: "string",
                actual: other.type_name(),
            }),
        }
    }

    /// Number of arguments in the bag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the arguments in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Opaque, caller-supplied dependencies handed to every operator factory.
///
/// The core never inspects the contents; it threads the bag unchanged from
/// the top-level entry point into each factory. Typical entries are
/// storage handles and clocks.
#[derive(Default)]
pub struct BootArgs {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl BootArgs {
    /// An empty bag.
    pub fn new() -> BootArgs {
        BootArgs::default()
    }

    /// Inserts a dependency under `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.entries.insert(name.into(), value);
    }

    /// Fetches a dependency, downcast to its concrete type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .get(name)
            .and_then(|entry| Arc::clone(entry).downcast::<T>().ok())
    }
}

/// One input row paired with its evaluated context kwargs.
#[derive(Debug)]
pub struct ContextRow {
    /// The row itself (also bound to `@` while the kwargs evaluated)
    pub row: Value,
    /// The declared context parameters, evaluated against this row
    pub args: Kwargs,
}

/// On-demand stream of context rows driven by the operator.
///
/// Pulling the next pair evaluates that row's context kwargs; an operator
/// that stops pulling early never pays for the rows it skipped.
pub type RowStream<'a> = dyn Iterator<Item = Result<ContextRow, EvalError>> + 'a;

/// A row-stream transformation instance.
///
/// Exactly one instance exists per occurrence of the call in the tree, so
/// implementations may hold per-invocation mutable state (a running
/// counter, a sort buffer) without cross-talk between two uses of the same
/// operator in one query.
pub trait Operator {
    /// Consumes the input stream and appends zero or more output values.
    fn apply(
        &mut self,
        args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError>;
}

/// Factory producing a fresh operator instance for one call occurrence.
///
/// Receives the query's top-level argument dictionary and the opaque
/// bootargs.
pub type Factory = Box<dyn Fn(&Kwargs, &BootArgs) -> Box<dyn Operator> + Send + Sync>;

/// A registrable operator: identity, signature, and instance factory.
pub struct OperatorDef {
    /// Registry namespace, e.g. `"rows"`
    pub namespace: &'static str,
    /// Operator name within the namespace
    pub name: &'static str,
    /// Declared parameters and input shape
    pub signature: Signature,
    /// Per-invocation instance factory
    pub factory: Factory,
}

impl OperatorDef {
    /// Bundles an operator for registration.
    pub fn new(
        namespace: &'static str,
        name: &'static str,
        signature: Signature,
        factory: impl Fn(&Kwargs, &BootArgs) -> Box<dyn Operator> + Send + Sync + 'static,
    ) -> OperatorDef {
        OperatorDef {
            namespace,
            name,
            signature,
            factory: Box::new(factory),
        }
    }
}

impl std::fmt::Debug for OperatorDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OperatorDef({}/{})", self.namespace, self.name)
    }
}
