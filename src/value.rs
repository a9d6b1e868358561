use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BinOp, UnOp};
use crate::error::EvalError;

/// A dynamic value used throughout the sift query language.
///
/// This type represents the closed set of JSON-like variants a query can
/// produce, with a distinction between integers and doubles.
///
/// # Sharing and copies
///
/// `List` and `Dict` are reference-counted: a plain `clone()` is shallow and
/// shares the underlying storage, which is what makes *referencable*
/// environment bindings genuinely alias caller-visible data. Use
/// [`Value::deep_clone`] to break that aliasing. Because of the `Rc`
/// backing, `Value` is deliberately not `Send`, so a referencable binding can
/// never leak across concurrently evaluated queries.
///
/// # Examples
///
/// ```
/// use sift_lang::Value;
///
/// let n = Value::Int(42);
/// let xs = Value::list(vec![Value::Int(1), Value::Double(2.5)]);
/// assert_eq!(xs.type_name(), "list");
/// assert_eq!(n, Value::Int(42));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Nil,

    /// Boolean (true/false)
    Bool(bool),

    /// Integer number (preserved separately from doubles)
    Int(i64),

    /// Floating-point number
    Double(f64),

    /// UTF-8 string
    String(String),

    /// Ordered sequence of values, shared storage
    List(Rc<RefCell<Vec<Value>>>),

    /// String-keyed mapping, shared storage
    Dict(Rc<RefCell<HashMap<String, Value>>>),
}

impl Value {
    /// Build a list value from owned elements.
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Build a dict value from an owned map.
    pub fn dict(entries: HashMap<String, Value>) -> Value {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    /// Human-readable variant name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    /// Numeric view of the value, promoting integers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Recursive copy that breaks all sharing with the original.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::List(items) => {
                Value::list(items.borrow().iter().map(Value::deep_clone).collect())
            }
            Value::Dict(entries) => Value::dict(
                entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Applies a binary operator to `self` and `other`.
    ///
    /// Arithmetic is defined only between numeric pairs: `int op int` stays
    /// `int` for `+ - *`, any `double` operand promotes the result to
    /// `double`, and `/` always yields `double`. Comparisons follow the same
    /// promotion and yield `bool`. Equality is defined for every pair:
    /// cross-variant operands are simply unequal, never an error. `and`/`or`
    /// require two booleans; short-circuiting is the evaluator's concern,
    /// not this function's.
    pub fn binary(&self, op: BinOp, other: &Value) -> Result<Value, EvalError> {
        match op {
            BinOp::Add => match (self, other) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                (Value::Int(a), Value::Double(b)) => Ok(Value::Double(*a as f64 + b)),
                (Value::Double(a), Value::Int(b)) => Ok(Value::Double(a + *b as f64)),
                (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a + b)),
                (a, b) => Err(EvalError::Type(format!(
                    "cannot add {} and {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
            BinOp::Subtract => match (self, other) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
                (Value::Int(a), Value::Double(b)) => Ok(Value::Double(*a as f64 - b)),
                (Value::Double(a), Value::Int(b)) => Ok(Value::Double(a - *b as f64)),
                (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a - b)),
                (a, b) => Err(EvalError::Type(format!(
                    "cannot subtract {} from {}",
                    b.type_name(),
                    a.type_name()
                ))),
            },
            BinOp::Multiply => match (self, other) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
                (Value::Int(a), Value::Double(b)) => Ok(Value::Double(*a as f64 * b)),
                (Value::Double(a), Value::Int(b)) => Ok(Value::Double(a * *b as f64)),
                (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a * b)),
                (a, b) => Err(EvalError::Type(format!(
                    "cannot multiply {} by {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
            BinOp::Divide => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => Ok(Value::Double(a / b)),
                _ => Err(EvalError::Type(format!(
                    "cannot divide {} by {}",
                    self.type_name(),
                    other.type_name()
                ))),
            },
            BinOp::Equal => Ok(Value::Bool(self == other)),
            BinOp::NotEqual => Ok(Value::Bool(self != other)),
            BinOp::LessThan => self.compare_numeric(op, other, |ord| ord == Ordering::Less),
            BinOp::LessEqual => self.compare_numeric(op, other, |ord| ord != Ordering::Greater),
            BinOp::GreaterThan => self.compare_numeric(op, other, |ord| ord == Ordering::Greater),
            BinOp::GreaterEqual => self.compare_numeric(op, other, |ord| ord != Ordering::Less),
            BinOp::And => match (self, other) {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a && *b)),
                (a, b) => Err(EvalError::Type(format!(
                    "'and' requires two booleans, got {} and {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
            BinOp::Or => match (self, other) {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
                (a, b) => Err(EvalError::Type(format!(
                    "'or' requires two booleans, got {} and {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
        }
    }

    /// Applies a unary operator.
    pub fn unary(&self, op: UnOp) -> Result<Value, EvalError> {
        match op {
            UnOp::Not => match self {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(EvalError::Type(format!(
                    "'~' requires a boolean, got {}",
                    other.type_name()
                ))),
            },
        }
    }

    fn compare_numeric(
        &self,
        op: BinOp,
        other: &Value,
        accept: impl Fn(Ordering) -> bool,
    ) -> Result<Value, EvalError> {
        let ordering = match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Double(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Double(a), Value::Int(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (a, b) => {
                return Err(EvalError::Type(format!(
                    "cannot compare {} {} {} (comparison requires numeric types)",
                    a.type_name(),
                    op.symbol(),
                    b.type_name()
                )));
            }
        };
        Ok(Value::Bool(accept(ordering)))
    }

    /// Total ordering used for sorting rows by key.
    ///
    /// Numbers compare by promoted value, strings and booleans by their
    /// natural order; values of unrelated variants compare equal so that a
    /// mixed list sorts stably rather than erroring.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Int(a), Value::Double(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Double(a), Value::Int(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}
