//! Typed operator signatures.
//!
//! A signature declares, per operator: its *static* parameters (evaluated
//! once per query, in the caller's scope), its *context* parameters
//! (re-evaluated once per input row with `@` bound to the row), and the
//! shape every input element must have. Signatures are attached to
//! operator definitions at registration time and never change afterwards.

use crate::value::Value;

/// Expected type of a parameter value or input element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    /// Any value
    #[default]
    Any,
    /// Boolean only
    Bool,
    /// Integer only
    Int,
    /// Double only
    Double,
    /// Integer or double
    Number,
    /// String only
    String,
    /// List only
    List,
    /// Dict only
    Dict,
}

impl ParamType {
    /// Name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Double => "double",
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::List => "list",
            ParamType::Dict => "dict",
        }
    }

    /// Whether `value` satisfies this type.
    pub fn admits(self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Bool => matches!(value, Value::Bool(_)),
            ParamType::Int => matches!(value, Value::Int(_)),
            ParamType::Double => matches!(value, Value::Double(_)),
            ParamType::Number => matches!(value, Value::Int(_) | Value::Double(_)),
            ParamType::String => matches!(value, Value::String(_)),
            ParamType::List => matches!(value, Value::List(_)),
            ParamType::Dict => matches!(value, Value::Dict(_)),
        }
    }
}

/// One declared parameter of an operator.
///
/// Defaults are stored as JSON literals rather than [`Value`]s because the
/// registry holding them is shared across evaluation threads, while
/// `Value` intentionally is not `Send`.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Kwarg name at the call site
    pub name: &'static str,
    /// Type the evaluated kwarg must satisfy
    pub ty: ParamType,
    /// Whether an absent kwarg is an error
    pub required: bool,
    /// Fallback literal for an absent optional kwarg
    pub default: Option<serde_json::Value>,
}

impl ParamSpec {
    /// A parameter that must be supplied at the call site.
    pub fn required(name: &'static str, ty: ParamType) -> ParamSpec {
        ParamSpec {
            name,
            ty,
            required: true,
            default: None,
        }
    }

    /// An optional parameter falling back to `default` when absent.
    pub fn optional(name: &'static str, ty: ParamType, default: serde_json::Value) -> ParamSpec {
        ParamSpec {
            name,
            ty,
            required: false,
            default: Some(default),
        }
    }

    /// An optional parameter that evaluates to `Nil` when absent.
    pub fn optional_nil(name: &'static str, ty: ParamType) -> ParamSpec {
        ParamSpec {
            name,
            ty,
            required: false,
            default: None,
        }
    }
}

/// The full declared interface of one operator.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    /// Parameters evaluated once per query invocation
    pub static_params: Vec<ParamSpec>,
    /// Parameters re-evaluated once per input row
    pub context_params: Vec<ParamSpec>,
    /// Shape every input element must have
    pub input: ParamType,
}

impl Signature {
    /// An empty signature accepting any input shape.
    pub fn new() -> Signature {
        Signature::default()
    }

    /// Adds a static parameter.
    pub fn with_static(mut self, param: ParamSpec) -> Signature {
        self.static_params.push(param);
        self
    }

    /// Adds a context parameter.
    pub fn with_context(mut self, param: ParamSpec) -> Signature {
        self.context_params.push(param);
        self
    }

    /// Constrains the input element shape.
    pub fn with_input(mut self, input: ParamType) -> Signature {
        self.input = input;
        self
    }
}
