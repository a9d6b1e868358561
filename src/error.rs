use thiserror::Error;

/// Errors that can occur while evaluating a query.
///
/// Every variant is recoverable at the call site: an error anywhere in a
/// subtree aborts evaluation of the whole query and is returned to the
/// caller. There is no partial result and no silent coercion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Malformed atom literal (e.g. `Atom(Int, "12x")`)
    #[error("invalid {kind} literal '{text}'")]
    InvalidLiteral { kind: &'static str, text: String },

    /// Wrong operand types for an operator or method
    #[error("type error: {0}")]
    Type(String),

    /// Reference to a name absent from the whole scope chain
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    /// `@` used outside a per-row evaluation context
    #[error("no current row is bound in this context")]
    NoCurrentRow,

    /// A name defined twice in the same scope
    #[error("variable '{0}' is already defined in this scope")]
    Redefinition(String),

    /// Statement name using the internal `__...__` marker
    #[error("name '{0}' is reserved for internal bindings")]
    ReservedName(String),

    /// Attempt to discard the root scope
    #[error("cannot pop the root scope")]
    RootScopePop,

    /// Value of the wrong shape (lookup on a non-dict, operand not a list)
    #[error("shape error: {0}")]
    Shape(String),

    /// Property lookup on a dict that lacks the key
    #[error("dict has no property '{0}'")]
    MissingProperty(String),

    /// `(namespace, name)` absent from the operator registry
    #[error("no operator registered under {namespace}/{name}")]
    UnknownOperator { namespace: String, name: String },

    /// Second registration under an already-taken `(namespace, name)`
    #[error("operator {namespace}/{name} is already registered")]
    DuplicateOperator { namespace: String, name: String },

    /// Required static or context kwarg absent from the call
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    /// Kwarg evaluated to a value outside its declared type
    #[error("argument '{name}' expects {expected}, got {actual}")]
    ArgumentType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A query node with an empty statement list
    #[error("query has no statements")]
    EmptyQuery,

    /// Error raised inside an operator's `apply` implementation
    #[error("operator error: {0}")]
    Operator(String),

    /// The isolated evaluation worker failed outside the query itself
    #[error("worker error: {0}")]
    Worker(String),
}
