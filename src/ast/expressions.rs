use serde::{Deserialize, Serialize};

use crate::ast::{BinOp, UnOp};

/// Declared type of an [`Expr::Atom`] literal.
///
/// The literal text is parsed according to this kind at evaluation time;
/// there is no implicit coercion between kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomKind {
    /// Integer literal, e.g. `"42"`
    Int,
    /// Floating-point literal, e.g. `"3.14"`
    Double,
    /// Boolean literal, `"true"` or `"false"`
    Bool,
    /// String literal, taken verbatim
    String,
}

/// Which built-in higher-order form an [`Expr::HighFnCall`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighFnKind {
    /// Evaluate the lambda once per element and collect the results
    Map,
    /// Keep the elements for which the lambda yields `true`
    Filter,
}

/// A node in the expression tree submitted for evaluation.
///
/// Nodes are immutable pure data; all behavior lives in the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Typed literal carrying its unparsed text
    ///
    /// # Example
    /// ```text
    /// Atom(Int, "42")
    /// ```
    Atom { kind: AtomKind, text: String },

    /// Binary operation (arithmetic, comparison, logical)
    ///
    /// `and`/`or` short-circuit: a left operand that already determines
    /// the result suppresses evaluation of the right subtree entirely.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation
    Unary { op: UnOp, operand: Box<Expr> },

    /// List literal; elements evaluate eagerly, left to right
    List(Vec<Expr>),

    /// Tuple literal; evaluates like a list
    Tuple(Vec<Expr>),

    /// Dict literal; values evaluate in source order
    Dict(Vec<(String, Expr)>),

    /// Reference to a variable in the scope chain
    Var(String),

    /// Property lookup on a dict-valued base
    ///
    /// # Example
    /// ```text
    /// Lookup { base: At, property: "price" }   // @.price
    /// ```
    Lookup { base: Box<Expr>, property: String },

    /// The implicit current-row binding (`@`)
    ///
    /// Only valid inside a per-row evaluation context.
    At,

    /// Conditional; exactly one branch is evaluated
    IfElse {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Evaluate `body` and, when `name` is non-empty, bind the result in
    /// the current scope
    ///
    /// Names matching the reserved `__...__` marker are rejected.
    Statement { name: String, body: Box<Expr> },

    /// Ordered statement sequence sharing one scope; the query's value is
    /// the value of its last statement
    Query(Vec<Expr>),

    /// Invocation of a registered row-streaming operator
    ///
    /// Each `operands` node must evaluate to a list; the lists concatenate
    /// into the operator's input stream. `row_vars` are additional names
    /// bound to the current row (next to `@`) while context kwargs
    /// evaluate.
    OpCall {
        operands: Vec<Expr>,
        row_vars: Vec<String>,
        namespace: String,
        name: String,
        kwargs: Vec<(String, Expr)>,
    },

    /// Built-in higher-order map/filter over a list
    ///
    /// # Example
    /// ```text
    /// HighFnCall { kind: Map, var: "x", lambda: x * 2, iterable: [1, 2] }
    /// ```
    HighFnCall {
        kind: HighFnKind,
        var: String,
        lambda: Box<Expr>,
        iterable: Box<Expr>,
    },

    /// Single-shot scalar function call
    ///
    /// Follows the operator contract with exactly one synthetic row; every
    /// declared parameter is treated as contextual.
    FnCall {
        module: String,
        name: String,
        kwargs: Vec<(String, Expr)>,
    },
}

impl Expr {
    /// Integer literal.
    pub fn int(n: i64) -> Expr {
        Expr::Atom {
            kind: AtomKind::Int,
            text: n.to_string(),
        }
    }

    /// Floating-point literal.
    pub fn double(n: f64) -> Expr {
        Expr::Atom {
            kind: AtomKind::Double,
            text: n.to_string(),
        }
    }

    /// Boolean literal.
    pub fn bool(b: bool) -> Expr {
        Expr::Atom {
            kind: AtomKind::Bool,
            text: b.to_string(),
        }
    }

    /// String literal.
    pub fn string(s: impl Into<String>) -> Expr {
        Expr::Atom {
            kind: AtomKind::String,
            text: s.into(),
        }
    }

    /// Variable reference.
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    /// Property lookup on `base`.
    pub fn lookup(base: Expr, property: impl Into<String>) -> Expr {
        Expr::Lookup {
            base: Box::new(base),
            property: property.into(),
        }
    }

    /// Binary operation.
    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Unary operation.
    pub fn unary(op: UnOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Named statement (use `""` for an anonymous one).
    pub fn statement(name: impl Into<String>, body: Expr) -> Expr {
        Expr::Statement {
            name: name.into(),
            body: Box::new(body),
        }
    }

    /// Conditional.
    pub fn if_else(condition: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::IfElse {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }
}
