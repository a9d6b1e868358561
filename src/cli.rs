//! Library support for the `sift` debug binary.

use std::sync::Arc;

use thiserror::Error;

use crate::ast::Expr;
use crate::error::EvalError;
use crate::operator::BootArgs;
use crate::registry::Registry;
use crate::runtime;

/// Errors surfaced by the command-line tool.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid query JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Options for the `run` subcommand.
pub struct RunOptions {
    /// JSON-serialized expression tree
    pub query: String,
    /// JSON object of query arguments, `{}` if absent
    pub args: Option<String>,
    /// Pretty-print the result
    pub pretty: bool,
}

/// Deserializes and evaluates a query against the standard operator
/// library, returning the rendered JSON result.
pub fn execute_run(options: &RunOptions) -> Result<String, CliError> {
    let root: Expr = serde_json::from_str(&options.query)?;
    let args: serde_json::Value = match &options.args {
        Some(text) => serde_json::from_str(text)?,
        None => serde_json::Value::Object(serde_json::Map::new()),
    };

    let registry = Arc::new(Registry::with_builtins()?);
    let bootargs = Arc::new(BootArgs::new());
    let result = runtime::execute(root, args, registry, bootargs)?;

    let rendered = if options.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    Ok(rendered)
}

/// Deserializes the query without evaluating it, returning its debug
/// rendering.
pub fn check_query(query: &str) -> Result<String, CliError> {
    let root: Expr = serde_json::from_str(query)?;
    Ok(root.to_string())
}
