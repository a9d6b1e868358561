//! Per-query isolated execution.
//!
//! Every query evaluates on its own worker thread with a brand-new
//! evaluator and root environment; the caller blocks on a single-shot
//! channel until the worker reports a result or an error. Bindings made
//! while one query evaluates can never be observed by another; the
//! workers share nothing but the read-only registry and bootargs.
//!
//! The boundary speaks JSON on purpose: [`Value`](crate::value::Value) is
//! not `Send`, so a referencable binding physically cannot cross into or
//! out of a worker.
//!
//! Cancellation is not propagated: a caller that stops waiting does not
//! stop the worker; the worker's final send fails and the thread exits.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use log::debug;

use crate::ast::Expr;
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::json;
use crate::operator::BootArgs;
use crate::registry::Registry;
use crate::value::Value;

/// Evaluates `root` on an isolated worker and blocks for the outcome.
///
/// `args` must be a JSON object; its entries seed the query's root scope.
pub fn execute(
    root: Expr,
    args: serde_json::Value,
    registry: Arc<Registry>,
    bootargs: Arc<BootArgs>,
) -> Result<serde_json::Value, EvalError> {
    let (sender, receiver) = mpsc::sync_channel(1);
    let spawned = thread::Builder::new()
        .name("sift-query".to_string())
        .spawn(move || {
            let outcome = run_query(&root, &args, &registry, &bootargs);
            // A caller that abandoned its wait closed the channel; there
            // is nobody left to report to.
            let _ = sender.send(outcome);
        });
    if let Err(err) = spawned {
        return Err(EvalError::Worker(format!(
            "failed to spawn query worker: {}",
            err
        )));
    }
    match receiver.recv() {
        Ok(outcome) => outcome,
        Err(_) => Err(EvalError::Worker(
            "query worker terminated without a result".to_string(),
        )),
    }
}

fn run_query(
    root: &Expr,
    args: &serde_json::Value,
    registry: &Arc<Registry>,
    bootargs: &Arc<BootArgs>,
) -> Result<serde_json::Value, EvalError> {
    let serde_json::Value::Object(entries) = args else {
        return Err(EvalError::Shape(format!(
            "query arguments must be a JSON object, got {}",
            json_type_name(args)
        )));
    };
    let seeded: HashMap<String, Value> = entries
        .iter()
        .map(|(name, value)| (name.clone(), json::from_json(value)))
        .collect();

    debug!("query worker started");
    let mut evaluator = Evaluator::new(Arc::clone(registry), Arc::clone(bootargs));
    let value = evaluator.evaluate(root, seeded)?;
    debug!("query worker finished");
    Ok(json::to_json(&value))
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
