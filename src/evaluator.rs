//! The query evaluator.
//!
//! One evaluator instance owns one scope chain and read-only handles to
//! the operator registry and the caller's bootargs, and walks a submitted
//! expression tree bottom-up. Evaluators are single-shot: the runtime
//! creates a fresh one per query so bindings can never leak between
//! evaluations.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::ast::{AtomKind, BinOp, Expr, HighFnKind};
use crate::env::Environment;
use crate::error::EvalError;
use crate::json;
use crate::operator::{BootArgs, ContextRow, Kwargs, Operator, OperatorDef};
use crate::registry::Registry;
use crate::signature::ParamSpec;
use crate::value::Value;

/// Name the current row is bound to inside per-row contexts.
pub const CURRENT_ROW: &str = "@";

/// Name the raw argument dict is seeded under in the root scope.
pub const ARGS_BINDING: &str = "__args__";

const RESERVED_MARKER: &str = "__";

/// Evaluates `root` against a fresh evaluator seeded with `args`.
///
/// This is the entry point a host application embeds: build a registry
/// once, then call this per query. For cross-thread isolation use
/// [`runtime::execute`](crate::runtime::execute) instead.
pub fn evaluate(
    root: &Expr,
    args: HashMap<String, Value>,
    registry: &Arc<Registry>,
    bootargs: &Arc<BootArgs>,
) -> Result<Value, EvalError> {
    let mut evaluator = Evaluator::new(Arc::clone(registry), Arc::clone(bootargs));
    evaluator.evaluate(root, args)
}

/// Walks expression trees, producing values.
pub struct Evaluator {
    env: Environment,
    registry: Arc<Registry>,
    bootargs: Arc<BootArgs>,
    query_args: Kwargs,
}

impl Evaluator {
    /// A fresh evaluator with an empty root scope.
    pub fn new(registry: Arc<Registry>, bootargs: Arc<BootArgs>) -> Evaluator {
        Evaluator {
            env: Environment::new(),
            registry,
            bootargs,
            query_args: Kwargs::new(),
        }
    }

    /// Seeds the root scope with `args` and evaluates `root`.
    ///
    /// Each argument is bound by name with copy semantics; the raw dict is
    /// additionally seeded under the internal `__args__` binding, which is
    /// why user statements may not mint `__...__` names. Call this once
    /// per evaluator.
    pub fn evaluate(
        &mut self,
        root: &Expr,
        args: HashMap<String, Value>,
    ) -> Result<Value, EvalError> {
        debug!("evaluating query with {} top-level arguments", args.len());
        let mut raw = HashMap::with_capacity(args.len());
        for (name, value) in args {
            self.env.define(&name, value.clone())?;
            raw.insert(name.clone(), value.clone());
            self.query_args.insert(name, value);
        }
        self.env.define_referencable(ARGS_BINDING, Value::dict(raw))?;
        self.eval_expr(root)
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Atom { kind, text } => eval_atom(*kind, text),
            Expr::Binary { op, left, right } => {
                let lhs = self.eval_expr(left)?;
                // A determined left operand suppresses the right subtree,
                // including any error it would have raised.
                match (op, &lhs) {
                    (BinOp::And, Value::Bool(false)) => Ok(Value::Bool(false)),
                    (BinOp::Or, Value::Bool(true)) => Ok(Value::Bool(true)),
                    _ => {
                        let rhs = self.eval_expr(right)?;
                        lhs.binary(*op, &rhs)
                    }
                }
            }
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                value.unary(*op)
            }
            Expr::List(items) | Expr::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::list(values))
            }
            Expr::Dict(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (key, node) in entries {
                    let value = self.eval_expr(node)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::dict(map))
            }
            Expr::Var(name) => self.env.lookup(name),
            Expr::Lookup { base, property } => {
                let base_value = self.eval_expr(base)?;
                match &base_value {
                    Value::Dict(entries) => entries
                        .borrow()
                        .get(property)
                        .cloned()
                        .ok_or_else(|| EvalError::MissingProperty(property.clone())),
                    other => Err(EvalError::Shape(format!(
                        "cannot look up '{}' on {}",
                        property,
                        other.type_name()
                    ))),
                }
            }
            Expr::At => self
                .env
                .lookup(CURRENT_ROW)
                .map_err(|_| EvalError::NoCurrentRow),
            Expr::IfElse {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.eval_expr(condition)?;
                // Exactly one branch runs, in the current scope; the
                // untaken branch's bindings never come into existence.
                match cond {
                    Value::Bool(true) => self.eval_expr(then_branch),
                    Value::Bool(false) => self.eval_expr(else_branch),
                    other => Err(EvalError::Type(format!(
                        "if condition must be a boolean, got {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Statement { name, body } => {
                let value = self.eval_expr(body)?;
                if !name.is_empty() {
                    if name.starts_with(RESERVED_MARKER) && name.ends_with(RESERVED_MARKER) {
                        return Err(EvalError::ReservedName(name.clone()));
                    }
                    self.env.define(name, value.clone())?;
                }
                Ok(value)
            }
            Expr::Query(statements) => {
                if statements.is_empty() {
                    return Err(EvalError::EmptyQuery);
                }
                let mut last = Value::Nil;
                for statement in statements {
                    last = self.eval_expr(statement)?;
                }
                Ok(last)
            }
            Expr::HighFnCall {
                kind,
                var,
                lambda,
                iterable,
            } => self.eval_high_fn(*kind, var, lambda, iterable),
            Expr::OpCall {
                operands,
                row_vars,
                namespace,
                name,
                kwargs,
            } => self.eval_op_call(operands, row_vars, namespace, name, kwargs),
            Expr::FnCall {
                module,
                name,
                kwargs,
            } => self.eval_fn_call(module, name, kwargs),
        }
    }

    fn eval_high_fn(
        &mut self,
        kind: HighFnKind,
        var: &str,
        lambda: &Expr,
        iterable: &Expr,
    ) -> Result<Value, EvalError> {
        let form = match kind {
            HighFnKind::Map => "map",
            HighFnKind::Filter => "filter",
        };
        let iterable_value = self.eval_expr(iterable)?;
        let items: Vec<Value> = match &iterable_value {
            Value::List(items) => items.borrow().clone(),
            other => {
                return Err(EvalError::Shape(format!(
                    "{} expects a list, got {}",
                    form,
                    other.type_name()
                )));
            }
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            self.env.push_scope();
            let result = self.bind_and_eval(var, &item, lambda);
            let _ = self.env.pop_scope();
            let value = result?;
            match kind {
                HighFnKind::Map => out.push(value),
                HighFnKind::Filter => match value {
                    Value::Bool(true) => out.push(item),
                    Value::Bool(false) => {}
                    other => {
                        return Err(EvalError::Type(format!(
                            "filter lambda must yield a boolean, got {}",
                            other.type_name()
                        )));
                    }
                },
            }
        }
        Ok(Value::list(out))
    }

    fn bind_and_eval(&mut self, var: &str, item: &Value, lambda: &Expr) -> Result<Value, EvalError> {
        self.env.define_referencable(var, item.clone())?;
        self.eval_expr(lambda)
    }

    fn eval_op_call(
        &mut self,
        operands: &[Expr],
        row_vars: &[String],
        namespace: &str,
        name: &str,
        kwargs: &[(String, Expr)],
    ) -> Result<Value, EvalError> {
        let def = self.registry.resolve(namespace, name)?;

        // 1. Static kwargs, once, in the caller's scope.
        let statics = self.eval_static_kwargs(&def, kwargs)?;

        // 2. Input: every operand must be a list; lists concatenate in
        //    order into one row stream.
        let mut rows = Vec::new();
        for operand in operands {
            let value = self.eval_expr(operand)?;
            match &value {
                Value::List(items) => rows.extend(items.borrow().iter().cloned()),
                other => {
                    return Err(EvalError::Shape(format!(
                        "operator {}/{} input must be a list, got {}",
                        namespace,
                        name,
                        other.type_name()
                    )));
                }
            }
        }
        trace!("invoking {}/{} over {} rows", namespace, name, rows.len());

        // 3+4. Fresh instance per call occurrence, fed the lazy pair
        //      stream; the operator controls output cardinality.
        let mut instance = (def.factory)(&self.query_args, &self.bootargs);
        let mut out = Vec::new();
        let mut stream = ContextRows {
            evaluator: self,
            def: def.as_ref(),
            kwargs,
            row_vars,
            rows: rows.into_iter(),
        };
        instance.apply(&statics, &mut stream, &mut out)?;
        Ok(Value::list(out))
    }

    fn eval_fn_call(
        &mut self,
        module: &str,
        name: &str,
        kwargs: &[(String, Expr)],
    ) -> Result<Value, EvalError> {
        let def = self.registry.resolve(module, name)?;
        trace!("calling function {}/{}", module, name);

        // One synthetic row; every declared parameter is contextual.
        self.env.push_scope();
        let result = self.eval_fn_kwargs(&def, kwargs);
        let _ = self.env.pop_scope();
        let args = result?;

        let mut instance = (def.factory)(&self.query_args, &self.bootargs);
        let mut out = Vec::new();
        let mut stream: std::iter::Once<Result<ContextRow, EvalError>> =
            std::iter::once(Ok(ContextRow {
                row: Value::Nil,
                args,
            }));
        instance.apply(&Kwargs::new(), &mut stream, &mut out)?;

        Ok(match out.len() {
            0 => Value::Nil,
            1 => out.remove(0),
            _ => Value::list(out),
        })
    }

    fn eval_fn_kwargs(
        &mut self,
        def: &OperatorDef,
        kwargs: &[(String, Expr)],
    ) -> Result<Kwargs, EvalError> {
        self.env.define_referencable(CURRENT_ROW, Value::Nil)?;
        let mut args = Kwargs::new();
        for spec in def
            .signature
            .static_params
            .iter()
            .chain(&def.signature.context_params)
        {
            let value = self.eval_param(spec, kwargs)?;
            args.insert(spec.name, value);
        }
        Ok(args)
    }

    fn eval_static_kwargs(
        &mut self,
        def: &OperatorDef,
        kwargs: &[(String, Expr)],
    ) -> Result<Kwargs, EvalError> {
        let mut statics = Kwargs::new();
        for spec in &def.signature.static_params {
            let value = self.eval_param(spec, kwargs)?;
            statics.insert(spec.name, value);
        }
        Ok(statics)
    }

    /// Resolves one declared parameter against the call-site kwargs:
    /// evaluate if supplied, fall back to the declared default, error if
    /// required and absent, then type-check.
    fn eval_param(
        &mut self,
        spec: &ParamSpec,
        kwargs: &[(String, Expr)],
    ) -> Result<Value, EvalError> {
        let node = kwargs
            .iter()
            .find(|(name, _)| name.as_str() == spec.name)
            .map(|(_, node)| node);
        let value = match node {
            Some(node) => self.eval_expr(node)?,
            None if spec.required => {
                return Err(EvalError::MissingArgument(spec.name.to_string()));
            }
            None => match &spec.default {
                Some(default) => json::from_json(default),
                // optional without default: absent, untyped
                None => return Ok(Value::Nil),
            },
        };
        if !spec.ty.admits(&value) {
            return Err(EvalError::ArgumentType {
                name: spec.name.to_string(),
                expected: spec.ty.name(),
                actual: value.type_name(),
            });
        }
        Ok(value)
    }

    /// Produces one `(row, context kwargs)` pair inside a per-row scope.
    fn context_row(
        &mut self,
        row: Value,
        def: &OperatorDef,
        kwargs: &[(String, Expr)],
        row_vars: &[String],
    ) -> Result<ContextRow, EvalError> {
        if !def.signature.input.admits(&row) {
            return Err(EvalError::Shape(format!(
                "operator {}/{} expects {} input elements, got {}",
                def.namespace,
                def.name,
                def.signature.input.name(),
                row.type_name()
            )));
        }
        self.env.push_scope();
        let result = self.context_row_kwargs(&row, def, kwargs, row_vars);
        let _ = self.env.pop_scope();
        let args = result?;
        Ok(ContextRow { row, args })
    }

    fn context_row_kwargs(
        &mut self,
        row: &Value,
        def: &OperatorDef,
        kwargs: &[(String, Expr)],
        row_vars: &[String],
    ) -> Result<Kwargs, EvalError> {
        self.env.define_referencable(CURRENT_ROW, row.clone())?;
        for var in row_vars {
            self.env.define_referencable(var, row.clone())?;
        }
        let mut args = Kwargs::new();
        for spec in &def.signature.context_params {
            let value = self.eval_param(spec, kwargs)?;
            args.insert(spec.name, value);
        }
        Ok(args)
    }
}

/// Lazy pair stream handed to `Operator::apply`: pulling the next item
/// evaluates that row's context kwargs.
struct ContextRows<'a> {
    evaluator: &'a mut Evaluator,
    def: &'a OperatorDef,
    kwargs: &'a [(String, Expr)],
    row_vars: &'a [String],
    rows: std::vec::IntoIter<Value>,
}

impl Iterator for ContextRows<'_> {
    type Item = Result<ContextRow, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(
            self.evaluator
                .context_row(row, self.def, self.kwargs, self.row_vars),
        )
    }
}

fn eval_atom(kind: AtomKind, text: &str) -> Result<Value, EvalError> {
    match kind {
        AtomKind::Int => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::InvalidLiteral {
                kind: "integer",
                text: text.to_string(),
            }),
        AtomKind::Double => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| EvalError::InvalidLiteral {
                kind: "double",
                text: text.to_string(),
            }),
        AtomKind::Bool => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(EvalError::InvalidLiteral {
                kind: "boolean",
                text: text.to_string(),
            }),
        },
        AtomKind::String => Ok(Value::String(text.to_string())),
    }
}
