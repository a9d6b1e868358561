//! Single-shot scalar functions: the `str` and `math` namespaces.
//!
//! These are ordinary operators: invoked through `FnCall` they see one
//! synthetic row and emit one value, but nothing stops a query from
//! streaming rows through them with `OpCall`.

use crate::error::EvalError;
use crate::operator::{Kwargs, Operator, OperatorDef, RowStream};
use crate::registry::RegistryBuilder;
use crate::signature::{ParamSpec, ParamType, Signature};
use crate::value::Value;

/// Registers the `str` and `math` functions.
pub fn install(builder: &mut RegistryBuilder) -> Result<(), EvalError> {
    builder.register(OperatorDef::new(
        "str",
        "upper",
        Signature::new().with_context(ParamSpec::required("value", ParamType::String)),
        |_, _| Box::new(Upper),
    ))?;
    builder.register(OperatorDef::new(
        "str",
        "lower",
        Signature::new().with_context(ParamSpec::required("value", ParamType::String)),
        |_, _| Box::new(Lower),
    ))?;
    builder.register(OperatorDef::new(
        "str",
        "concat",
        Signature::new()
            .with_context(ParamSpec::required("left", ParamType::String))
            .with_context(ParamSpec::required("right", ParamType::String)),
        |_, _| Box::new(Concat),
    ))?;
    builder.register(OperatorDef::new(
        "str",
        "contains",
        Signature::new()
            .with_context(ParamSpec::required("value", ParamType::String))
            .with_context(ParamSpec::required("search", ParamType::String)),
        |_, _| Box::new(Contains),
    ))?;
    builder.register(OperatorDef::new(
        "str",
        "matches",
        Signature::new()
            .with_context(ParamSpec::required("value", ParamType::String))
            .with_context(ParamSpec::required("pattern", ParamType::String)),
        |_, _| Box::new(Matches),
    ))?;
    builder.register(OperatorDef::new(
        "math",
        "abs",
        Signature::new().with_context(ParamSpec::required("value", ParamType::Number)),
        |_, _| Box::new(Abs),
    ))?;
    builder.register(OperatorDef::new(
        "math",
        "round",
        Signature::new().with_context(ParamSpec::required("value", ParamType::Number)),
        |_, _| Box::new(Round),
    ))?;
    Ok(())
}

struct Upper;

impl Operator for Upper {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let args = pair?.args;
            out.push(Value::String(args.get_str("value")?.to_uppercase()));
        }
        Ok(())
    }
}

struct Lower;

impl Operator for Lower {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let args = pair?.args;
            out.push(Value::String(args.get_str("value")?.to_lowercase()));
        }
        Ok(())
    }
}

struct Concat;

impl Operator for Concat {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let args = pair?.args;
            let joined = format!("{}{}", args.get_str("left")?, args.get_str("right")?);
            out.push(Value::String(joined));
        }
        Ok(())
    }
}

struct Contains;

impl Operator for Contains {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let args = pair?.args;
            let found = args.get_str("value")?.contains(args.get_str("search")?);
            out.push(Value::Bool(found));
        }
        Ok(())
    }
}

struct Matches;

impl Operator for Matches {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let args = pair?.args;
            let pattern = args.get_str("pattern")?;
            let re = regex::Regex::new(pattern)
                .map_err(|e| EvalError::Operator(format!("invalid regex: {}", e)))?;
            out.push(Value::Bool(re.is_match(args.get_str("value")?)));
        }
        Ok(())
    }
}

struct Abs;

impl Operator for Abs {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let args = pair?.args;
            let value = match args.require("value")? {
                Value::Int(n) => Value::Int(n.abs()),
                Value::Double(n) => Value::Double(n.abs()),
                other => {
                    return Err(EvalError::Type(format!(
                        "abs requires a number, got {}",
                        other.type_name()
                    )));
                }
            };
            out.push(value);
        }
        Ok(())
    }
}

struct Round;

impl Operator for Round {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let args = pair?.args;
            let value = match args.require("value")? {
                Value::Int(n) => Value::Int(*n),
                Value::Double(n) => Value::Int(n.round() as i64),
                other => {
                    return Err(EvalError::Type(format!(
                        "round requires a number, got {}",
                        other.type_name()
                    )));
                }
            };
            out.push(value);
        }
        Ok(())
    }
}
