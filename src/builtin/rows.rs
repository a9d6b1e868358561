//! Row-streaming operators: the `rows` namespace.

use serde_json::json;

use crate::error::EvalError;
use crate::operator::{ContextRow, Kwargs, Operator, OperatorDef, RowStream};
use crate::registry::RegistryBuilder;
use crate::signature::{ParamSpec, ParamType, Signature};
use crate::value::Value;

/// Registers the `rows` operators.
pub fn install(builder: &mut RegistryBuilder) -> Result<(), EvalError> {
    builder.register(OperatorDef::new(
        "rows",
        "filter",
        Signature::new().with_context(ParamSpec::required("where", ParamType::Bool)),
        |_, _| Box::new(Filter),
    ))?;
    builder.register(OperatorDef::new(
        "rows",
        "map",
        Signature::new().with_context(ParamSpec::required("expr", ParamType::Any)),
        |_, _| Box::new(Map),
    ))?;
    builder.register(OperatorDef::new(
        "rows",
        "sort",
        Signature::new()
            .with_static(ParamSpec::optional(
                "descending",
                ParamType::Bool,
                json!(false),
            ))
            .with_context(ParamSpec::optional_nil("key", ParamType::Any)),
        |_, _| Box::new(Sort { keyed: Vec::new() }),
    ))?;
    builder.register(OperatorDef::new(
        "rows",
        "take",
        Signature::new().with_static(ParamSpec::required("count", ParamType::Int)),
        |_, _| Box::new(Take { taken: 0 }),
    ))?;
    builder.register(OperatorDef::new(
        "rows",
        "distinct",
        Signature::new(),
        |_, _| Box::new(Distinct),
    ))?;
    builder.register(OperatorDef::new(
        "rows",
        "sum",
        Signature::new().with_context(ParamSpec::optional_nil("value", ParamType::Number)),
        |_, _| Box::new(Sum),
    ))?;
    Ok(())
}

/// Keeps the rows whose `where` kwarg evaluated to `true`.
struct Filter;

impl Operator for Filter {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let ContextRow { row, args } = pair?;
            if args.get_bool("where")? {
                out.push(row);
            }
        }
        Ok(())
    }
}

/// Replaces every row with its evaluated `expr` kwarg.
struct Map;

impl Operator for Map {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let pair = pair?;
            out.push(pair.args.require("expr")?.clone());
        }
        Ok(())
    }
}

/// Buffers the whole stream, then emits it ordered by the `key` kwarg
/// (the row itself when no key is given).
struct Sort {
    keyed: Vec<(Value, Value)>,
}

impl Operator for Sort {
    fn apply(
        &mut self,
        args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        let descending = args.get_bool("descending")?;
        for pair in input {
            let ContextRow { row, args } = pair?;
            let key = match args.get("key") {
                Some(Value::Nil) | None => row.clone(),
                Some(key) => key.clone(),
            };
            self.keyed.push((key, row));
        }
        self.keyed.sort_by(|(a, _), (b, _)| a.compare(b));
        if descending {
            self.keyed.reverse();
        }
        out.extend(self.keyed.drain(..).map(|(_, row)| row));
        Ok(())
    }
}

/// Passes through the first `count` rows and stops pulling the stream.
struct Take {
    taken: i64,
}

impl Operator for Take {
    fn apply(
        &mut self,
        args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        let count = args.get_int("count")?;
        if count <= 0 {
            return Ok(());
        }
        for pair in input {
            let pair = pair?;
            out.push(pair.row);
            self.taken += 1;
            if self.taken >= count {
                break;
            }
        }
        Ok(())
    }
}

/// Drops rows equal to one already emitted.
struct Distinct;

impl Operator for Distinct {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            let pair = pair?;
            if !out.contains(&pair.row) {
                out.push(pair.row);
            }
        }
        Ok(())
    }
}

/// Appends one trailing value: the sum of the `value` kwarg over all rows
/// (the row itself when no value expression is given). Integer sums stay
/// integral until a double appears.
struct Sum;

impl Operator for Sum {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        let mut int_sum: i64 = 0;
        let mut double_sum: f64 = 0.0;
        let mut promoted = false;

        for pair in input {
            let ContextRow { row, args } = pair?;
            let value = match args.get("value") {
                Some(Value::Nil) | None => row,
                Some(value) => value.clone(),
            };
            match value {
                Value::Int(n) => {
                    if promoted {
                        double_sum += n as f64;
                    } else {
                        int_sum += n;
                    }
                }
                Value::Double(n) => {
                    if !promoted {
                        double_sum = int_sum as f64;
                        promoted = true;
                    }
                    double_sum += n;
                }
                other => {
                    return Err(EvalError::Type(format!(
                        "sum requires numeric values, got {}",
                        other.type_name()
                    )));
                }
            }
        }

        out.push(if promoted {
            Value::Double(double_sum)
        } else {
            Value::Int(int_sum)
        });
        Ok(())
    }
}
