use std::collections::HashMap;
use std::sync::Arc;

use sift_lang::{
    builtin, evaluate, BinOp, BootArgs, EvalError, Expr, Kwargs, Operator, OperatorDef,
    ParamSpec, ParamType, Registry, RegistryBuilder, RowStream, Signature, Value,
};

fn dict_expr(pairs: Vec<(&str, Expr)>) -> Expr {
    Expr::Dict(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn dict_value(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::dict(map)
}

fn op_call(operands: Vec<Expr>, namespace: &str, name: &str, kwargs: Vec<(&str, Expr)>) -> Expr {
    Expr::OpCall {
        operands,
        row_vars: vec![],
        namespace: namespace.to_string(),
        name: name.to_string(),
        kwargs: kwargs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    }
}

fn fn_call(module: &str, name: &str, kwargs: Vec<(&str, Expr)>) -> Expr {
    Expr::FnCall {
        module: module.to_string(),
        name: name.to_string(),
        kwargs: kwargs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    }
}

/// `List[Dict{"a": 1}, Dict{"a": 2}, Dict{"a": 3}]`
fn rows_abc() -> Expr {
    Expr::List(vec![
        dict_expr(vec![("a", Expr::int(1))]),
        dict_expr(vec![("a", Expr::int(2))]),
        dict_expr(vec![("a", Expr::int(3))]),
    ])
}

fn eval(expr: &Expr) -> Result<Value, EvalError> {
    eval_full(expr, HashMap::new(), Vec::new(), BootArgs::new())
}

fn eval_full(
    expr: &Expr,
    args: HashMap<String, Value>,
    extra_ops: Vec<OperatorDef>,
    bootargs: BootArgs,
) -> Result<Value, EvalError> {
    let mut builder = RegistryBuilder::new();
    builtin::install(&mut builder).unwrap();
    for def in extra_ops {
        builder.register(def).unwrap();
    }
    let registry = Arc::new(builder.build());
    evaluate(expr, args, &registry, &Arc::new(bootargs))
}

// ========================================================================
// Registry
// ========================================================================

#[test]
fn test_duplicate_registration_fails() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(OperatorDef::new("t", "noop", Signature::new(), |_, _| {
            Box::new(PassThrough)
        }))
        .unwrap();
    let err = builder
        .register(OperatorDef::new("t", "noop", Signature::new(), |_, _| {
            Box::new(PassThrough)
        }))
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::DuplicateOperator {
            namespace: "t".into(),
            name: "noop".into(),
        }
    );
}

#[test]
fn test_unknown_operator_fails() {
    let registry = Registry::with_builtins().unwrap();
    let err = registry.resolve("rows", "zip").unwrap_err();
    assert_eq!(
        err,
        EvalError::UnknownOperator {
            namespace: "rows".into(),
            name: "zip".into(),
        }
    );

    // the same error surfaces through evaluation
    let expr = op_call(vec![rows_abc()], "rows", "zip", vec![]);
    assert!(matches!(eval(&expr), Err(EvalError::UnknownOperator { .. })));
}

// ========================================================================
// Built-in row operators
// ========================================================================

#[test]
fn test_filter_with_context_kwarg() {
    // rows.filter(rows | where: @.a >= 2)
    let expr = op_call(
        vec![rows_abc()],
        "rows",
        "filter",
        vec![(
            "where",
            Expr::binary(Expr::lookup(Expr::At, "a"), BinOp::GreaterEqual, Expr::int(2)),
        )],
    );
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![
            dict_value(vec![("a", Value::Int(2))]),
            dict_value(vec![("a", Value::Int(3))]),
        ])
    );
}

#[test]
fn test_named_row_binding_next_to_at() {
    let expr = Expr::OpCall {
        operands: vec![rows_abc()],
        row_vars: vec!["row".to_string()],
        namespace: "rows".to_string(),
        name: "filter".to_string(),
        kwargs: vec![(
            "where".to_string(),
            Expr::binary(
                Expr::lookup(Expr::var("row"), "a"),
                BinOp::GreaterEqual,
                Expr::int(2),
            ),
        )],
    };
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![
            dict_value(vec![("a", Value::Int(2))]),
            dict_value(vec![("a", Value::Int(3))]),
        ])
    );
}

#[test]
fn test_map_projects_rows() {
    let expr = op_call(
        vec![rows_abc()],
        "rows",
        "map",
        vec![("expr", Expr::lookup(Expr::At, "a"))],
    );
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_sort_with_key_and_static_descending() {
    let rows = Expr::List(vec![
        dict_expr(vec![("a", Expr::int(2))]),
        dict_expr(vec![("a", Expr::int(3))]),
        dict_expr(vec![("a", Expr::int(1))]),
    ]);
    let expr = op_call(
        vec![rows],
        "rows",
        "sort",
        vec![
            ("key", Expr::lookup(Expr::At, "a")),
            ("descending", Expr::bool(true)),
        ],
    );
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![
            dict_value(vec![("a", Value::Int(3))]),
            dict_value(vec![("a", Value::Int(2))]),
            dict_value(vec![("a", Value::Int(1))]),
        ])
    );
}

#[test]
fn test_sort_without_key_orders_by_row() {
    let rows = Expr::List(vec![Expr::int(3), Expr::int(1), Expr::int(2)]);
    let expr = op_call(vec![rows], "rows", "sort", vec![]);
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_take_with_static_count() {
    let expr = op_call(vec![rows_abc()], "rows", "take", vec![("count", Expr::int(2))]);
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![
            dict_value(vec![("a", Value::Int(1))]),
            dict_value(vec![("a", Value::Int(2))]),
        ])
    );
}

#[test]
fn test_distinct_drops_duplicates() {
    let rows = Expr::List(vec![Expr::int(1), Expr::int(2), Expr::int(1)]);
    let expr = op_call(vec![rows], "rows", "distinct", vec![]);
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn test_sum_appends_one_trailing_value() {
    let rows = Expr::List(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
    let expr = op_call(vec![rows], "rows", "sum", vec![]);
    assert_eq!(eval(&expr).unwrap(), Value::list(vec![Value::Int(6)]));

    // a double promotes the whole sum
    let rows = Expr::List(vec![Expr::int(1), Expr::double(2.5)]);
    let expr = op_call(vec![rows], "rows", "sum", vec![]);
    assert_eq!(eval(&expr).unwrap(), Value::list(vec![Value::Double(3.5)]));
}

#[test]
fn test_multiple_operands_concatenate() {
    let first = Expr::List(vec![Expr::int(1)]);
    let second = Expr::List(vec![Expr::int(2), Expr::int(3)]);
    let expr = op_call(vec![first, second], "rows", "distinct", vec![]);
    assert_eq!(
        eval(&expr).unwrap(),
        Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

// ========================================================================
// Argument protocol
// ========================================================================

#[test]
fn test_missing_required_kwarg_fails() {
    let expr = op_call(vec![rows_abc()], "rows", "filter", vec![]);
    assert_eq!(
        eval(&expr).unwrap_err(),
        EvalError::MissingArgument("where".into())
    );
}

#[test]
fn test_static_kwarg_type_mismatch_fails() {
    let expr = op_call(
        vec![rows_abc()],
        "rows",
        "take",
        vec![("count", Expr::string("two"))],
    );
    assert_eq!(
        eval(&expr).unwrap_err(),
        EvalError::ArgumentType {
            name: "count".into(),
            expected: "int",
            actual: "string",
        }
    );
}

#[test]
fn test_context_kwarg_type_mismatch_fails() {
    let expr = op_call(
        vec![rows_abc()],
        "rows",
        "filter",
        vec![("where", Expr::int(1))],
    );
    assert!(matches!(eval(&expr), Err(EvalError::ArgumentType { .. })));
}

#[test]
fn test_operand_must_be_a_list() {
    let expr = op_call(vec![Expr::int(1)], "rows", "distinct", vec![]);
    assert!(matches!(eval(&expr), Err(EvalError::Shape(_))));
}

// ========================================================================
// Custom operators: state, bootargs, laziness, input shape
// ========================================================================

/// Emits every row unchanged.
struct PassThrough;

impl Operator for PassThrough {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            out.push(pair?.row);
        }
        Ok(())
    }
}

/// Counts its rows; per-invocation mutable state.
struct Tally {
    count: i64,
}

impl Operator for Tally {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            pair?;
            self.count += 1;
        }
        out.push(Value::Int(self.count));
        Ok(())
    }
}

/// Pulls exactly one pair and stops.
struct Head;

impl Operator for Head {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        if let Some(pair) = input.next() {
            out.push(pair?.row);
        }
        Ok(())
    }
}

#[test]
fn test_each_call_occurrence_gets_a_fresh_instance() {
    let tally = OperatorDef::new("t", "tally", Signature::new(), |_, _| {
        Box::new(Tally { count: 0 })
    });

    let two_rows = Expr::List(vec![Expr::int(1), Expr::int(2)]);
    let three_rows = Expr::List(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
    let expr = Expr::List(vec![
        op_call(vec![two_rows], "t", "tally", vec![]),
        op_call(vec![three_rows], "t", "tally", vec![]),
    ]);

    // shared state would make the second count 5
    assert_eq!(
        eval_full(&expr, HashMap::new(), vec![tally], BootArgs::new()).unwrap(),
        Value::list(vec![
            Value::list(vec![Value::Int(2)]),
            Value::list(vec![Value::Int(3)]),
        ])
    );
}

#[test]
fn test_factory_receives_query_args() {
    let echo_scale = OperatorDef::new("t", "scale", Signature::new(), |query_args, _| {
        let scale = query_args.get("scale").cloned().unwrap_or(Value::Nil);
        Box::new(EchoValue { value: scale })
    });

    let mut args = HashMap::new();
    args.insert("scale".to_string(), Value::Int(3));
    let expr = op_call(vec![Expr::List(vec![])], "t", "scale", vec![]);
    assert_eq!(
        eval_full(&expr, args, vec![echo_scale], BootArgs::new()).unwrap(),
        Value::list(vec![Value::Int(3)])
    );
}

#[test]
fn test_factory_receives_bootargs() {
    let tagger = OperatorDef::new("t", "tag", Signature::new(), |_, bootargs| {
        let tag = bootargs
            .get::<String>("tag")
            .map(|s| s.as_ref().clone())
            .unwrap_or_default();
        Box::new(EchoValue {
            value: Value::String(tag),
        })
    });

    let mut bootargs = BootArgs::new();
    bootargs.insert("tag", Arc::new("prod".to_string()));
    let expr = op_call(vec![Expr::List(vec![])], "t", "tag", vec![]);
    assert_eq!(
        eval_full(&expr, HashMap::new(), vec![tagger], bootargs).unwrap(),
        Value::list(vec![Value::String("prod".into())])
    );
}

/// Drains its input, then emits one fixed value.
struct EchoValue {
    value: Value,
}

impl Operator for EchoValue {
    fn apply(
        &mut self,
        _args: &Kwargs,
        input: &mut RowStream<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        for pair in input {
            pair?;
        }
        out.push(self.value.clone());
        Ok(())
    }
}

#[test]
fn test_context_kwargs_evaluate_lazily() {
    let head = OperatorDef::new(
        "t",
        "head",
        Signature::new().with_context(ParamSpec::required("peek", ParamType::Any)),
        |_, _| Box::new(Head),
    );

    // the second row would fail the peek lookup, but head never pulls it
    let rows = Expr::List(vec![dict_expr(vec![("a", Expr::int(1))]), Expr::int(5)]);
    let expr = op_call(
        vec![rows],
        "t",
        "head",
        vec![("peek", Expr::lookup(Expr::At, "a"))],
    );
    assert_eq!(
        eval_full(&expr, HashMap::new(), vec![head], BootArgs::new()).unwrap(),
        Value::list(vec![dict_value(vec![("a", Value::Int(1))])])
    );
}

#[test]
fn test_declared_input_shape_is_enforced() {
    let dicts_only = OperatorDef::new(
        "t",
        "dicts",
        Signature::new().with_input(ParamType::Dict),
        |_, _| Box::new(PassThrough),
    );

    let rows = Expr::List(vec![Expr::int(1)]);
    let expr = op_call(vec![rows], "t", "dicts", vec![]);
    assert!(matches!(
        eval_full(&expr, HashMap::new(), vec![dicts_only], BootArgs::new()),
        Err(EvalError::Shape(_))
    ));
}

#[test]
fn test_operator_internal_errors_propagate() {
    let failing = OperatorDef::new("t", "fail", Signature::new(), |_, _| Box::new(Failing));
    let expr = op_call(vec![Expr::List(vec![])], "t", "fail", vec![]);
    assert_eq!(
        eval_full(&expr, HashMap::new(), vec![failing], BootArgs::new()).unwrap_err(),
        EvalError::Operator("backing store unavailable".into())
    );
}

struct Failing;

impl Operator for Failing {
    fn apply(
        &mut self,
        _args: &Kwargs,
        _input: &mut RowStream<'_>,
        _out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        Err(EvalError::Operator("backing store unavailable".into()))
    }
}

// ========================================================================
// Scalar functions (FnCall)
// ========================================================================

#[test]
fn test_fn_call_returns_a_scalar() {
    let expr = fn_call("str", "upper", vec![("value", Expr::string("abc"))]);
    assert_eq!(eval(&expr).unwrap(), Value::String("ABC".into()));

    let expr = fn_call("math", "abs", vec![("value", Expr::int(-3))]);
    assert_eq!(eval(&expr).unwrap(), Value::Int(3));

    let expr = fn_call("math", "round", vec![("value", Expr::double(2.6))]);
    assert_eq!(eval(&expr).unwrap(), Value::Int(3));
}

#[test]
fn test_fn_call_concat_and_contains() {
    let expr = fn_call(
        "str",
        "concat",
        vec![("left", Expr::string("foo")), ("right", Expr::string("bar"))],
    );
    assert_eq!(eval(&expr).unwrap(), Value::String("foobar".into()));

    let expr = fn_call(
        "str",
        "contains",
        vec![
            ("value", Expr::string("haystack")),
            ("search", Expr::string("stack")),
        ],
    );
    assert_eq!(eval(&expr).unwrap(), Value::Bool(true));
}

#[test]
fn test_fn_call_regex_matches() {
    let expr = fn_call(
        "str",
        "matches",
        vec![
            ("value", Expr::string("user-42")),
            ("pattern", Expr::string(r"^user-\d+$")),
        ],
    );
    assert_eq!(eval(&expr).unwrap(), Value::Bool(true));

    let expr = fn_call(
        "str",
        "matches",
        vec![
            ("value", Expr::string("x")),
            ("pattern", Expr::string("(unclosed")),
        ],
    );
    assert!(matches!(eval(&expr), Err(EvalError::Operator(_))));
}

#[test]
fn test_fn_call_missing_argument() {
    let expr = fn_call("str", "upper", vec![]);
    assert_eq!(
        eval(&expr).unwrap_err(),
        EvalError::MissingArgument("value".into())
    );
}

#[test]
fn test_fn_call_unknown_function() {
    let expr = fn_call("str", "reverse", vec![]);
    assert!(matches!(eval(&expr), Err(EvalError::UnknownOperator { .. })));
}
