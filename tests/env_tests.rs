use std::collections::HashMap;

use sift_lang::{Environment, EvalError, Value};

fn dict(pairs: Vec<(&str, Value)>) -> Value {
    let mut map = HashMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v);
    }
    Value::dict(map)
}

#[test]
fn test_define_and_lookup() {
    let mut env = Environment::new();
    env.define("x", Value::Int(1)).unwrap();
    assert_eq!(env.lookup("x").unwrap(), Value::Int(1));
}

#[test]
fn test_lookup_undefined_fails() {
    let env = Environment::new();
    assert_eq!(
        env.lookup("missing").unwrap_err(),
        EvalError::UndefinedVariable("missing".into())
    );
}

#[test]
fn test_redefinition_in_same_scope_fails() {
    let mut env = Environment::new();
    env.define("x", Value::Int(1)).unwrap();
    assert_eq!(
        env.define("x", Value::Int(2)).unwrap_err(),
        EvalError::Redefinition("x".into())
    );
    // referencable definitions follow the same rule
    assert_eq!(
        env.define_referencable("x", Value::Int(2)).unwrap_err(),
        EvalError::Redefinition("x".into())
    );
}

#[test]
fn test_child_scope_shadows_and_expires() {
    let mut env = Environment::new();
    env.define("x", Value::Int(1)).unwrap();

    env.push_scope();
    env.define("x", Value::Int(2)).unwrap();
    assert_eq!(env.lookup("x").unwrap(), Value::Int(2));
    env.pop_scope().unwrap();

    assert_eq!(env.lookup("x").unwrap(), Value::Int(1));
}

#[test]
fn test_lookup_walks_outward() {
    let mut env = Environment::new();
    env.define("outer", Value::Int(1)).unwrap();
    env.push_scope();
    env.push_scope();
    assert_eq!(env.lookup("outer").unwrap(), Value::Int(1));
}

#[test]
fn test_pop_root_scope_fails() {
    let mut env = Environment::new();
    assert_eq!(env.pop_scope().unwrap_err(), EvalError::RootScopePop);

    env.push_scope();
    env.pop_scope().unwrap();
    assert_eq!(env.pop_scope().unwrap_err(), EvalError::RootScopePop);
}

#[test]
fn test_referencable_binding_aliases_live_value() {
    let mut env = Environment::new();
    let shared = dict(vec![("a", Value::Int(1))]);
    env.define_referencable("shared", shared.clone()).unwrap();

    // external mutation of the dict is visible on a later lookup
    if let Value::Dict(entries) = &shared {
        entries.borrow_mut().insert("b".into(), Value::Int(2));
    }

    let seen = env.lookup("shared").unwrap();
    match &seen {
        Value::Dict(entries) => {
            assert_eq!(entries.borrow().get("b"), Some(&Value::Int(2)));
        }
        other => panic!("expected dict, got {:?}", other),
    }
}

#[test]
fn test_plain_binding_has_copy_semantics() {
    let mut env = Environment::new();
    let owned = dict(vec![("a", Value::Int(1))]);
    env.define("copied", owned.clone()).unwrap();

    // the binding snapshotted the value; this mutation is invisible
    if let Value::Dict(entries) = &owned {
        entries.borrow_mut().insert("b".into(), Value::Int(2));
    }

    let seen = env.lookup("copied").unwrap();
    match &seen {
        Value::Dict(entries) => {
            assert_eq!(entries.borrow().get("b"), None);
            assert_eq!(entries.borrow().get("a"), Some(&Value::Int(1)));
        }
        other => panic!("expected dict, got {:?}", other),
    }
}

#[test]
fn test_plain_lookup_returns_defensive_copy() {
    let mut env = Environment::new();
    env.define("xs", Value::list(vec![Value::Int(1)])).unwrap();

    let first = env.lookup("xs").unwrap();
    if let Value::List(items) = &first {
        items.borrow_mut().push(Value::Int(2));
    }

    // mutating the looked-up copy never touches the stored value
    assert_eq!(env.lookup("xs").unwrap(), Value::list(vec![Value::Int(1)]));
}

#[test]
fn test_referencable_lookup_returns_live_value() {
    let mut env = Environment::new();
    env.define_referencable("xs", Value::list(vec![Value::Int(1)]))
        .unwrap();

    let first = env.lookup("xs").unwrap();
    if let Value::List(items) = &first {
        items.borrow_mut().push(Value::Int(2));
    }

    assert_eq!(
        env.lookup("xs").unwrap(),
        Value::list(vec![Value::Int(1), Value::Int(2)])
    );
}
