//! Debug rendering of expression trees.
//!
//! Trees render to a compact, readable form for logs and error reports.
//! The rendering is not a surface syntax and is not meant to be parsed
//! back.

use std::fmt;

use crate::ast::{Expr, HighFnKind};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom { kind, text } => match kind {
                crate::ast::AtomKind::String => write!(f, "\"{}\"", text),
                _ => write!(f, "{}", text),
            },
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Unary { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Expr::List(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Expr::Tuple(items) => {
                write!(f, "(")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
            Expr::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Lookup { base, property } => write!(f, "{}.{}", base, property),
            Expr::At => write!(f, "@"),
            Expr::IfElse {
                condition,
                then_branch,
                else_branch,
            } => write!(
                f,
                "if {} then {} else {}",
                condition, then_branch, else_branch
            ),
            Expr::Statement { name, body } => {
                if name.is_empty() {
                    write!(f, "{}", body)
                } else {
                    write!(f, "{} = {}", name, body)
                }
            }
            Expr::Query(statements) => {
                for (i, stmt) in statements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", stmt)?;
                }
                Ok(())
            }
            Expr::OpCall {
                operands,
                row_vars,
                namespace,
                name,
                kwargs,
            } => {
                write!(f, "{}.{}(", namespace, name)?;
                write_joined(f, operands)?;
                for var in row_vars {
                    write!(f, " as {}", var)?;
                }
                for (key, value) in kwargs {
                    write!(f, " | {}: {}", key, value)?;
                }
                write!(f, ")")
            }
            Expr::HighFnCall {
                kind,
                var,
                lambda,
                iterable,
            } => {
                let form = match kind {
                    HighFnKind::Map => "map",
                    HighFnKind::Filter => "filter",
                };
                write!(f, "{}({} -> {}, {})", form, var, lambda, iterable)
            }
            Expr::FnCall {
                module,
                name,
                kwargs,
            } => {
                write!(f, "{}.{}(", module, name)?;
                for (i, (key, value)) in kwargs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
