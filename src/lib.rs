pub mod ast;
pub mod builtin;
#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod json;
pub mod operator;
pub mod registry;
pub mod runtime;
pub mod signature;
pub mod value;

pub use ast::{AtomKind, BinOp, Expr, HighFnKind, UnOp};
pub use env::Environment;
pub use error::EvalError;
pub use evaluator::{evaluate, Evaluator};
pub use json::{from_json, to_json};
pub use operator::{BootArgs, ContextRow, Kwargs, Operator, OperatorDef, RowStream};
pub use registry::{Registry, RegistryBuilder};
pub use signature::{ParamSpec, ParamType, Signature};
pub use value::Value;
