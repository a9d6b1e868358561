//! # Sift Query Language - Abstract Syntax Tree
//!
//! This module defines the expression tree a caller submits for
//! evaluation. Queries are not written in a surface syntax; hosts build
//! trees programmatically (or deserialize them from JSON) and hand them to
//! the evaluator.
//!
//! ## Architecture Overview
//!
//! - **[expressions]** - The [`Expr`] node set: literals, operators,
//!   references, scoping forms, and operator calls
//! - **[operators]** - Binary and unary operator symbols
//! - **[render]** - Debug rendering of trees to a readable string
//!
//! ## Core Concepts
//!
//! ### Node set
//!
//! The node set is closed: atoms carrying literal text, binary/unary
//! operations, list/tuple/dict literals, variable and property references,
//! the current-row reference `@`, conditionals, named statements, queries
//! (statement sequences), and three call forms: registered row operators
//! ([`Expr::OpCall`]), the built-in higher-order map/filter
//! ([`Expr::HighFnCall`]), and single-shot scalar functions
//! ([`Expr::FnCall`]).
//!
//! Nodes are immutable pure data; shared subtrees are permitted and the
//! tree is acyclic by construction.
//!
//! ### Statements and queries
//!
//! A query is an ordered list of statements evaluated in one scope; a
//! statement optionally names its result, making it visible to later
//! statements:
//!
//! ```text
//! threshold = 10;
//! rows.filter($input | where: @.count >= threshold)
//! ```
//!
//! ### Static vs. contextual operator arguments
//!
//! Operator kwargs declared *static* evaluate once in the caller's scope;
//! kwargs declared *contextual* re-evaluate for every input row with `@`
//! bound to that row.

pub mod expressions;
pub mod operators;
pub mod render;

pub use expressions::{AtomKind, Expr, HighFnKind};
pub use operators::{BinOp, UnOp};
