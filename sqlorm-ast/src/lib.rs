//! Expression AST types for the sqlorm query compiler.
//!
//! This crate is pure data: every node is immutable once built and carries
//! no rendering or execution logic. Turning a tree into parameterized SQL
//! text is `sqlorm-core`'s job; this crate only needs to agree with it on
//! shape.
#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod expr;
mod query;
mod types;

pub use expr::{Aggregate, BinaryOperator, CaseBranch, Expr, RowIdKind, UnaryOperator};
pub use query::{
    CompoundOperator, Join, JoinConstraint, JoinOperator, Limit, OrderByExpr, Select, TableRef,
};
pub use types::{DataType, Literal, SortDirection};
