//! Catalog, serializer, parameter binder, connection manager and schema
//! synchronizer that turn `sqlorm-ast` trees into executed SQLite queries.
//!
//! This crate does the engine-facing half of the mapping: given a
//! [`Catalog`] of registered tables, it renders [`sqlorm_ast::Select`]/
//! [`sqlorm_ast::Expr`] trees to parameterized SQL, binds and steps them
//! against a [`rusqlite::Connection`] managed by [`ConnectionManager`], and
//! keeps the database's schema in line with the catalog via [`sync_schema`].
//! The typed CRUD surface built on top of this lives in the `sqlorm` crate.

mod bind;
mod catalog;
mod connection;
mod error;
mod executor;
mod serializer;
mod sync;

pub use bind::{bind_params, extract_literal};
pub use catalog::{
    AnyTable, Catalog, Column, ColumnConstraint, FieldType, ForeignKeyDescriptor,
    IndexDescriptor, ReferentialAction, Table,
};
pub use connection::{ConnectionManager, JournalMode, StorageOptions, Synchronous};
pub use error::{Error, Result};
pub use executor::{Cursor, StatementExecutor};
pub use serializer::{quote_column, quote_table, validate_column, Rendered, Serializer};
pub use sync::{sync_schema, sync_schema_simulate, SyncStatus};

// Re-exported so downstream crates can depend on `sqlorm-core` alone for the
// full AST vocabulary its own public API is expressed in terms of.
pub use sqlorm_ast;
