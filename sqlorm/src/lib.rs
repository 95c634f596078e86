//! A statically-typed ORM facade over an embedded SQLite database.
//!
//! [`Storage`] is the single entry point: register tables with a
//! [`sqlorm_core::Catalog`], open a storage instance against a database
//! file (or `:memory:`), then use its typed CRUD methods to insert,
//! replace, update, remove, fetch and query rows, plus [`Storage::sync_schema`]
//! to bring the live database in line with the declared tables.
//!
//! ```no_run
//! use sqlorm::{ast::Expr, core::{Catalog, Column, Table}, Storage, StorageOptions};
//!
//! #[derive(Default, Clone, Debug, PartialEq)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     age: i64,
//! }
//!
//! let mut catalog = Catalog::new();
//! catalog.register(
//!     Table::new("User")
//!         .column(Column::new("id", |u: &User| u.id, |u: &mut User, v| u.id = v).primary_key_autoincrement())
//!         .column(Column::new("name", |u: &User| u.name.clone(), |u: &mut User, v| u.name = v))
//!         .column(Column::new("age", |u: &User| u.age, |u: &mut User, v| u.age = v)),
//! );
//!
//! let storage = Storage::open(":memory:", catalog, StorageOptions::new()).unwrap();
//! storage.sync_schema(true).unwrap();
//! let id = storage.insert(&User { id: 0, name: "Alice".into(), age: 30 }).unwrap();
//! let alice: User = storage.get(id).unwrap();
//! assert_eq!(alice.name, "Alice");
//! ```

mod entity;
mod row;
mod storage;

/// The expression AST this facade compiles queries from. Re-exported so
/// callers who need to build [`ast::Expr`]/[`ast::Select`] trees by hand
/// don't have to depend on `sqlorm-ast` directly, mirroring the way the
/// teacher workspace's `usql` crate re-exports `usql_ast as ast`.
pub use sqlorm_ast as ast;
/// The catalog, serializer, executor, connection manager and schema
/// synchronizer this facade is built on, re-exported for callers who need
/// lower-level access (a custom `select`, a hand-built migration).
pub use sqlorm_core as core;

pub use entity::Entity;
pub use row::FromRow;
pub use sqlorm_core::{
    ColumnConstraint, Error, ForeignKeyDescriptor, IndexDescriptor, JournalMode,
    ReferentialAction, Result, Synchronous, SyncStatus,
};
pub use storage::Storage;
// `StorageOptions` is configured the way the rest of this facade configures
// things, so it's re-exported at the crate root even though it lives in
// `sqlorm-core`.
pub use sqlorm_core::StorageOptions;
