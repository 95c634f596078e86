//! Prepares, binds, steps and finalizes statements; maps engine return
//! codes to typed errors; exposes a lazy row iterator.

use std::any::Any;
use std::cell::Ref;

use sqlorm_ast::Literal;

use crate::bind::{bind_params, extract_literal};
use crate::catalog::AnyTable;
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};

/// Executes parameterized SQL against a [`ConnectionManager`].
///
/// Every method here acquires or reuses a connection, prepares the
/// statement, binds `params` in order, steps it to completion, and
/// releases the connection again unless it is sticky, the pattern
/// followed throughout this module, expressed as RAII over
/// [`ConnectionManager::with_connection`] rather than a manual
/// try/finally.
pub struct StatementExecutor<'m> {
    manager: &'m ConnectionManager,
}

impl<'m> StatementExecutor<'m> {
    /// Creates an executor bound to `manager`.
    pub fn new(manager: &'m ConnectionManager) -> Self {
        StatementExecutor { manager }
    }

    /// Runs a one-shot DDL/PRAGMA/introspection statement with no
    /// parameters and no result rows.
    pub fn exec_batch(&self, sql: &str) -> Result<()> {
        self.manager.with_connection(|conn| {
            conn.execute_batch(sql).map_err(|err| match err {
                rusqlite::Error::SqliteFailure(e, msg) => Error::ExecFailed {
                    code: Some(e.extended_code),
                    message: msg.unwrap_or_else(|| err.to_string()),
                },
                other => Error::ExecFailed {
                    code: None,
                    message: other.to_string(),
                },
            })
        })
    }

    /// Runs a single DML statement (`INSERT`/`UPDATE`/`DELETE`/batched
    /// variants), returning the number of rows changed.
    pub fn exec_dml(&self, sql: &str, params: &[Literal]) -> Result<usize> {
        self.manager.with_connection(|conn| {
            let mut stmt = prepare(conn, sql)?;
            bind_params(&mut stmt, params)?;
            step_to_done(&mut stmt)?;
            Ok(conn.changes() as usize)
        })
    }

    /// Runs an `INSERT`, returning `last_insert_rowid()`.
    pub fn exec_insert(&self, sql: &str, params: &[Literal]) -> Result<i64> {
        self.manager.with_connection(|conn| {
            let mut stmt = prepare(conn, sql)?;
            bind_params(&mut stmt, params)?;
            step_to_done(&mut stmt)?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Runs a single-row `SELECT`, expecting exactly one row. Fails with
    /// [`Error::NotFound`] if the first step is already `DONE`.
    pub fn exec_select_one(
        &self,
        sql: &str,
        params: &[Literal],
        table: &dyn AnyTable,
    ) -> Result<Box<dyn Any>> {
        self.manager.with_connection(|conn| {
            let mut stmt = prepare(conn, sql)?;
            bind_params(&mut stmt, params)?;
            let mut rows = stmt.raw_query();
            match rows.next()? {
                Some(row) => Ok(table.build_from_row(row)?),
                None => Err(Error::NotFound),
            }
        })
    }

    /// Runs a single-row `SELECT`, returning `None` instead of failing
    /// when no row matches (`getPointer`).
    pub fn exec_select_optional(
        &self,
        sql: &str,
        params: &[Literal],
        table: &dyn AnyTable,
    ) -> Result<Option<Box<dyn Any>>> {
        self.manager.with_connection(|conn| {
            let mut stmt = prepare(conn, sql)?;
            bind_params(&mut stmt, params)?;
            let mut rows = stmt.raw_query();
            match rows.next()? {
                Some(row) => Ok(Some(table.build_from_row(row)?)),
                None => Ok(None),
            }
        })
    }

    /// Runs a multi-row `SELECT`, draining every row eagerly (`getAll`).
    pub fn exec_select_all(
        &self,
        sql: &str,
        params: &[Literal],
        table: &dyn AnyTable,
    ) -> Result<Vec<Box<dyn Any>>> {
        self.manager.with_connection(|conn| {
            let mut stmt = prepare(conn, sql)?;
            bind_params(&mut stmt, params)?;
            let mut rows = stmt.raw_query();
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(table.build_from_row(row)?);
            }
            Ok(out)
        })
    }

    /// Runs a `SELECT` of a single scalar column, draining every row
    /// eagerly. Used for `select(expr, ...)` and the aggregate family.
    pub fn exec_select_scalars(&self, sql: &str, params: &[Literal]) -> Result<Vec<Literal>> {
        self.manager.with_connection(|conn| {
            let mut stmt = prepare(conn, sql)?;
            bind_params(&mut stmt, params)?;
            let mut rows = stmt.raw_query();
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(extract_literal(row, 0)?);
            }
            Ok(out)
        })
    }

    /// Runs a `SELECT` of an arbitrary column list, draining every row
    /// eagerly and returning each row as a same-length `Vec<Literal>`. Used
    /// by the CRUD facade's generic `select` for projections that don't
    /// map onto a registered record type.
    pub fn exec_select_rows(&self, sql: &str, params: &[Literal]) -> Result<Vec<Vec<Literal>>> {
        self.manager.with_connection(|conn| {
            let mut stmt = prepare(conn, sql)?;
            bind_params(&mut stmt, params)?;
            let column_count = stmt.column_count();
            let mut rows = stmt.raw_query();
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for idx in 0..column_count {
                    values.push(extract_literal(row, idx)?);
                }
                out.push(values);
            }
            Ok(out)
        })
    }

    /// Opens a lazy, single-pass cursor over a multi-row `SELECT`
    /// (`iterate`). The cursor owns the prepared statement and finalizes
    /// it on drop or exhaustion; if the underlying connection would
    /// otherwise be transient, the cursor keeps it open until then.
    ///
    /// Borrows `self` only long enough to read the `manager` field: the
    /// returned cursor's lifetime is tied to `'m`, the executor's own
    /// `ConnectionManager` borrow, not to how long this `StatementExecutor`
    /// value itself stays around. That lets a caller build a short-lived
    /// `StatementExecutor` (e.g. `StatementExecutor::new(&self.manager)` as
    /// a one-off expression) and still return a cursor that outlives it.
    pub fn iterate(&self, sql: &str, params: &[Literal], table: &'m dyn AnyTable) -> Result<Cursor<'m>> {
        Cursor::open(self.manager, table, sql, params)
    }
}

fn prepare<'c>(conn: &'c rusqlite::Connection, sql: &str) -> Result<rusqlite::Statement<'c>> {
    conn.prepare(sql).map_err(|err| match err {
        rusqlite::Error::SqliteFailure(e, msg) => Error::PrepareFailed {
            code: Some(e.extended_code),
            message: msg.unwrap_or_else(|| err.to_string()),
        },
        other => Error::PrepareFailed {
            code: None,
            message: other.to_string(),
        },
    })
}

fn step_to_done(stmt: &mut rusqlite::Statement<'_>) -> Result<()> {
    // `raw_execute` steps once and expects `DONE`; any other code (most
    // notably `ROW`, which would mean the caller ran a SELECT through a
    // DML path) surfaces as a `StepFailed`.
    stmt.raw_execute().map(|_| ()).map_err(|err| match err {
        rusqlite::Error::SqliteFailure(e, msg) => Error::StepFailed {
            code: Some(e.extended_code),
            message: msg.unwrap_or_else(|| err.to_string()),
        },
        other => Error::StepFailed {
            code: None,
            message: other.to_string(),
        },
    })
}

/// A lazy, single-pass, non-restartable cursor over the rows of a prepared
/// `SELECT`.
///
/// Rows reflect the state of the database at the moment the statement was
/// prepared, the same guarantee `rusqlite`'s own blocking step loop gives:
/// writes made through other statements on the same connection after
/// `iterate` was called are not retroactively visible to rows already
/// stepped past, matching SQLite's own cursor-stability rules.
pub struct Cursor<'s> {
    // Holding this shared borrow for the cursor's whole life is what stops
    // `ConnectionManager::close` (which needs a mutable borrow of the same
    // cell) from running out from under `stmt`/`rows` while rows are still
    // being pulled.
    guard: Option<Ref<'s, Option<rusqlite::Connection>>>,
    // Boxed so the `Statement` has a stable heap address: `rows` borrows
    // from it, and this struct would otherwise be self-referential the
    // moment it is moved (e.g. returned from `open`).
    stmt: Option<Box<rusqlite::Statement<'s>>>,
    rows: Option<rusqlite::Rows<'s>>,
    table: &'s dyn AnyTable,
    manager: &'s ConnectionManager,
    transient: bool,
    finished: bool,
}

impl<'s> Cursor<'s> {
    fn open(
        manager: &'s ConnectionManager,
        table: &'s dyn AnyTable,
        sql: &str,
        params: &[Literal],
    ) -> Result<Self> {
        manager.ensure_open()?;
        let transient = manager.begin_cursor();
        let guard = manager.conn_ref();
        let conn_ptr: *const rusqlite::Connection = guard
            .as_ref()
            .expect("ensure_open just populated the connection")
            as *const _;
        // SAFETY: `guard` (held in this struct) keeps a shared borrow of
        // the cell alive for as long as `'s`, so `ConnectionManager` cannot
        // obtain the mutable borrow `close`/`ensure_open` need to replace
        // or drop the `Connection` while `stmt`/`rows` below still point
        // into it. The `Connection`'s address is stable because it lives
        // inside the `RefCell` owned by `manager: &'s ConnectionManager`,
        // which by the lifetime `'s` is guaranteed not to move or be
        // dropped before this cursor is.
        let conn: &'s rusqlite::Connection = unsafe { &*conn_ptr };
        let mut stmt = Box::new(prepare(conn, sql)?);
        bind_params(&mut stmt, params)?;
        let stmt_ptr: *mut rusqlite::Statement<'s> = stmt.as_mut() as *mut _;
        // SAFETY: `stmt` is heap-boxed and stored in this struct, never
        // moved or reallocated; `finish` always drops `rows` before
        // `stmt`, so the borrow `rows` performs here never outlives its
        // target.
        let stmt_ref: &'s mut rusqlite::Statement<'s> = unsafe { &mut *stmt_ptr };
        let rows = stmt_ref.raw_query();
        Ok(Cursor {
            guard: Some(guard),
            stmt: Some(stmt),
            rows: Some(rows),
            table,
            manager,
            transient,
            finished: false,
        })
    }

    /// Pulls the next row, if any.
    pub fn next(&mut self) -> Result<Option<Box<dyn Any>>> {
        if self.finished {
            return Ok(None);
        }
        let rows = self.rows.as_mut().expect("cursor not yet finished");
        match rows.next()? {
            Some(row) => Ok(Some(self.table.build_from_row(row)?)),
            None => {
                self.finish();
                Ok(None)
            }
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.rows.take();
        self.stmt.take();
        self.guard.take();
        self.manager.end_cursor(self.transient);
    }
}

impl<'s> Drop for Cursor<'s> {
    fn drop(&mut self) {
        self.finish();
    }
}
