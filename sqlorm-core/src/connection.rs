//! Connection and transaction lifecycle management.
//!
//! A [`ConnectionManager`] owns at most one logical connection at a time,
//! matching the single-threaded, single-connection scheduling model: there
//! is no pool and no cross-thread sharing, only the distinction between a
//! *transient* connection (opened for one operation, closed at its end)
//! and a *sticky* one (held across operations because the database is
//! in-memory, a transaction is active, or the caller asked to keep it open
//! forever).

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// `PRAGMA journal_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// `DELETE`.
    Delete,
    /// `TRUNCATE`.
    Truncate,
    /// `PERSIST`.
    Persist,
    /// `MEMORY`.
    Memory,
    /// `WAL`.
    Wal,
    /// `OFF`.
    Off,
}

impl core::fmt::Display for JournalMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        })
    }
}

/// `PRAGMA synchronous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronous {
    /// `OFF`.
    Off,
    /// `NORMAL`.
    Normal,
    /// `FULL`.
    Full,
    /// `EXTRA`.
    Extra,
}

impl core::fmt::Display for Synchronous {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        })
    }
}

type CollationFn = dyn Fn(&str, &str) -> Ordering + Send + Sync;
type OnOpenFn = dyn Fn(&rusqlite::Connection) -> rusqlite::Result<()> + Send + Sync;

/// Connection-level configuration applied by the `on_open` procedure every
/// time a connection transitions from closed to open.
#[derive(Clone, Default)]
pub struct StorageOptions {
    busy_timeout_ms: Option<u32>,
    foreign_keys: Option<bool>,
    journal_mode: Option<JournalMode>,
    synchronous: Option<Synchronous>,
    open_forever: bool,
    collations: Vec<(String, Arc<CollationFn>)>,
    limits: Vec<(rusqlite::limits::Limit, i32)>,
    on_open: Option<Arc<OnOpenFn>>,
}

impl StorageOptions {
    /// Starts from the engine's defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards `ms` to the engine's busy handler on every connection.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Forces the `foreign_keys` PRAGMA explicitly. Leaving this unset lets
    /// the connection manager enable it automatically whenever the catalog
    /// declares at least one foreign key.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = Some(enabled);
        self
    }

    /// Sets `PRAGMA journal_mode`.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = Some(mode);
        self
    }

    /// Sets `PRAGMA synchronous`.
    pub fn synchronous(mut self, mode: Synchronous) -> Self {
        self.synchronous = Some(mode);
        self
    }

    /// Keeps the connection open across operations even when the database
    /// is a file and no transaction is active.
    pub fn open_forever(mut self, enabled: bool) -> Self {
        self.open_forever = enabled;
        self
    }

    /// Registers a named collation, applied on every newly opened
    /// connection.
    pub fn collation(
        mut self,
        name: impl Into<String>,
        compare: impl Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.collations.push((name.into(), Arc::new(compare)));
        self
    }

    /// Applies a per-connection engine limit (`sqlite3_limit`).
    pub fn limit(mut self, limit: rusqlite::limits::Limit, value: i32) -> Self {
        self.limits.push((limit, value));
        self
    }

    /// Runs a user-supplied hook after every other part of `on_open` has
    /// completed.
    pub fn on_open(mut self, hook: impl Fn(&rusqlite::Connection) -> rusqlite::Result<()> + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(hook));
        self
    }
}

/// Opens, caches and closes the underlying SQLite handle, and tracks
/// whether a transaction is currently active.
pub struct ConnectionManager {
    path: String,
    options: StorageOptions,
    has_foreign_keys: bool,
    conn: RefCell<Option<rusqlite::Connection>>,
    sticky: Cell<bool>,
    in_transaction: Cell<bool>,
    cursor_count: Cell<u32>,
}

impl ConnectionManager {
    /// Creates a manager for the database at `path` (`""` or `":memory:"`
    /// for an in-memory database, which is always sticky).
    pub fn new(path: impl Into<String>, options: StorageOptions, has_foreign_keys: bool) -> Self {
        ConnectionManager {
            path: path.into(),
            options,
            has_foreign_keys,
            conn: RefCell::new(None),
            sticky: Cell::new(false),
            in_transaction: Cell::new(false),
            cursor_count: Cell::new(0),
        }
    }

    /// `true` for `""` and `":memory:"`, which are always held sticky.
    pub fn is_memory(&self) -> bool {
        self.path.is_empty() || self.path == ":memory:"
    }

    /// `true` while a transaction is active.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.get()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.conn.borrow().is_some() {
            return Ok(());
        }
        let conn = rusqlite::Connection::open(&self.path)?;
        self.apply_on_open(&conn)?;
        *self.conn.borrow_mut() = Some(conn);
        self.sticky
            .set(self.is_memory() || self.options.open_forever);
        tracing::debug!(path = %self.path, "opened connection");
        Ok(())
    }

    fn apply_on_open(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
        let enable_foreign_keys = self.options.foreign_keys.unwrap_or(self.has_foreign_keys);
        conn.pragma_update(None, "foreign_keys", enable_foreign_keys)?;
        if let Some(mode) = &self.options.journal_mode {
            conn.pragma_update(None, "journal_mode", mode.to_string())?;
        }
        if let Some(sync) = &self.options.synchronous {
            conn.pragma_update(None, "synchronous", sync.to_string())?;
        }
        if let Some(ms) = self.options.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(u64::from(ms)))?;
        }
        for (name, compare) in &self.options.collations {
            let compare = compare.clone();
            conn.create_collation(name, move |a, b| compare(a, b))?;
        }
        for (limit, value) in &self.options.limits {
            conn.set_limit(*limit, *value);
        }
        if let Some(hook) = &self.options.on_open {
            hook(conn)?;
        }
        Ok(())
    }

    /// Closes the connection unconditionally.
    pub fn close(&self) {
        *self.conn.borrow_mut() = None;
        self.sticky.set(false);
        tracing::debug!(path = %self.path, "closed connection");
    }

    /// Opens the connection if necessary, runs `f` against it, and closes
    /// it again afterwards unless it is sticky (in-memory, open-forever,
    /// or inside a transaction).
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> Result<T>,
    ) -> Result<T> {
        self.ensure_open()?;
        let result = {
            let guard = self.conn.borrow();
            let conn = guard.as_ref().expect("just ensured open");
            f(conn)
        };
        if !self.sticky.get() && !self.in_transaction.get() && self.cursor_count.get() == 0 {
            self.close();
        }
        result
    }

    /// Borrows the live connection directly, for callers (namely
    /// [`crate::executor::Cursor`]) that must hold a statement open across
    /// several calls rather than through one [`ConnectionManager::with_connection`]
    /// closure. The manager cannot close or replace the connection while
    /// the returned guard is alive: [`ConnectionManager::close`] requires a
    /// mutable borrow of the same cell.
    pub(crate) fn conn_ref(&self) -> std::cell::Ref<'_, Option<rusqlite::Connection>> {
        self.conn.borrow()
    }

    /// Registers one more open cursor, keeping the connection open even if
    /// it would otherwise be transient.
    pub(crate) fn begin_cursor(&self) -> bool {
        self.ensure_open().is_ok() && {
            let was_sticky = self.sticky.get() || self.in_transaction.get();
            self.cursor_count.set(self.cursor_count.get() + 1);
            !was_sticky
        }
    }

    /// Unregisters a cursor. If it was the last reason a transient
    /// connection stayed open, closes it now.
    pub(crate) fn end_cursor(&self, was_transient: bool) {
        self.cursor_count.set(self.cursor_count.get().saturating_sub(1));
        if was_transient
            && self.cursor_count.get() == 0
            && !self.in_transaction.get()
            && !self.sticky.get()
        {
            self.close();
        }
    }

    /// Starts a transaction. Fails with
    /// [`Error::CannotStartTransactionWithinTransaction`] if one is
    /// already active.
    pub fn begin_transaction(&self) -> Result<()> {
        if self.in_transaction.get() {
            return Err(Error::CannotStartTransactionWithinTransaction);
        }
        self.ensure_open()?;
        self.sticky.set(true);
        {
            let guard = self.conn.borrow();
            guard.as_ref().expect("just ensured open").execute_batch("BEGIN")?;
        }
        self.in_transaction.set(true);
        Ok(())
    }

    /// Commits the active transaction. Fails with
    /// [`Error::NoActiveTransaction`] if none is active.
    pub fn commit(&self) -> Result<()> {
        self.end_transaction("COMMIT")
    }

    /// Rolls back the active transaction. Fails with
    /// [`Error::NoActiveTransaction`] if none is active.
    pub fn rollback(&self) -> Result<()> {
        self.end_transaction("ROLLBACK")
    }

    fn end_transaction(&self, statement: &str) -> Result<()> {
        if !self.in_transaction.get() {
            return Err(Error::NoActiveTransaction);
        }
        {
            let guard = self.conn.borrow();
            guard
                .as_ref()
                .expect("transaction implies open connection")
                .execute_batch(statement)?;
        }
        self.in_transaction.set(false);
        if !self.is_memory() && !self.options.open_forever {
            self.close();
        }
        Ok(())
    }

    /// Runs `f` inside a transaction, committing if it returns `true` and
    /// rolling back if it returns `false`. Returns what `f` returned.
    pub fn transaction(&self, f: impl FnOnce() -> bool) -> Result<bool> {
        self.begin_transaction()?;
        let keep = f();
        if keep {
            self.commit()?;
        } else {
            self.rollback()?;
        }
        Ok(keep)
    }
}
