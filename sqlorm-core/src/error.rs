//! The domain error enum.
//!
//! Every failure mode from the engine boundary is preserved with its
//! numeric code rather than swallowed; every domain failure (not-found,
//! mis-registered type, malformed `updateAll` call, ...) gets its own
//! variant so callers can match on it instead of string-sniffing a message.

/// Errors raised by the catalog, serializer, executor, schema synchronizer
/// and connection manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `get`/`get` by primary key found no matching row.
    #[error("no row found for the given primary key")]
    NotFound,

    /// A record type passed to a typed operation was never registered with
    /// the catalog.
    #[error("record type is not mapped to any table")]
    TypeNotMapped,

    /// An accessor could not be resolved to a column of any registered
    /// table.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// `get`/`get_pointer` was called on a table with no primary key.
    #[error("table '{0}' has no primary key column")]
    TableHasNoPrimaryKeyColumn(String),

    /// `begin_transaction` was called while a transaction was already open.
    #[error("cannot start a transaction within a transaction")]
    CannotStartTransactionWithinTransaction,

    /// `commit`/`rollback` was called with no transaction in progress.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// `update_all` was given an empty assignment list.
    #[error("no fields specified for update_all")]
    IncorrectSetFieldsSpecified,

    /// `update_all`'s assignments referenced more than one table.
    #[error("update_all assignments reference more than one table")]
    TooManyTablesSpecified,

    /// `select` was given a compound (`UNION`/`INTERSECT`/`EXCEPT`) query
    /// together with an extra top-level condition; a compound's operands
    /// carry their own conditions and cannot accept one bolted on from
    /// outside.
    #[error("a compound select cannot take extra where-arguments")]
    CompoundSelectWithExtraConditions,

    /// `get`/`get_pointer` was asked for a primary key value count that
    /// does not match the table's declared primary key arity.
    #[error("expected {expected} primary key value(s) for table '{table}', got {got}")]
    PrimaryKeyArityMismatch {
        /// The table name.
        table: String,
        /// The declared primary key's column count.
        expected: usize,
        /// The number of values the caller passed.
        got: usize,
    },

    /// A non-nullable column returned `NULL` from the engine.
    #[error("unexpected NULL in non-nullable column '{0}'")]
    UnexpectedNull(String),

    /// `sqlite3_prepare` failed.
    #[error("failed to prepare statement (sqlite code {code:?}): {message}")]
    PrepareFailed {
        /// The engine's numeric error code, when available.
        code: Option<i32>,
        /// The engine's error message.
        message: String,
    },

    /// Binding a parameter failed.
    #[error("failed to bind parameter (sqlite code {code:?}): {message}")]
    BindFailed {
        /// The engine's numeric error code, when available.
        code: Option<i32>,
        /// The engine's error message.
        message: String,
    },

    /// `sqlite3_step` returned an unexpected code.
    #[error("failed to step statement (sqlite code {code:?}): {message}")]
    StepFailed {
        /// The engine's numeric error code, when available.
        code: Option<i32>,
        /// The engine's error message.
        message: String,
    },

    /// A one-shot `exec` (DDL, PRAGMA, introspection) failed.
    #[error("failed to execute statement (sqlite code {code:?}): {message}")]
    ExecFailed {
        /// The engine's numeric error code, when available.
        code: Option<i32>,
        /// The engine's error message.
        message: String,
    },
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => Some(e.extended_code),
            _ => None,
        };
        let message = err.to_string();
        match &err {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::InvalidColumnType(_, name, _) => {
                Error::UnexpectedNull(name.clone())
            }
            _ => Error::StepFailed { code, message },
        }
    }
}

/// The crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
