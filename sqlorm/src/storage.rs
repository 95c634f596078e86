//! The CRUD facade: [`Storage`], the single entry point this crate exists
//! to provide.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};

use sqlorm_ast::{Aggregate, Expr, Limit, Literal, OrderByExpr, Select, TableRef};
use sqlorm_core::{
    quote_column, quote_table, validate_column, AnyTable, Catalog, ConnectionManager, Cursor,
    Error, FieldType, Result, Serializer, StatementExecutor, StorageOptions, SyncStatus,
};

use crate::entity::Entity;
use crate::row::FromRow;

/// A typed ORM facade over one SQLite database.
///
/// Holds the declared [`Catalog`] and the [`ConnectionManager`] that opens,
/// reuses and closes the underlying connection; every method here builds
/// an AST node (or raw DDL), serializes it, and drives it through
/// [`StatementExecutor`]. There is no per-call planning beyond that: this
/// is a thin compiler from typed calls to parameterized SQL, not a query
/// optimizer.
pub struct Storage {
    catalog: Catalog,
    manager: ConnectionManager,
}

impl Storage {
    /// Opens a storage instance against the database at `path` (`""` or
    /// `":memory:"` for an in-memory database).
    ///
    /// Does not touch the database's schema; call [`Storage::sync_schema`]
    /// to bring it in line with `catalog`.
    pub fn open(path: impl Into<String>, catalog: Catalog, options: StorageOptions) -> Result<Self> {
        let has_foreign_keys = catalog.has_foreign_keys();
        let manager = ConnectionManager::new(path, options, has_foreign_keys);
        Ok(Storage { catalog, manager })
    }

    /// The declared catalog this storage instance was opened with.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn executor(&self) -> StatementExecutor<'_> {
        StatementExecutor::new(&self.manager)
    }

    fn serializer(&self) -> Serializer<'_> {
        Serializer::new(&self.catalog)
    }

    fn table<R: Entity>(&self) -> Result<&dyn AnyTable> {
        self.catalog.get_table::<R>()
    }

    // ---------------------------------------------------------------
    // Schema synchronization
    // ---------------------------------------------------------------

    /// Brings the live database's tables and indices in line with the
    /// catalog, table by table in registration order. See
    /// [`sqlorm_core::sync_schema`] for the `preserve` semantics.
    pub fn sync_schema(&self, preserve: bool) -> Result<HashMap<String, SyncStatus>> {
        sqlorm_core::sync_schema(&self.manager, &self.catalog, preserve)
    }

    /// Computes what [`Storage::sync_schema`] would do without executing
    /// any DDL.
    pub fn sync_schema_simulate(&self, preserve: bool) -> Result<HashMap<String, SyncStatus>> {
        sqlorm_core::sync_schema_simulate(&self.manager, &self.catalog, preserve)
    }

    // ---------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------

    /// Starts a transaction. Fails with
    /// [`Error::CannotStartTransactionWithinTransaction`] if one is
    /// already active.
    pub fn begin_transaction(&self) -> Result<()> {
        self.manager.begin_transaction()
    }

    /// Commits the active transaction.
    pub fn commit(&self) -> Result<()> {
        self.manager.commit()
    }

    /// Rolls back the active transaction.
    pub fn rollback(&self) -> Result<()> {
        self.manager.rollback()
    }

    /// Runs `f` inside a transaction, committing if it returns `true` and
    /// rolling back if it returns `false`.
    pub fn transaction(&self, f: impl FnOnce() -> bool) -> Result<bool> {
        self.manager.transaction(f)
    }

    /// Forwards `ms` to the engine's busy handler on the next-opened
    /// connection. Takes effect immediately if a connection is already
    /// open.
    pub fn busy_timeout(&self, ms: u32) -> Result<()> {
        self.manager.with_connection(|conn| {
            conn.busy_timeout(std::time::Duration::from_millis(u64::from(ms)))
                .map_err(Error::from)
        })
    }

    /// Rows changed by the most recent statement on the current connection.
    pub fn changes(&self) -> Result<u64> {
        self.manager.with_connection(|conn| Ok(conn.changes()))
    }

    /// Total rows changed since the connection was opened.
    pub fn total_changes(&self) -> Result<u64> {
        self.manager.with_connection(|conn| Ok(conn.total_changes()))
    }

    // ---------------------------------------------------------------
    // Insert / replace
    // ---------------------------------------------------------------

    /// Inserts `record`, letting the engine assign its rowid: single-column
    /// `PRIMARY KEY` columns are omitted from the column list so the
    /// engine generates one. Composite-key and `WITHOUT ROWID` tables bind
    /// every column. Returns the new rowid.
    pub fn insert<R: Entity>(&self, record: &R) -> Result<i64> {
        let table = self.table::<R>()?;
        let columns = insertable_columns(table);
        self.insert_with_columns_impl(table, record, &columns)
    }

    /// Inserts `record` using only the named columns.
    pub fn insert_with_columns<R: Entity>(&self, record: &R, columns: &[&str]) -> Result<i64> {
        let table = self.table::<R>()?;
        for c in columns {
            validate_column(&self.catalog, table.name(), c)?;
        }
        self.insert_with_columns_impl(table, record, columns)
    }

    fn insert_with_columns_impl<R: Entity>(
        &self,
        table: &dyn AnyTable,
        record: &R,
        columns: &[&str],
    ) -> Result<i64> {
        let values = table.extract(record as &dyn Any, columns)?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_table(table.name()),
            join_quoted(columns),
            placeholders(columns.len()),
        );
        let rowid = self.executor().exec_insert(&sql, &values)?;
        tracing::debug!(table = table.name(), rowid, "inserted row");
        Ok(rowid)
    }

    /// Inserts every record in `records` with a single multi-row `INSERT`,
    /// using the same column list [`Storage::insert`] would. A no-op for an
    /// empty iterator.
    pub fn insert_range<'a, R: Entity + 'a>(
        &self,
        records: impl IntoIterator<Item = &'a R>,
    ) -> Result<()> {
        let table = self.table::<R>()?;
        let columns = insertable_columns(table);
        self.insert_or_replace_range_impl(table, records, &columns, "INSERT")
    }

    /// `REPLACE INTO` for `record`, binding every column including the
    /// primary key.
    pub fn replace<R: Entity>(&self, record: &R) -> Result<()> {
        let table = self.table::<R>()?;
        let columns = table.column_names();
        let values = table.extract(record as &dyn Any, &columns)?;
        let sql = format!(
            "REPLACE INTO {} ({}) VALUES ({})",
            quote_table(table.name()),
            join_quoted(&columns),
            placeholders(columns.len()),
        );
        self.executor().exec_dml(&sql, &values)?;
        tracing::debug!(table = table.name(), "replaced row");
        Ok(())
    }

    /// Batched `REPLACE INTO` for every record in `records`. A no-op for an
    /// empty iterator.
    pub fn replace_range<'a, R: Entity + 'a>(
        &self,
        records: impl IntoIterator<Item = &'a R>,
    ) -> Result<()> {
        let table = self.table::<R>()?;
        let columns = table.column_names();
        self.insert_or_replace_range_impl(table, records, &columns, "REPLACE")
    }

    fn insert_or_replace_range_impl<'a, R: Entity + 'a>(
        &self,
        table: &dyn AnyTable,
        records: impl IntoIterator<Item = &'a R>,
        columns: &[&str],
        verb: &str,
    ) -> Result<()> {
        let records: Vec<&R> = records.into_iter().collect();
        if records.is_empty() {
            return Ok(());
        }
        let row_placeholder = format!("({})", placeholders(columns.len()));
        let sql = format!(
            "{verb} INTO {} ({}) VALUES {}",
            quote_table(table.name()),
            join_quoted(columns),
            (0..records.len())
                .map(|_| row_placeholder.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        let mut params = Vec::with_capacity(records.len() * columns.len());
        for record in &records {
            params.extend(table.extract(*record as &dyn Any, columns)?);
        }
        self.executor().exec_dml(&sql, &params)?;
        tracing::debug!(table = table.name(), rows = records.len(), verb, "batch wrote rows");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Update
    // ---------------------------------------------------------------

    /// `UPDATE ... SET <non-pk columns> = ? ... WHERE <pk columns> = ?`.
    pub fn update<R: Entity>(&self, record: &R) -> Result<()> {
        let table = self.table::<R>()?;
        let pk = table.primary_key();
        if pk.is_empty() {
            return Err(Error::TableHasNoPrimaryKeyColumn(table.name().to_owned()));
        }
        let set_columns: Vec<&str> = table
            .column_names()
            .into_iter()
            .filter(|c| !pk.iter().any(|p| p.as_str() == *c))
            .collect();
        let pk_refs: Vec<&str> = pk.iter().map(String::as_str).collect();

        let set_clause = set_columns
            .iter()
            .map(|c| format!("{} = ?", quote_column(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let where_clause = pk_refs
            .iter()
            .map(|c| format!("{} = ?", quote_column(c)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_table(table.name()),
            set_clause,
            where_clause,
        );

        let mut params = table.extract(record as &dyn Any, &set_columns)?;
        params.extend(table.extract(record as &dyn Any, &pk_refs)?);
        self.executor().exec_dml(&sql, &params)?;
        tracing::debug!(table = table.name(), "updated row");
        Ok(())
    }

    /// Cross-column, multi-row `UPDATE`: `assignments` pairs a column name
    /// with the expression assigned to it, and `condition` is an optional
    /// `WHERE` clause. Fails with [`Error::IncorrectSetFieldsSpecified`] if
    /// `assignments` is empty, or [`Error::TooManyTablesSpecified`] if any
    /// assignment expression references a table other than `R`'s.
    pub fn update_all<R: Entity>(
        &self,
        assignments: Vec<(&str, Expr)>,
        condition: Option<Expr>,
    ) -> Result<()> {
        if assignments.is_empty() {
            return Err(Error::IncorrectSetFieldsSpecified);
        }
        let table = self.table::<R>()?;
        let serializer = self.serializer();
        let mut referenced_tables = BTreeSet::new();
        let mut set_parts = Vec::with_capacity(assignments.len());
        let mut params = Vec::new();

        for (column, expr) in &assignments {
            validate_column(&self.catalog, table.name(), column)?;
            for referenced in serializer.collect_tables(expr) {
                referenced_tables.insert(referenced);
            }
            let rendered = serializer.serialize(expr, false)?;
            set_parts.push(format!("{} = {}", quote_column(column), rendered.sql));
            params.extend(rendered.params);
        }
        referenced_tables.remove(table.name());
        if !referenced_tables.is_empty() {
            return Err(Error::TooManyTablesSpecified);
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_table(table.name()),
            set_parts.join(", "),
        );
        if let Some(condition) = condition {
            let rendered = serializer.serialize(&condition, false)?;
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.sql);
            params.extend(rendered.params);
        }
        self.executor().exec_dml(&sql, &params)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------

    /// Deletes the row whose primary key matches `pk_values`, in declared
    /// primary-key column order.
    pub fn remove<R: Entity>(&self, pk_values: &[Literal]) -> Result<()> {
        let table = self.table::<R>()?;
        let pk = table.primary_key();
        if pk.is_empty() {
            return Err(Error::TableHasNoPrimaryKeyColumn(table.name().to_owned()));
        }
        if pk.len() != pk_values.len() {
            return Err(Error::PrimaryKeyArityMismatch {
                table: table.name().to_owned(),
                expected: pk.len(),
                got: pk_values.len(),
            });
        }
        let where_clause = pk
            .iter()
            .map(|c| format!("{} = ?", quote_column(c)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!("DELETE FROM {} WHERE {}", quote_table(table.name()), where_clause);
        self.executor().exec_dml(&sql, pk_values)?;
        Ok(())
    }

    /// Convenience for a single-column primary key.
    pub fn remove_by_id<R: Entity>(&self, id: impl Into<Literal>) -> Result<()> {
        self.remove::<R>(&[id.into()])
    }

    /// Deletes every row matching `condition` (every row, if `None`).
    pub fn remove_all<R: Entity>(&self, condition: Option<Expr>) -> Result<()> {
        let table = self.table::<R>()?;
        let mut sql = format!("DELETE FROM {}", quote_table(table.name()));
        let mut params = Vec::new();
        if let Some(condition) = condition {
            let rendered = self.serializer().serialize(&condition, false)?;
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.sql);
            params = rendered.params;
        }
        self.executor().exec_dml(&sql, &params)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Fetch
    // ---------------------------------------------------------------

    /// Fetches the row whose primary key matches `pk_values`. Fails with
    /// [`Error::NotFound`] if no row matches.
    pub fn get<R: Entity>(&self, pk_values: impl Into<Literal>) -> Result<R> {
        self.get_composite(&[pk_values.into()])
    }

    /// [`Storage::get`] for a composite primary key.
    pub fn get_composite<R: Entity>(&self, pk_values: &[Literal]) -> Result<R> {
        let table = self.table::<R>()?;
        let (sql, params) = self.by_primary_key_sql(table, pk_values)?;
        let record = self.executor().exec_select_one(&sql, &params, table)?;
        downcast::<R>(record)
    }

    /// Like [`Storage::get`], but returns `None` instead of failing when no
    /// row matches.
    pub fn get_pointer<R: Entity>(&self, pk_values: impl Into<Literal>) -> Result<Option<R>> {
        self.get_pointer_composite(&[pk_values.into()])
    }

    /// [`Storage::get_pointer`] for a composite primary key.
    pub fn get_pointer_composite<R: Entity>(&self, pk_values: &[Literal]) -> Result<Option<R>> {
        let table = self.table::<R>()?;
        let (sql, params) = self.by_primary_key_sql(table, pk_values)?;
        match self.executor().exec_select_optional(&sql, &params, table)? {
            Some(record) => Ok(Some(downcast::<R>(record)?)),
            None => Ok(None),
        }
    }

    fn by_primary_key_sql(
        &self,
        table: &dyn AnyTable,
        pk_values: &[Literal],
    ) -> Result<(String, Vec<Literal>)> {
        let pk = table.primary_key();
        if pk.is_empty() {
            return Err(Error::TableHasNoPrimaryKeyColumn(table.name().to_owned()));
        }
        if pk.len() != pk_values.len() {
            return Err(Error::PrimaryKeyArityMismatch {
                table: table.name().to_owned(),
                expected: pk.len(),
                got: pk_values.len(),
            });
        }
        let where_clause = pk
            .iter()
            .map(|c| format!("{} = ?", quote_column(c)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "SELECT * FROM {} WHERE {}",
            quote_table(table.name()),
            where_clause,
        );
        Ok((sql, pk_values.to_vec()))
    }

    /// Fetches every row matching `condition` (every row, if `None`),
    /// applying `order_by` and `limit` if given.
    pub fn get_all<R: Entity>(
        &self,
        condition: Option<Expr>,
        order_by: Vec<OrderByExpr>,
        limit: Option<Limit>,
    ) -> Result<Vec<R>> {
        let table = self.table::<R>()?;
        let select = self.whole_row_select(table, condition, order_by, limit);
        let rendered = self.serializer().serialize_select(&select)?;
        let rows = self
            .executor()
            .exec_select_all(&rendered.sql, &rendered.params, table)?;
        rows.into_iter().map(downcast::<R>).collect()
    }

    /// Opens a lazy, single-pass cursor over every row matching `condition`.
    pub fn iterate<R: Entity>(&self, condition: Option<Expr>) -> Result<TypedCursor<'_, R>> {
        let table = self.table::<R>()?;
        let select = self.whole_row_select(table, condition, Vec::new(), None);
        let rendered = self.serializer().serialize_select(&select)?;
        let cursor = self
            .executor()
            .iterate(&rendered.sql, &rendered.params, table)?;
        Ok(TypedCursor {
            cursor,
            _marker: std::marker::PhantomData,
        })
    }

    fn whole_row_select(
        &self,
        table: &dyn AnyTable,
        condition: Option<Expr>,
        order_by: Vec<OrderByExpr>,
        limit: Option<Limit>,
    ) -> Select {
        let columns: Vec<Expr> = table.column_names().into_iter().map(Expr::col).collect();
        let mut select = Select::new(columns).from(TableRef::new(table.name().to_owned()));
        if let Some(condition) = condition {
            select = select.filter(condition);
        }
        for term in order_by {
            select = select.order_by(term);
        }
        if let Some(limit) = limit {
            select = select.limit(limit);
        }
        select
    }

    // ---------------------------------------------------------------
    // Arbitrary typed SELECT
    // ---------------------------------------------------------------

    /// Starts a `SELECT` scoped to `R`'s table, projecting `columns`. A
    /// convenience for building a [`Select`] to pass to [`Storage::select`].
    pub fn query<R: Entity>(&self, columns: Vec<Expr>) -> Result<Select> {
        let table = self.table::<R>()?;
        Ok(Select::new(columns).from(TableRef::new(table.name().to_owned())))
    }

    /// Runs an arbitrary `SELECT`, returning one `T` per result row.
    ///
    /// `condition` is ANDed onto the query's own top-level `WHERE` clause;
    /// combining it with a compound (`UNION`/`INTERSECT`/`EXCEPT`) query
    /// fails with [`Error::CompoundSelectWithExtraConditions`], since a
    /// compound's operands already carry their own conditions.
    pub fn select<T: FromRow>(&self, query: Select, condition: Option<Expr>) -> Result<Vec<T>> {
        if query.is_compound() && condition.is_some() {
            return Err(Error::CompoundSelectWithExtraConditions);
        }
        let query = match condition {
            Some(condition) => query.filter(condition),
            None => query,
        };
        let rendered = self.serializer().serialize_select(&query)?;
        let rows = self
            .executor()
            .exec_select_rows(&rendered.sql, &rendered.params)?;
        rows.into_iter().map(T::from_literals).collect()
    }

    // ---------------------------------------------------------------
    // Aggregates
    // ---------------------------------------------------------------

    fn aggregate_scalar<R: Entity>(&self, expr: Expr, condition: Option<Expr>) -> Result<Literal> {
        let table = self.table::<R>()?;
        let mut select = Select::new(vec![expr]).from(TableRef::new(table.name().to_owned()));
        if let Some(condition) = condition {
            select = select.filter(condition);
        }
        let rendered = self.serializer().serialize_select(&select)?;
        let mut rows = self
            .executor()
            .exec_select_scalars(&rendered.sql, &rendered.params)?;
        Ok(rows.pop().unwrap_or(Literal::Null))
    }

    /// `SELECT COUNT(*) FROM <R's table> [WHERE condition]`.
    pub fn count<R: Entity>(&self, condition: Option<Expr>) -> Result<i64> {
        match self.aggregate_scalar::<R>(Expr::Aggregate(Aggregate::CountStar), condition)? {
            Literal::Integer(v) => Ok(v),
            _ => Ok(0),
        }
    }

    /// `SELECT COUNT(column) FROM <R's table> [WHERE condition]`.
    pub fn count_column<R: Entity>(&self, column: Expr, condition: Option<Expr>) -> Result<i64> {
        match self.aggregate_scalar::<R>(
            Expr::Aggregate(Aggregate::Count(Box::new(column))),
            condition,
        )? {
            Literal::Integer(v) => Ok(v),
            _ => Ok(0),
        }
    }

    /// `SELECT AVG(column) FROM <R's table> [WHERE condition]`. `None` on
    /// an empty result set.
    pub fn avg<R: Entity>(&self, column: Expr, condition: Option<Expr>) -> Result<Option<f64>> {
        self.numeric_aggregate::<R>(Aggregate::Avg(Box::new(column)), condition)
    }

    /// `SELECT SUM(column) FROM <R's table> [WHERE condition]`. `None` on
    /// an empty result set.
    pub fn sum<R: Entity>(&self, column: Expr, condition: Option<Expr>) -> Result<Option<f64>> {
        self.numeric_aggregate::<R>(Aggregate::Sum(Box::new(column)), condition)
    }

    /// `SELECT TOTAL(column) FROM <R's table> [WHERE condition]`. Unlike
    /// `SUM`, SQLite's `TOTAL` never returns `NULL` for an empty set: it
    /// returns `0.0`, so this never returns `None`.
    pub fn total<R: Entity>(&self, column: Expr, condition: Option<Expr>) -> Result<f64> {
        match self.aggregate_scalar::<R>(Expr::Aggregate(Aggregate::Total(Box::new(column))), condition)? {
            Literal::Real(v) => Ok(v),
            Literal::Integer(v) => Ok(v as f64),
            _ => Ok(0.0),
        }
    }

    fn numeric_aggregate<R: Entity>(
        &self,
        aggregate: Aggregate,
        condition: Option<Expr>,
    ) -> Result<Option<f64>> {
        match self.aggregate_scalar::<R>(Expr::Aggregate(aggregate), condition)? {
            Literal::Null => Ok(None),
            Literal::Real(v) => Ok(Some(v)),
            Literal::Integer(v) => Ok(Some(v as f64)),
            _ => Ok(None),
        }
    }

    /// `SELECT MIN(column) FROM <R's table> [WHERE condition]`. `None` on
    /// an empty result set.
    pub fn min<R: Entity, T: FieldType>(
        &self,
        column: Expr,
        condition: Option<Expr>,
    ) -> Result<Option<T>> {
        match self.aggregate_scalar::<R>(Expr::Aggregate(Aggregate::Min(Box::new(column))), condition)? {
            Literal::Null => Ok(None),
            other => T::from_literal(other, "min").map(Some),
        }
    }

    /// `SELECT MAX(column) FROM <R's table> [WHERE condition]`. `None` on
    /// an empty result set.
    pub fn max<R: Entity, T: FieldType>(
        &self,
        column: Expr,
        condition: Option<Expr>,
    ) -> Result<Option<T>> {
        match self.aggregate_scalar::<R>(Expr::Aggregate(Aggregate::Max(Box::new(column))), condition)? {
            Literal::Null => Ok(None),
            other => T::from_literal(other, "max").map(Some),
        }
    }

    /// `SELECT GROUP_CONCAT(column[, separator]) FROM <R's table> [WHERE condition]`.
    /// Empty string on an empty result set.
    pub fn group_concat<R: Entity>(
        &self,
        column: Expr,
        separator: Option<&str>,
        condition: Option<Expr>,
    ) -> Result<String> {
        let aggregate = match separator {
            Some(sep) => Aggregate::GroupConcatWithSeparator(
                Box::new(column),
                Box::new(Expr::literal(sep)),
            ),
            None => Aggregate::GroupConcat(Box::new(column)),
        };
        match self.aggregate_scalar::<R>(Expr::Aggregate(aggregate), condition)? {
            Literal::Text(s) => Ok(s),
            Literal::Null => Ok(String::new()),
            other => Ok(format!("{other:?}")),
        }
    }
}

/// A lazy, single-pass cursor over rows of a registered record type `R`,
/// built on top of [`sqlorm_core::Cursor`]'s type-erased rows.
pub struct TypedCursor<'s, R> {
    cursor: Cursor<'s>,
    _marker: std::marker::PhantomData<R>,
}

impl<'s, R: Entity> TypedCursor<'s, R> {
    /// Pulls the next row, if any.
    pub fn next(&mut self) -> Result<Option<R>> {
        match self.cursor.next()? {
            Some(boxed) => downcast::<R>(boxed).map(Some),
            None => Ok(None),
        }
    }
}

fn downcast<R: Entity>(boxed: Box<dyn Any>) -> Result<R> {
    boxed
        .downcast::<R>()
        .map(|b| *b)
        .map_err(|_| Error::TypeNotMapped)
}

fn insertable_columns(table: &dyn AnyTable) -> Vec<&str> {
    let pk = table.primary_key();
    if pk.len() == 1 && !table.without_rowid() {
        table
            .column_names()
            .into_iter()
            .filter(|c| pk[0].as_str() != *c)
            .collect()
    } else {
        table.column_names()
    }
}

fn join_quoted(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| quote_column(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    (0..count).map(|_| "?").collect::<Vec<_>>().join(", ")
}
