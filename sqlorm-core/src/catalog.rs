//! The type catalog and table registry.
//!
//! Holds every table a storage facade was constructed with, keyed by
//! the Rust type it maps to, and answers the two questions the rest of the
//! crate needs: "what table backs this record type" and "what SQL name
//! backs this field".

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use sqlorm_ast::{DataType, Literal};

use crate::error::{Error, Result};

/// A constraint attached to a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraint {
    /// `PRIMARY KEY [ASC|DESC] [AUTOINCREMENT]`.
    PrimaryKey {
        /// Explicit sort order on the key, if declared.
        descending: Option<bool>,
        /// `AUTOINCREMENT`.
        autoincrement: bool,
    },
    /// `UNIQUE`.
    Unique,
    /// `DEFAULT <literal>`.
    Default(Literal),
    /// `CHECK <expr>`, stored as raw SQL text.
    Check(String),
    /// `COLLATE <name>`.
    Collate(String),
}

/// A foreign-key constraint from one table's columns to another's.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDescriptor {
    /// Child table column names, in order.
    pub child_columns: Vec<String>,
    /// Parent table name.
    pub parent_table: String,
    /// Parent table column names, in order (same length as
    /// `child_columns`).
    pub parent_columns: Vec<String>,
    /// `ON UPDATE` action.
    pub on_update: ReferentialAction,
    /// `ON DELETE` action.
    pub on_delete: ReferentialAction,
}

/// A foreign key's referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    /// `NO ACTION`.
    #[default]
    NoAction,
    /// `RESTRICT`.
    Restrict,
    /// `SET NULL`.
    SetNull,
    /// `SET DEFAULT`.
    SetDefault,
    /// `CASCADE`.
    Cascade,
}

impl core::fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Cascade => "CASCADE",
        })
    }
}

/// An index over one or more columns of a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    /// The index name.
    pub name: String,
    /// `CREATE UNIQUE INDEX` when `true`.
    pub unique: bool,
    /// The indexed table.
    pub table: String,
    /// The indexed columns, in order.
    pub columns: Vec<String>,
}

/// Maps a Rust value type to its [`sqlorm_ast::DataType`] affinity and
/// bridges it to/from a bindable [`Literal`].
///
/// Implemented for the handful of scalar kinds the catalog supports
/// directly; `Option<T>` lifts any `FieldType` into a nullable column.
pub trait FieldType: Sized {
    /// The storage class this Rust type maps to.
    const DATA_TYPE: DataType;
    /// Whether the column is nullable.
    const NULLABLE: bool;

    /// Converts to a bindable literal.
    fn to_literal(&self) -> Literal;
    /// Converts from an extracted literal, failing with
    /// [`Error::UnexpectedNull`] if a non-nullable type is asked to accept
    /// `NULL`.
    fn from_literal(value: Literal, column: &str) -> Result<Self>;
}

macro_rules! impl_field_type_integer {
    ($($t:ty),*) => {$(
        impl FieldType for $t {
            const DATA_TYPE: DataType = DataType::Integer;
            const NULLABLE: bool = false;

            fn to_literal(&self) -> Literal {
                Literal::Integer(*self as i64)
            }

            fn from_literal(value: Literal, column: &str) -> Result<Self> {
                match value {
                    Literal::Integer(v) => Ok(v as $t),
                    Literal::Null => Err(Error::UnexpectedNull(column.to_owned())),
                    other => Err(Error::UnexpectedNull(format!(
                        "column '{column}' expected INTEGER, got {other:?}"
                    ))),
                }
            }
        }
    )*};
}

impl_field_type_integer!(i8, i16, i32, i64, u8, u16, u32, isize);

impl FieldType for bool {
    const DATA_TYPE: DataType = DataType::Boolean;
    const NULLABLE: bool = false;

    fn to_literal(&self) -> Literal {
        Literal::Integer(if *self { 1 } else { 0 })
    }

    fn from_literal(value: Literal, column: &str) -> Result<Self> {
        match value {
            Literal::Integer(v) => Ok(v != 0),
            Literal::Null => Err(Error::UnexpectedNull(column.to_owned())),
            other => Err(Error::UnexpectedNull(format!(
                "column '{column}' expected BOOLEAN, got {other:?}"
            ))),
        }
    }
}

impl FieldType for f64 {
    const DATA_TYPE: DataType = DataType::Real;
    const NULLABLE: bool = false;

    fn to_literal(&self) -> Literal {
        Literal::Real(*self)
    }

    fn from_literal(value: Literal, column: &str) -> Result<Self> {
        match value {
            Literal::Real(v) => Ok(v),
            Literal::Integer(v) => Ok(v as f64),
            Literal::Null => Err(Error::UnexpectedNull(column.to_owned())),
            other => Err(Error::UnexpectedNull(format!(
                "column '{column}' expected REAL, got {other:?}"
            ))),
        }
    }
}

impl FieldType for String {
    const DATA_TYPE: DataType = DataType::Text;
    const NULLABLE: bool = false;

    fn to_literal(&self) -> Literal {
        Literal::Text(self.clone())
    }

    fn from_literal(value: Literal, column: &str) -> Result<Self> {
        match value {
            Literal::Text(v) => Ok(v),
            Literal::Null => Err(Error::UnexpectedNull(column.to_owned())),
            other => Err(Error::UnexpectedNull(format!(
                "column '{column}' expected TEXT, got {other:?}"
            ))),
        }
    }
}

impl FieldType for Vec<u8> {
    const DATA_TYPE: DataType = DataType::Blob;
    const NULLABLE: bool = false;

    fn to_literal(&self) -> Literal {
        Literal::Blob(self.clone())
    }

    fn from_literal(value: Literal, column: &str) -> Result<Self> {
        match value {
            Literal::Blob(v) => Ok(v),
            Literal::Null => Err(Error::UnexpectedNull(column.to_owned())),
            other => Err(Error::UnexpectedNull(format!(
                "column '{column}' expected BLOB, got {other:?}"
            ))),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const DATA_TYPE: DataType = T::DATA_TYPE;
    const NULLABLE: bool = true;

    fn to_literal(&self) -> Literal {
        match self {
            Some(v) => v.to_literal(),
            None => Literal::Null,
        }
    }

    fn from_literal(value: Literal, column: &str) -> Result<Self> {
        match value {
            Literal::Null => Ok(None),
            other => T::from_literal(other, column).map(Some),
        }
    }
}

/// Object-safe column access, erasing the field type `T` so a [`Table`] can
/// hold columns of differing Rust types in one `Vec`.
trait ColumnErased<R>: Send + Sync {
    fn name(&self) -> &str;
    fn data_type(&self) -> DataType;
    fn nullable(&self) -> bool;
    fn constraints(&self) -> &[ColumnConstraint];
    fn get_literal(&self, record: &R) -> Literal;
    fn set_from_literal(&self, record: &mut R, value: Literal) -> Result<()>;
}

/// A column descriptor: a name, a field type, an accessor pair, and a
/// constraint set.
///
/// The accessor pair is the lens-style substitute for the source's
/// pointer-to-member column identities: `get`/`set` closures paired with
/// the column's SQL name, which also serves as the stable identity
/// compared when the same column is referenced from two different
/// expressions.
pub struct Column<R, T> {
    name: String,
    constraints: Vec<ColumnConstraint>,
    get: Arc<dyn Fn(&R) -> T + Send + Sync>,
    set: Arc<dyn Fn(&mut R, T) + Send + Sync>,
}

impl<R, T> Column<R, T> {
    /// Declares a column backed by a get/set accessor pair.
    pub fn new(
        name: impl Into<String>,
        get: impl Fn(&R) -> T + Send + Sync + 'static,
        set: impl Fn(&mut R, T) + Send + Sync + 'static,
    ) -> Self {
        Column {
            name: name.into(),
            constraints: Vec::new(),
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Adds a constraint.
    pub fn with_constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Declares this column `PRIMARY KEY`.
    pub fn primary_key(self) -> Self {
        self.with_constraint(ColumnConstraint::PrimaryKey {
            descending: None,
            autoincrement: false,
        })
    }

    /// Declares this column `PRIMARY KEY AUTOINCREMENT`.
    pub fn primary_key_autoincrement(self) -> Self {
        self.with_constraint(ColumnConstraint::PrimaryKey {
            descending: None,
            autoincrement: true,
        })
    }

    /// Declares this column `UNIQUE`.
    pub fn unique(self) -> Self {
        self.with_constraint(ColumnConstraint::Unique)
    }

    /// The column's SQL name. Doubles as its stable identity: two
    /// `Column`s naming the same table and field compare equal by name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<R: 'static, T: FieldType + 'static> ColumnErased<R> for Column<R, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn nullable(&self) -> bool {
        T::NULLABLE
    }

    fn constraints(&self) -> &[ColumnConstraint] {
        &self.constraints
    }

    fn get_literal(&self, record: &R) -> Literal {
        (self.get)(record).to_literal()
    }

    fn set_from_literal(&self, record: &mut R, value: Literal) -> Result<()> {
        let typed = T::from_literal(value, &self.name)?;
        (self.set)(record, typed);
        Ok(())
    }
}

/// A table descriptor: name, ordered columns, optional composite primary
/// key, `WITHOUT ROWID` flag, indices and foreign keys.
pub struct Table<R> {
    name: String,
    columns: Vec<Box<dyn ColumnErased<R>>>,
    composite_primary_key: Vec<String>,
    without_rowid: bool,
    indices: Vec<IndexDescriptor>,
    foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl<R: Default + 'static> Table<R> {
    /// Begins declaring a table named `name` with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: Vec::new(),
            composite_primary_key: Vec::new(),
            without_rowid: false,
            indices: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Appends a column.
    pub fn column<T: FieldType + 'static>(mut self, column: Column<R, T>) -> Self {
        self.columns.push(Box::new(column));
        self
    }

    /// Declares a composite primary key over the named columns. Individual
    /// columns in this list must not also carry a single-column `PRIMARY
    /// KEY` constraint.
    pub fn composite_primary_key(mut self, columns: Vec<String>) -> Self {
        self.composite_primary_key = columns;
        self
    }

    /// Sets the `WITHOUT ROWID` flag.
    pub fn without_rowid(mut self) -> Self {
        self.without_rowid = true;
        self
    }

    /// Appends an index.
    pub fn index(mut self, index: IndexDescriptor) -> Self {
        self.indices.push(index);
        self
    }

    /// Appends a foreign key.
    pub fn foreign_key(mut self, fk: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// The single-column primary key name, if the table has exactly one
    /// primary key column (declared either as a column constraint or as a
    /// one-element composite key).
    pub fn single_primary_key_name(&self) -> Option<&str> {
        if self.composite_primary_key.len() == 1 {
            return Some(&self.composite_primary_key[0]);
        }
        if !self.composite_primary_key.is_empty() {
            return None;
        }
        self.columns.iter().find_map(|c| {
            c.constraints()
                .iter()
                .any(|c| matches!(c, ColumnConstraint::PrimaryKey { .. }))
                .then(|| c.name())
        })
    }

    fn primary_key_names(&self) -> Vec<String> {
        if !self.composite_primary_key.is_empty() {
            return self.composite_primary_key.clone();
        }
        self.single_primary_key_name()
            .map(|n| vec![n.to_owned()])
            .unwrap_or_default()
    }
}

/// Object-safe, type-erased view of a [`Table`], letting the catalog hold
/// tables mapping to different Rust record types in one collection.
pub trait AnyTable: Send + Sync {
    /// The table name.
    fn name(&self) -> &str;
    /// Declared column names, in registration order.
    fn column_names(&self) -> Vec<&str>;
    /// A column's declared storage class.
    fn column_data_type(&self, name: &str) -> Option<DataType>;
    /// Whether a column is nullable.
    fn column_nullable(&self, name: &str) -> Option<bool>;
    /// Every constraint on a column.
    fn column_constraints(&self, name: &str) -> Option<&[ColumnConstraint]>;
    /// Primary key column names, empty if the table has none.
    fn primary_key(&self) -> Vec<String>;
    /// The `WITHOUT ROWID` flag.
    fn without_rowid(&self) -> bool;
    /// Declared indices.
    fn indices(&self) -> &[IndexDescriptor];
    /// Declared foreign keys.
    fn foreign_keys(&self) -> &[ForeignKeyDescriptor];
    /// The `TypeId` of the Rust record type this table maps to.
    fn record_type_id(&self) -> TypeId;
    /// Extracts the bindable values for `columns`, in order, from `record`.
    fn extract(&self, record: &dyn Any, columns: &[&str]) -> Result<Vec<Literal>>;
    /// Builds a boxed record from one result row.
    fn build_from_row(&self, row: &rusqlite::Row<'_>) -> rusqlite::Result<Box<dyn Any>>;
}

impl<R: Default + Send + Sync + 'static> AnyTable for Table<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    fn column_data_type(&self, name: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.data_type())
    }

    fn column_nullable(&self, name: &str) -> Option<bool> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.nullable())
    }

    fn column_constraints(&self, name: &str) -> Option<&[ColumnConstraint]> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.constraints())
    }

    fn primary_key(&self) -> Vec<String> {
        self.primary_key_names()
    }

    fn without_rowid(&self) -> bool {
        self.without_rowid
    }

    fn indices(&self) -> &[IndexDescriptor] {
        &self.indices
    }

    fn foreign_keys(&self) -> &[ForeignKeyDescriptor] {
        &self.foreign_keys
    }

    fn record_type_id(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn extract(&self, record: &dyn Any, columns: &[&str]) -> Result<Vec<Literal>> {
        let record = record
            .downcast_ref::<R>()
            .ok_or(Error::TypeNotMapped)?;
        columns
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .find(|c| c.name() == *name)
                    .map(|c| c.get_literal(record))
                    .ok_or_else(|| Error::ColumnNotFound((*name).to_owned()))
            })
            .collect()
    }

    fn build_from_row(&self, row: &rusqlite::Row<'_>) -> rusqlite::Result<Box<dyn Any>> {
        let mut record = R::default();
        for column in &self.columns {
            let idx = row.as_ref().column_index(column.name())?;
            let value = crate::bind::extract_literal(row, idx)?;
            column
                .set_from_literal(&mut record, value)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        }
        Ok(Box::new(record))
    }
}

/// The set of tables declared at storage construction time.
///
/// Registration order is preserved and used as the deterministic order for
/// `sync_schema` and any multi-table DDL.
#[derive(Default)]
pub struct Catalog {
    order: Vec<TypeId>,
    tables: HashMap<TypeId, Box<dyn AnyTable>>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Registers a table. Tables are visited in registration order by
    /// [`Catalog::for_each`] and by schema synchronization.
    pub fn register<R: Default + Send + Sync + 'static>(&mut self, table: Table<R>) {
        let id = TypeId::of::<R>();
        self.order.push(id);
        self.tables.insert(id, Box::new(table));
    }

    /// Looks up the table name for `R`, if registered.
    pub fn find_table_name<R: 'static>(&self) -> Option<&str> {
        self.tables.get(&TypeId::of::<R>()).map(|t| t.name())
    }

    /// Looks up the table descriptor for `R`.
    pub fn get_table<R: 'static>(&self) -> Result<&dyn AnyTable> {
        self.tables
            .get(&TypeId::of::<R>())
            .map(|t| t.as_ref())
            .ok_or(Error::TypeNotMapped)
    }

    /// Looks up the table descriptor by name.
    pub fn get_table_by_name(&self, name: &str) -> Option<&dyn AnyTable> {
        self.order
            .iter()
            .filter_map(|id| self.tables.get(id))
            .map(|t| t.as_ref())
            .find(|t| t.name() == name)
    }

    /// Resolves a column accessor (here, a `(table, column)` name pair) to
    /// its SQL column name, failing with [`Error::ColumnNotFound`] if no
    /// registered table owns it.
    pub fn column_name(&self, table: &str, column: &str) -> Result<String> {
        let table = self
            .get_table_by_name(table)
            .ok_or_else(|| Error::ColumnNotFound(format!("{table}.{column}")))?;
        table
            .column_names()
            .into_iter()
            .find(|c| *c == column)
            .map(|c| c.to_owned())
            .ok_or_else(|| Error::ColumnNotFound(format!("{table}.{column}", table = table.name())))
    }

    /// Visits every registered table in registration order.
    pub fn for_each(&self, mut f: impl FnMut(&dyn AnyTable)) {
        for id in &self.order {
            if let Some(table) = self.tables.get(id) {
                f(table.as_ref());
            }
        }
    }

    /// `true` if any registered table declares at least one foreign key;
    /// used by [`crate::connection::ConnectionManager`] to decide whether
    /// `PRAGMA foreign_keys` defaults on when [`crate::connection::StorageOptions`]
    /// doesn't say explicitly.
    pub fn has_foreign_keys(&self) -> bool {
        self.order
            .iter()
            .filter_map(|id| self.tables.get(id))
            .any(|t| !t.foreign_keys().is_empty())
    }
}
