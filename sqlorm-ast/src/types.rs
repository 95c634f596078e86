//! Scalar types shared by every expression node.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bindable scalar value.
///
/// Carries no `Display`/`ToString` implementation on purpose: a literal must
/// never be written into emitted SQL text directly. Every occurrence of a
/// `Literal` in an [`crate::expr::Expr`] tree renders as a `?` placeholder;
/// the value itself travels to the engine through the parameter binder, not
/// through the SQL string. See `sqlorm_core::Serializer` and
/// `sqlorm_core::bind`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    /// SQL `NULL`.
    Null,
    /// A signed integer, covering every integer column width the catalog
    /// supports (narrower widths are range-checked at bind time, not here).
    Integer(i64),
    /// A floating-point value.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// A binary blob.
    Blob(Vec<u8>),
}

impl Literal {
    /// `true` for [`Literal::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Real(v)
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Text(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for Literal {
    fn from(v: Vec<u8>) -> Self {
        Literal::Blob(v)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Literal::Null,
        }
    }
}

/// The declared SQL storage class of a column, or the target type of a
/// `CAST` expression.
///
/// Mirrors SQLite's [type affinity](https://sqlite.org/datatype3.html) rules:
/// every declared type collapses to one of these five affinities plus the
/// `Boolean` convenience alias. `BOOLEAN` carries NUMERIC affinity under
/// SQLite's column-type rules, which still stores and compares the `0`/`1`
/// integers a Rust `bool` round-trips as; it is kept distinct here only so
/// the catalog can print `BOOLEAN` in `CREATE TABLE` text and round-trip a
/// Rust `bool` field without the caller spelling out the affinity by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataType {
    /// `INTEGER`.
    Integer,
    /// `REAL`.
    Real,
    /// `TEXT`.
    Text,
    /// `BLOB`.
    Blob,
    /// `NUMERIC`.
    Numeric,
    /// `BOOLEAN`, stored with `NUMERIC` affinity.
    Boolean,
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
            DataType::Numeric => "NUMERIC",
            DataType::Boolean => "BOOLEAN",
        })
    }
}

/// A tri-state sort direction: unspecified, ascending, or descending.
///
/// Unspecified renders with no keyword at all, matching the serializer rule
/// that `ORDER BY` only emits `ASC`/`DESC` when one was explicitly chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SortDirection {
    /// No explicit direction; the engine's default (`ASC`) applies without
    /// being written out.
    #[default]
    Unspecified,
    /// `ASC`.
    Ascending,
    /// `DESC`.
    Descending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_from_option_collapses_to_null() {
        let none: Option<i64> = None;
        assert_eq!(Literal::from(none), Literal::Null);
        assert_eq!(Literal::from(Some(7i64)), Literal::Integer(7));
    }

    #[test]
    fn data_type_display() {
        assert_eq!(DataType::Integer.to_string(), "INTEGER");
        assert_eq!(DataType::Boolean.to_string(), "BOOLEAN");
    }

    #[test]
    fn sort_direction_default_is_unspecified() {
        assert_eq!(SortDirection::default(), SortDirection::Unspecified);
    }
}
