//! Generic row shapes for [`crate::Storage::select`].
//!
//! `select` projects an arbitrary column list rather than a registered
//! record type, so its result rows need a lighter-weight target than the
//! catalog's `Table`-backed extraction: any single [`sqlorm_core::FieldType`]
//! for a one-column projection, or a tuple of them for a multi-column one.

use sqlorm_ast::Literal;
use sqlorm_core::{Error, FieldType, Result};

/// Reconstructs one projected row from its ordered list of column values.
pub trait FromRow: Sized {
    /// Builds `Self` from `values`, in the order the projection listed its
    /// columns.
    fn from_literals(values: Vec<Literal>) -> Result<Self>;
}

impl<T: FieldType> FromRow for T {
    fn from_literals(values: Vec<Literal>) -> Result<Self> {
        let mut values = values.into_iter();
        let value = values
            .next()
            .ok_or_else(|| Error::ColumnNotFound("<scalar projection>".to_owned()))?;
        T::from_literal(value, "<scalar projection>")
    }
}

macro_rules! impl_from_row_tuple {
    ($($idx:tt => $t:ident),+) => {
        impl<$($t: FieldType),+> FromRow for ($($t,)+) {
            fn from_literals(values: Vec<Literal>) -> Result<Self> {
                let mut values = values.into_iter();
                Ok((
                    $({
                        let value = values.next().ok_or_else(|| {
                            Error::ColumnNotFound(format!("<projection column {}>", $idx))
                        })?;
                        $t::from_literal(value, concat!("<projection column ", $idx, ">"))?
                    },)+
                ))
            }
        }
    };
}

impl_from_row_tuple!(0 => A, 1 => B);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_from_literals() {
        let v = i64::from_literals(vec![Literal::Integer(7)]).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn pair_from_literals() {
        let (name, age) =
            <(String, i64)>::from_literals(vec![Literal::Text("Alice".into()), Literal::Integer(30)])
                .unwrap();
        assert_eq!(name, "Alice");
        assert_eq!(age, 30);
    }
}
