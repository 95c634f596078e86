//! Parameter binding and row extraction.
//!
//! The serializer already produces the parameter list in left-to-right
//! placeholder order (see [`crate::serializer`]); this module is the thin
//! layer that hands those values to `rusqlite` and reads engine rows back
//! out as [`Literal`]s.

use sqlorm_ast::Literal;

use crate::error::{Error, Result};

/// Converts a bindable [`Literal`] to the value type `rusqlite` binds.
fn literal_to_sql(value: &Literal) -> rusqlite::types::Value {
    match value {
        Literal::Null => rusqlite::types::Value::Null,
        Literal::Integer(v) => rusqlite::types::Value::Integer(*v),
        Literal::Real(v) => rusqlite::types::Value::Real(*v),
        Literal::Text(v) => rusqlite::types::Value::Text(v.clone()),
        Literal::Blob(v) => rusqlite::types::Value::Blob(v.clone()),
    }
}

/// Binds `params` to `stmt`'s positional placeholders, 1-indexed, in
/// order. Fails with [`Error::BindFailed`] carrying the engine's code if
/// any individual bind call does not succeed.
pub fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Literal]) -> Result<()> {
    for (i, value) in params.iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, literal_to_sql(value))
            .map_err(|err| match err {
                rusqlite::Error::SqliteFailure(e, msg) => Error::BindFailed {
                    code: Some(e.extended_code),
                    message: msg.unwrap_or_else(|| err.to_string()),
                },
                other => Error::BindFailed {
                    code: None,
                    message: other.to_string(),
                },
            })?;
    }
    Ok(())
}

/// Extracts the value at `idx` from `row` as a [`Literal`], preserving
/// `NULL` rather than failing; the caller's [`crate::catalog::FieldType`]
/// impl decides whether `NULL` is acceptable for the target Rust type.
pub fn extract_literal(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Literal> {
    let value: rusqlite::types::Value = row.get(idx)?;
    Ok(match value {
        rusqlite::types::Value::Null => Literal::Null,
        rusqlite::types::Value::Integer(v) => Literal::Integer(v),
        rusqlite::types::Value::Real(v) => Literal::Real(v),
        rusqlite::types::Value::Text(v) => Literal::Text(v),
        rusqlite::types::Value::Blob(v) => Literal::Blob(v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_an_in_memory_connection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (a INTEGER, b TEXT)", [])
            .unwrap();
        {
            let mut stmt = conn.prepare("INSERT INTO t (a, b) VALUES (?, ?)").unwrap();
            bind_params(
                &mut stmt,
                &[Literal::Integer(1), Literal::Text("hi".into())],
            )
            .unwrap();
            stmt.raw_execute().unwrap();
        }
        let mut stmt = conn.prepare("SELECT a, b FROM t").unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(extract_literal(row, 0).unwrap(), Literal::Integer(1));
        assert_eq!(
            extract_literal(row, 1).unwrap(),
            Literal::Text("hi".into())
        );
    }
}
