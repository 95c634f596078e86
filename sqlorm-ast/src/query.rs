//! `SELECT` statements: table references, joins, ordering and compound
//! operators.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::types::SortDirection;

/// A table reference in a `FROM` or `JOIN` clause, with an optional alias.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableRef {
    /// The table name.
    pub name: String,
    /// The alias introduced for this reference, if any.
    pub alias: Option<String>,
}

impl TableRef {
    /// A bare, unaliased table reference.
    pub fn new(name: impl Into<String>) -> Self {
        TableRef {
            name: name.into(),
            alias: None,
        }
    }

    /// An aliased table reference.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        TableRef {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name a column qualifier should use for this reference: the
    /// alias if present, otherwise the table name.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// The join keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinOperator {
    /// `CROSS JOIN`.
    Cross,
    /// `NATURAL JOIN`.
    Natural,
    /// `INNER JOIN`.
    Inner,
    /// `LEFT JOIN`.
    Left,
    /// `LEFT OUTER JOIN`.
    LeftOuter,
    /// Plain `JOIN`.
    Join,
}

impl core::fmt::Display for JoinOperator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            JoinOperator::Cross => "CROSS JOIN",
            JoinOperator::Natural => "NATURAL JOIN",
            JoinOperator::Inner => "INNER JOIN",
            JoinOperator::Left => "LEFT JOIN",
            JoinOperator::LeftOuter => "LEFT OUTER JOIN",
            JoinOperator::Join => "JOIN",
        })
    }
}

/// The `ON`/`USING` constraint of a join, or none for `CROSS`/`NATURAL`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinConstraint {
    /// `ON <expr>`.
    On(Expr),
    /// `USING (<cols>)`.
    Using(Vec<String>),
    /// No constraint, for `CROSS JOIN` and `NATURAL JOIN`.
    None,
}

/// A single join clause.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Join {
    /// The join keyword.
    pub operator: JoinOperator,
    /// The joined table.
    pub table: TableRef,
    /// The join constraint.
    pub constraint: JoinConstraint,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderByExpr {
    /// The sort key.
    pub expr: Expr,
    /// An optional explicit collation.
    pub collate: Option<String>,
    /// The sort direction.
    pub direction: SortDirection,
}

impl OrderByExpr {
    /// Orders by `expr` with the engine's default direction.
    pub fn new(expr: Expr) -> Self {
        OrderByExpr {
            expr,
            collate: None,
            direction: SortDirection::Unspecified,
        }
    }

    /// Orders ascending.
    pub fn asc(mut self) -> Self {
        self.direction = SortDirection::Ascending;
        self
    }

    /// Orders descending.
    pub fn desc(mut self) -> Self {
        self.direction = SortDirection::Descending;
        self
    }

    /// Orders using the named collation.
    pub fn collate(mut self, name: impl Into<String>) -> Self {
        self.collate = Some(name.into());
        self
    }
}

/// A `LIMIT` clause.
///
/// Supports all three forms the serializer must distinguish: `LIMIT n`,
/// `LIMIT n OFFSET m`, and the implicit-comma form `LIMIT m, n` (where the
/// first number is the offset).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Limit {
    /// The row limit.
    pub limit: Expr,
    /// The offset, if any.
    pub offset: Option<Expr>,
    /// When `true` and `offset` is `Some`, render as `LIMIT offset, limit`
    /// instead of `LIMIT limit OFFSET offset`.
    pub offset_is_implicit: bool,
}

impl Limit {
    /// `LIMIT n`.
    pub fn new(limit: Expr) -> Self {
        Limit {
            limit,
            offset: None,
            offset_is_implicit: false,
        }
    }

    /// `LIMIT n OFFSET m`.
    pub fn with_offset(mut self, offset: Expr) -> Self {
        self.offset = Some(offset);
        self.offset_is_implicit = false;
        self
    }

    /// `LIMIT m, n`.
    pub fn with_implicit_offset(mut self, offset: Expr) -> Self {
        self.offset = Some(offset);
        self.offset_is_implicit = true;
        self
    }
}

/// The compound-select operator joining two query bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompoundOperator {
    /// `UNION`.
    Union,
    /// `UNION ALL`.
    UnionAll,
    /// `INTERSECT`.
    Intersect,
    /// `EXCEPT`.
    Except,
}

impl core::fmt::Display for CompoundOperator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            CompoundOperator::Union => "UNION",
            CompoundOperator::UnionAll => "UNION ALL",
            CompoundOperator::Intersect => "INTERSECT",
            CompoundOperator::Except => "EXCEPT",
        })
    }
}

/// A full `SELECT` query: a single query body, plus an optional chain of
/// compound operators joining it to further bodies.
///
/// `DISTINCT`, `FROM`/`JOIN`, `WHERE`, `GROUP BY`/`HAVING`, `ORDER BY` and
/// `LIMIT` all belong to the first body; a compound operand's own
/// modifiers, if any, live on the nested `Select` in `compound`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Select {
    /// `SELECT DISTINCT` when `true`.
    pub distinct: bool,
    /// The projected column list.
    pub columns: Vec<Expr>,
    /// The primary table, if any (absent only for expression-only selects
    /// such as `SELECT 1`).
    pub from: Option<TableRef>,
    /// Joins applied after `from`.
    pub joins: Vec<Join>,
    /// The `WHERE` condition.
    pub where_clause: Option<Expr>,
    /// The `GROUP BY` key list.
    pub group_by: Vec<Expr>,
    /// The `HAVING` condition.
    pub having: Option<Expr>,
    /// The `ORDER BY` term list.
    pub order_by: Vec<OrderByExpr>,
    /// The `LIMIT` clause.
    pub limit: Option<Limit>,
    /// A following compound operand, if this select is part of a
    /// `UNION`/`UNION ALL`/`INTERSECT`/`EXCEPT` chain.
    pub compound: Option<(CompoundOperator, Box<Select>)>,
}

impl Select {
    /// An empty query body projecting `columns` with no `FROM`.
    pub fn new(columns: Vec<Expr>) -> Self {
        Select {
            columns,
            ..Default::default()
        }
    }

    /// Sets the primary table.
    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    /// Appends a join clause.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Sets the `WHERE` condition.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(condition);
        self
    }

    /// Appends an `ORDER BY` term.
    pub fn order_by(mut self, term: OrderByExpr) -> Self {
        self.order_by.push(term);
        self
    }

    /// Sets the `LIMIT` clause.
    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Chains `other` onto this query with the given compound operator.
    ///
    /// Returns an error-free builder; the constraint that a compound select
    /// may not be combined with extra `WHERE`-style arguments at the facade
    /// level is enforced by the CRUD facade, not by this AST type.
    pub fn compound(mut self, op: CompoundOperator, other: Select) -> Self {
        self.compound = Some((op, Box::new(other)));
        self
    }

    /// `true` if this query is the head of a compound chain.
    pub fn is_compound(&self) -> bool {
        self.compound.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn table_ref_qualifier_prefers_alias() {
        let t = TableRef::aliased("User", "u");
        assert_eq!(t.qualifier(), "u");
        assert_eq!(TableRef::new("User").qualifier(), "User");
    }

    #[test]
    fn join_operator_display() {
        assert_eq!(JoinOperator::LeftOuter.to_string(), "LEFT OUTER JOIN");
    }

    #[test]
    fn select_builder_sets_compound() {
        let a = Select::new(vec![Expr::col("name")]).from(TableRef::new("User"));
        let b = Select::new(vec![Expr::col("name")]).from(TableRef::new("User"));
        let combined = a.compound(CompoundOperator::UnionAll, b);
        assert!(combined.is_compound());
    }
}
