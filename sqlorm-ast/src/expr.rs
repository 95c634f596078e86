//! The expression AST.
//!
//! Every node is plain, immutable data: no side effects, no rendering logic.
//! Turning a tree into SQL text is the serializer's job
//! (`sqlorm_core::Serializer`), not this crate's: keeping the two separate
//! is what lets the serializer and the bind walker agree on leaf order
//! without the AST itself knowing anything about placeholders.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::query::Select;
use crate::types::{DataType, Literal};

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnaryOperator {
    /// `-x`.
    Negate,
    /// `NOT x`.
    Not,
}

impl core::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "NOT",
        })
    }
}

/// Binary infix operators: arithmetic, concatenation, comparison and the
/// boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOperator {
    /// `+`.
    Add,
    /// `-`.
    Subtract,
    /// `*`.
    Multiply,
    /// `/`.
    Divide,
    /// `%`.
    Modulo,
    /// `||`.
    Concat,
    /// `=`.
    Eq,
    /// `<>`.
    NotEq,
    /// `<`.
    Lt,
    /// `<=`.
    LtEq,
    /// `>`.
    Gt,
    /// `>=`.
    GtEq,
    /// `AND`.
    And,
    /// `OR`.
    Or,
}

impl core::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Concat => "||",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        })
    }
}

/// The aggregate functions the serializer knows how to render with a
/// trailing space after the keyword (`"COUNT"`, `"AVG"`, ...).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Aggregate {
    /// `COUNT(*)`.
    CountStar,
    /// `COUNT(expr)`.
    Count(Box<Expr>),
    /// `AVG(expr)`.
    Avg(Box<Expr>),
    /// `SUM(expr)`.
    Sum(Box<Expr>),
    /// `TOTAL(expr)`.
    Total(Box<Expr>),
    /// `MIN(expr)`.
    Min(Box<Expr>),
    /// `MAX(expr)`.
    Max(Box<Expr>),
    /// `GROUP_CONCAT(expr)`.
    GroupConcat(Box<Expr>),
    /// `GROUP_CONCAT(expr, separator)`.
    GroupConcatWithSeparator(Box<Expr>, Box<Expr>),
}

/// Which rowid pseudo-column form to reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RowIdKind {
    /// `rowid`.
    RowId,
    /// `oid`.
    Oid,
    /// `_rowid_`.
    Underscored,
}

impl core::fmt::Display for RowIdKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            RowIdKind::RowId => "rowid",
            RowIdKind::Oid => "oid",
            RowIdKind::Underscored => "_rowid_",
        })
    }
}

/// One `WHEN cond THEN result` arm of a [`Expr::Case`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaseBranch {
    /// The condition, or (when the `CASE` has a scrutinee) the value it is
    /// compared against.
    pub when: Expr,
    /// The result if `when` matches.
    pub then: Expr,
}

/// A tagged variant covering every query construct this compiler serializes.
///
/// Every leaf that is a [`Literal`] is bindable: the serializer renders it
/// as `?` and the bind walker visits the tree in the same left-to-right
/// order to supply the actual value. Column references are never bindable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// A bindable literal leaf.
    Literal(Literal),
    /// A column reference, optionally qualified by a table name or alias.
    Column {
        /// The owning table name or alias, when known.
        table: Option<String>,
        /// The column name.
        name: String,
    },
    /// A rowid pseudo-column, optionally table-qualified.
    RowId {
        /// The owning table name or alias, when known.
        table: Option<String>,
        /// Which spelling was requested.
        kind: RowIdKind,
    },
    /// `expr AS alias`.
    Alias {
        /// The aliased expression.
        expr: Box<Expr>,
        /// The alias.
        alias: String,
    },
    /// An aggregate function call.
    Aggregate(Aggregate),
    /// A core scalar function call, e.g. `length(x)`, `coalesce(a, b)`.
    Function {
        /// The function name, rendered verbatim.
        name: String,
        /// Argument expressions.
        args: Vec<Expr>,
    },
    /// A unary operator application.
    UnaryOp {
        /// The operator.
        op: UnaryOperator,
        /// The operand.
        expr: Box<Expr>,
    },
    /// A binary operator application.
    BinaryOp {
        /// The left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOperator,
        /// The right operand.
        right: Box<Expr>,
    },
    /// `expr IS [NOT] NULL`.
    IsNull {
        /// The tested expression.
        expr: Box<Expr>,
        /// `true` for `IS NOT NULL`.
        negated: bool,
    },
    /// `expr [NOT] IN (list...)`.
    InList {
        /// The tested expression.
        expr: Box<Expr>,
        /// The candidate list, each rendered (and, if a literal, bound) in
        /// order.
        list: Vec<Expr>,
        /// `true` for `NOT IN`.
        negated: bool,
    },
    /// `expr [NOT] IN (subquery)`.
    InSubquery {
        /// The tested expression.
        expr: Box<Expr>,
        /// The subquery.
        subquery: Box<Select>,
        /// `true` for `NOT IN`.
        negated: bool,
    },
    /// `expr [NOT] BETWEEN low AND high`.
    Between {
        /// The tested expression.
        expr: Box<Expr>,
        /// The lower bound.
        low: Box<Expr>,
        /// The upper bound.
        high: Box<Expr>,
        /// `true` for `NOT BETWEEN`.
        negated: bool,
    },
    /// `expr [NOT] LIKE pattern`.
    Like {
        /// The tested expression.
        expr: Box<Expr>,
        /// The pattern.
        pattern: Box<Expr>,
        /// `true` for `NOT LIKE`.
        negated: bool,
    },
    /// `[NOT] EXISTS (subquery)`.
    Exists {
        /// The subquery.
        subquery: Box<Select>,
        /// `true` for `NOT EXISTS`.
        negated: bool,
    },
    /// `CAST(expr AS type)`.
    Cast {
        /// The casted expression.
        expr: Box<Expr>,
        /// The target type.
        data_type: DataType,
    },
    /// `CASE [scrutinee] WHEN ... THEN ... [ELSE ...] END`.
    Case {
        /// The optional scrutinee; when present, each branch's `when` is a
        /// value compared against it rather than a boolean condition.
        scrutinee: Option<Box<Expr>>,
        /// The `WHEN ... THEN ...` arms, in order.
        branches: Vec<CaseBranch>,
        /// The `ELSE` result, if any.
        else_result: Option<Box<Expr>>,
    },
    /// `expr COLLATE name`.
    Collate {
        /// The collated expression.
        expr: Box<Expr>,
        /// The collation name.
        collation: String,
    },
    /// A parenthesized subquery used as a scalar expression.
    Subquery(Box<Select>),
}

impl Expr {
    /// Builds a `col = ?` / `col > ?` / ... comparison.
    pub fn compare(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Builds `self AND other`.
    pub fn and(self, other: Expr) -> Expr {
        Expr::compare(self, BinaryOperator::And, other)
    }

    /// Builds `self OR other`.
    pub fn or(self, other: Expr) -> Expr {
        Expr::compare(self, BinaryOperator::Or, other)
    }

    /// Builds `NOT self`.
    pub fn not(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: Box::new(self),
        }
    }

    /// Builds `self AS alias`.
    pub fn alias(self, alias: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    /// An unqualified column reference.
    pub fn col(name: impl Into<String>) -> Expr {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    /// A table-qualified column reference.
    pub fn qualified_col(table: impl Into<String>, name: impl Into<String>) -> Expr {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// A bindable literal leaf.
    pub fn literal(value: impl Into<Literal>) -> Expr {
        Expr::Literal(value.into())
    }
}

impl From<Literal> for Expr {
    fn from(l: Literal) -> Self {
        Expr::Literal(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_operator_display() {
        assert_eq!(BinaryOperator::Eq.to_string(), "=");
        assert_eq!(BinaryOperator::And.to_string(), "AND");
    }

    #[test]
    fn compare_builds_binary_op() {
        let e = Expr::compare(Expr::col("age"), BinaryOperator::Gt, Expr::literal(18i64));
        match e {
            Expr::BinaryOp { op, .. } => assert_eq!(op, BinaryOperator::Gt),
            _ => panic!("expected BinaryOp"),
        }
    }

    #[test]
    fn alias_wraps_expr() {
        let e = Expr::col("name").alias("n");
        match e {
            Expr::Alias { alias, .. } => assert_eq!(alias, "n"),
            _ => panic!("expected Alias"),
        }
    }
}
