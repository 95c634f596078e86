//! Converts an [`Expr`]/[`Select`] tree into parameterized SQL text.
//!
//! Bindable leaves never render as their own value; they render as `?` and
//! are pushed, in the exact order they are visited, onto the
//! [`Rendered::params`] list. Because one recursive pass produces both the
//! SQL text and the parameter list together, the serializer and the bind
//! walker cannot drift out of step the way two independently-written
//! traversals could: [`crate::bind::bind_params`] just plays the list back
//! positionally.

use std::collections::BTreeSet;

use sqlorm_ast::{
    Aggregate, BinaryOperator, CompoundOperator, Expr, Join, JoinConstraint, Literal, Select,
    SortDirection, TableRef, UnaryOperator,
};

use crate::catalog::Catalog;
use crate::error::{Error, Result};

/// The result of serializing an expression or query: the SQL text and the
/// ordered list of values to bind to its `?` placeholders.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    /// The SQL text, with `?` standing in for every bindable leaf.
    pub sql: String,
    /// The bindable values, in the order their placeholders appear in
    /// `sql`.
    pub params: Vec<Literal>,
}

/// Renders AST nodes into SQL text against a [`Catalog`].
pub struct Serializer<'c> {
    catalog: &'c Catalog,
}

impl<'c> Serializer<'c> {
    /// Creates a serializer that resolves column/table names against
    /// `catalog`.
    pub fn new(catalog: &'c Catalog) -> Self {
        Serializer { catalog }
    }

    /// Serializes a standalone expression (no surrounding `SELECT`).
    pub fn serialize(&self, expr: &Expr, no_table_qualifier: bool) -> Result<Rendered> {
        let mut out = String::new();
        let mut params = Vec::new();
        self.write_expr(&mut out, &mut params, expr, no_table_qualifier)?;
        Ok(Rendered { sql: out, params })
    }

    /// Serializes a full `SELECT`, including any compound chain.
    pub fn serialize_select(&self, select: &Select) -> Result<Rendered> {
        let mut out = String::new();
        let mut params = Vec::new();
        self.write_select(&mut out, &mut params, select, true)?;
        Ok(Rendered { sql: out, params })
    }

    /// Returns the set of `(table, alias)` pairs an expression references,
    /// by scanning every column reference it contains.
    pub fn collect_tables(&self, expr: &Expr) -> Vec<String> {
        let mut set = BTreeSet::new();
        collect_tables_inner(expr, &mut set);
        set.into_iter().collect()
    }

    fn write_expr(
        &self,
        out: &mut String,
        params: &mut Vec<Literal>,
        expr: &Expr,
        no_qualifier: bool,
    ) -> Result<()> {
        match expr {
            Expr::Literal(lit) => {
                out.push('?');
                params.push(lit.clone());
            }
            Expr::Column { table, name } => {
                if !no_qualifier {
                    if let Some(table) = table {
                        out.push_str(&quote_table(table));
                        out.push('.');
                    }
                }
                out.push_str(&quote_column(name));
            }
            Expr::RowId { table, kind } => {
                if !no_qualifier {
                    if let Some(table) = table {
                        out.push_str(&quote_table(table));
                        out.push('.');
                    }
                }
                out.push_str(&kind.to_string());
            }
            Expr::Alias { expr, alias } => {
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(" AS ");
                out.push_str(&quote_column(alias));
            }
            Expr::Aggregate(agg) => self.write_aggregate(out, params, agg, no_qualifier)?,
            Expr::Function { name, args } => {
                out.push_str(name);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_expr(out, params, arg, no_qualifier)?;
                }
                out.push(')');
            }
            Expr::UnaryOp { op, expr } => {
                out.push_str(&op.to_string());
                out.push(' ');
                self.write_expr(out, params, expr, no_qualifier)?;
            }
            Expr::BinaryOp { left, op, right } => {
                out.push('(');
                self.write_expr(out, params, left, no_qualifier)?;
                out.push(' ');
                out.push_str(&op.to_string());
                out.push(' ');
                self.write_expr(out, params, right, no_qualifier)?;
                out.push(')');
            }
            Expr::IsNull { expr, negated } => {
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_expr(out, params, item, no_qualifier)?;
                }
                out.push(')');
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                self.write_select(out, params, subquery, false)?;
                out.push(')');
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                self.write_expr(out, params, low, no_qualifier)?;
                out.push_str(" AND ");
                self.write_expr(out, params, high, no_qualifier)?;
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                self.write_expr(out, params, pattern, no_qualifier)?;
            }
            Expr::Exists { subquery, negated } => {
                out.push_str(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                self.write_select(out, params, subquery, false)?;
                out.push(')');
            }
            Expr::Cast { expr, data_type } => {
                out.push_str("CAST(");
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(" AS ");
                out.push_str(&data_type.to_string());
                out.push(')');
            }
            Expr::Case {
                scrutinee,
                branches,
                else_result,
            } => {
                out.push_str("CASE");
                if let Some(scrutinee) = scrutinee {
                    out.push(' ');
                    self.write_expr(out, params, scrutinee, no_qualifier)?;
                }
                for branch in branches {
                    out.push_str(" WHEN ");
                    self.write_expr(out, params, &branch.when, no_qualifier)?;
                    out.push_str(" THEN ");
                    self.write_expr(out, params, &branch.then, no_qualifier)?;
                }
                if let Some(else_result) = else_result {
                    out.push_str(" ELSE ");
                    self.write_expr(out, params, else_result, no_qualifier)?;
                }
                out.push_str(" END");
            }
            Expr::Collate { expr, collation } => {
                self.write_expr(out, params, expr, no_qualifier)?;
                out.push_str(" COLLATE ");
                out.push_str(collation);
            }
            Expr::Subquery(select) => {
                out.push('(');
                self.write_select(out, params, select, false)?;
                out.push(')');
            }
        }
        Ok(())
    }

    fn write_aggregate(
        &self,
        out: &mut String,
        params: &mut Vec<Literal>,
        agg: &Aggregate,
        no_qualifier: bool,
    ) -> Result<()> {
        let (keyword, args): (&str, Vec<&Expr>) = match agg {
            Aggregate::CountStar => {
                out.push_str("COUNT(*)");
                return Ok(());
            }
            Aggregate::Count(e) => ("COUNT", vec![e.as_ref()]),
            Aggregate::Avg(e) => ("AVG", vec![e.as_ref()]),
            Aggregate::Sum(e) => ("SUM", vec![e.as_ref()]),
            Aggregate::Total(e) => ("TOTAL", vec![e.as_ref()]),
            Aggregate::Min(e) => ("MIN", vec![e.as_ref()]),
            Aggregate::Max(e) => ("MAX", vec![e.as_ref()]),
            Aggregate::GroupConcat(e) => ("GROUP_CONCAT", vec![e.as_ref()]),
            Aggregate::GroupConcatWithSeparator(e, sep) => {
                ("GROUP_CONCAT", vec![e.as_ref(), sep.as_ref()])
            }
        };
        out.push_str(keyword);
        out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_expr(out, params, arg, no_qualifier)?;
        }
        out.push(')');
        Ok(())
    }

    fn write_select(
        &self,
        out: &mut String,
        params: &mut Vec<Literal>,
        select: &Select,
        top_level: bool,
    ) -> Result<()> {
        if !top_level {
            out.push('(');
        }

        out.push_str("SELECT ");
        if select.distinct {
            out.push_str("DISTINCT ");
        }
        for (i, col) in select.columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_expr(out, params, col, false)?;
        }

        if let Some(from) = &select.from {
            out.push_str(" FROM ");
            self.write_table_ref(out, from);
            for join in &select.joins {
                out.push(' ');
                self.write_join(out, params, join)?;
            }
        }

        if let Some(where_clause) = &select.where_clause {
            out.push_str(" WHERE ");
            self.write_expr(out, params, where_clause, false)?;
        }

        if !select.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            for (i, e) in select.group_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.write_expr(out, params, e, false)?;
            }
        }

        if let Some(having) = &select.having {
            out.push_str(" HAVING ");
            self.write_expr(out, params, having, false)?;
        }

        if !select.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (i, term) in select.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.write_expr(out, params, &term.expr, false)?;
                if let Some(collation) = &term.collate {
                    out.push_str(" COLLATE ");
                    out.push_str(collation);
                }
                match term.direction {
                    SortDirection::Unspecified => {}
                    SortDirection::Ascending => out.push_str(" ASC"),
                    SortDirection::Descending => out.push_str(" DESC"),
                }
            }
        }

        if let Some(limit) = &select.limit {
            out.push_str(" LIMIT ");
            match (&limit.offset, limit.offset_is_implicit) {
                (Some(offset), true) => {
                    self.write_expr(out, params, offset, false)?;
                    out.push_str(", ");
                    self.write_expr(out, params, &limit.limit, false)?;
                }
                (Some(offset), false) => {
                    self.write_expr(out, params, &limit.limit, false)?;
                    out.push_str(" OFFSET ");
                    self.write_expr(out, params, offset, false)?;
                }
                (None, _) => {
                    self.write_expr(out, params, &limit.limit, false)?;
                }
            }
        }

        if let Some((op, rest)) = &select.compound {
            out.push(' ');
            out.push_str(&op.to_string());
            out.push(' ');
            self.write_select(out, params, rest, true)?;
        }

        if !top_level {
            out.push(')');
        }
        Ok(())
    }

    fn write_table_ref(&self, out: &mut String, table: &TableRef) {
        out.push_str(&quote_table(&table.name));
        if let Some(alias) = &table.alias {
            out.push_str(" AS ");
            out.push_str(&quote_table(alias));
        }
    }

    fn write_join(&self, out: &mut String, params: &mut Vec<Literal>, join: &Join) -> Result<()> {
        out.push_str(&join.operator.to_string());
        out.push(' ');
        self.write_table_ref(out, &join.table);
        match &join.constraint {
            JoinConstraint::On(expr) => {
                out.push_str(" ON ");
                self.write_expr(out, params, expr, false)?;
            }
            JoinConstraint::Using(columns) => {
                out.push_str(" USING (");
                for (i, col) in columns.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&quote_column(col));
                }
                out.push(')');
            }
            JoinConstraint::None => {}
        }
        Ok(())
    }
}

fn collect_tables_inner(expr: &Expr, set: &mut BTreeSet<String>) {
    match expr {
        Expr::Column {
            table: Some(table), ..
        }
        | Expr::RowId {
            table: Some(table), ..
        } => {
            set.insert(table.clone());
        }
        Expr::Alias { expr, .. }
        | Expr::UnaryOp { expr, .. }
        | Expr::IsNull { expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::Collate { expr, .. } => collect_tables_inner(expr, set),
        Expr::BinaryOp { left, right, .. } => {
            collect_tables_inner(left, set);
            collect_tables_inner(right, set);
        }
        Expr::Function { args, .. } => args.iter().for_each(|a| collect_tables_inner(a, set)),
        Expr::Aggregate(agg) => match agg {
            Aggregate::CountStar => {}
            Aggregate::Count(e)
            | Aggregate::Avg(e)
            | Aggregate::Sum(e)
            | Aggregate::Total(e)
            | Aggregate::Min(e)
            | Aggregate::Max(e)
            | Aggregate::GroupConcat(e) => collect_tables_inner(e, set),
            Aggregate::GroupConcatWithSeparator(e, sep) => {
                collect_tables_inner(e, set);
                collect_tables_inner(sep, set);
            }
        },
        Expr::InList { expr, list, .. } => {
            collect_tables_inner(expr, set);
            list.iter().for_each(|e| collect_tables_inner(e, set));
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_tables_inner(expr, set);
            collect_tables_inner(low, set);
            collect_tables_inner(high, set);
        }
        Expr::Like { expr, pattern, .. } => {
            collect_tables_inner(expr, set);
            collect_tables_inner(pattern, set);
        }
        Expr::Case {
            scrutinee,
            branches,
            else_result,
        } => {
            if let Some(s) = scrutinee {
                collect_tables_inner(s, set);
            }
            for branch in branches {
                collect_tables_inner(&branch.when, set);
                collect_tables_inner(&branch.then, set);
            }
            if let Some(e) = else_result {
                collect_tables_inner(e, set);
            }
        }
        Expr::Literal(_)
        | Expr::Column { table: None, .. }
        | Expr::RowId { table: None, .. }
        | Expr::InSubquery { .. }
        | Expr::Exists { .. }
        | Expr::Subquery(_) => {}
    }
}

/// Quotes a table name: single-quoted, with embedded quotes doubled.
pub fn quote_table(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Quotes a column or index name: double-quoted, with embedded quotes
/// doubled.
pub fn quote_column(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Resolves a `(table, column)` pair to a validated column name, failing
/// with [`Error::ColumnNotFound`] if no registered table owns it.
pub fn validate_column(catalog: &Catalog, table: &str, column: &str) -> Result<()> {
    catalog.column_name(table, column).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlorm_ast::{BinaryOperator, Expr, Limit, OrderByExpr};

    fn empty_catalog() -> Catalog {
        Catalog::new()
    }

    #[test]
    fn literal_renders_as_placeholder() {
        let catalog = empty_catalog();
        let serializer = Serializer::new(&catalog);
        let rendered = serializer
            .serialize(&Expr::literal(5i64), false)
            .expect("serialize");
        assert_eq!(rendered.sql, "?");
        assert_eq!(rendered.params, vec![Literal::Integer(5)]);
    }

    #[test]
    fn column_renders_qualified() {
        let catalog = empty_catalog();
        let serializer = Serializer::new(&catalog);
        let rendered = serializer
            .serialize(&Expr::qualified_col("User", "name"), false)
            .expect("serialize");
        assert_eq!(rendered.sql, "'User'.\"name\"");
    }

    #[test]
    fn column_omits_qualifier_when_requested() {
        let catalog = empty_catalog();
        let serializer = Serializer::new(&catalog);
        let rendered = serializer
            .serialize(&Expr::qualified_col("User", "name"), true)
            .expect("serialize");
        assert_eq!(rendered.sql, "\"name\"");
    }

    #[test]
    fn select_renders_where_and_order_by() {
        let catalog = empty_catalog();
        let serializer = Serializer::new(&catalog);
        let select = Select::new(vec![Expr::col("name"), Expr::col("age")])
            .from(TableRef::new("User"))
            .filter(Expr::compare(
                Expr::col("age"),
                BinaryOperator::Gt,
                Expr::literal(18i64),
            ))
            .order_by(OrderByExpr::new(Expr::col("name")).asc());
        let rendered = serializer.serialize_select(&select).expect("serialize");
        assert_eq!(
            rendered.sql,
            "SELECT \"name\", \"age\" FROM 'User' WHERE (\"age\" > ?) ORDER BY \"name\" ASC"
        );
        assert_eq!(rendered.params, vec![Literal::Integer(18)]);
    }

    #[test]
    fn limit_offset_forms() {
        let catalog = empty_catalog();
        let serializer = Serializer::new(&catalog);

        let explicit = Select::new(vec![Expr::col("id")])
            .from(TableRef::new("User"))
            .limit(Limit::new(Expr::literal(10i64)).with_offset(Expr::literal(5i64)));
        let rendered = serializer.serialize_select(&explicit).unwrap();
        assert!(rendered.sql.ends_with("LIMIT ? OFFSET ?"));

        let implicit = Select::new(vec![Expr::col("id")])
            .from(TableRef::new("User"))
            .limit(Limit::new(Expr::literal(10i64)).with_implicit_offset(Expr::literal(5i64)));
        let rendered = serializer.serialize_select(&implicit).unwrap();
        assert!(rendered.sql.ends_with("LIMIT ?, ?"));
    }

    #[test]
    fn compound_select_skips_nested_select_wrapper_parens_only_for_head() {
        let catalog = empty_catalog();
        let serializer = Serializer::new(&catalog);
        let left = Select::new(vec![Expr::col("name")]).from(TableRef::new("User"));
        let right = Select::new(vec![Expr::col("name")]).from(TableRef::new("User"));
        let combined = left.compound(CompoundOperator::UnionAll, right);
        let rendered = serializer.serialize_select(&combined).unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT \"name\" FROM 'User' UNION ALL SELECT \"name\" FROM 'User'"
        );
    }
}
