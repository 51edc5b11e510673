//! SQL generation.
//!
//! Renders the accumulated state of a [`Query`] into a statement. The
//! generator trusts the accumulator: everything it reads was validated when
//! it was added. Empty clauses are omitted entirely.

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::item::{ClauseItem, Condition, Connector, DataType};
use crate::query::{GroupDirective, Query, QueryType};
use crate::value::Scalar;

/// Rendering options shared by every item of one statement.
struct Context<'a, D: Dialect> {
    dialect: &'a D,
    /// Alias given to unprefixed columns when several tables are involved.
    default_prefix: Option<&'a str>,
    /// Drop column prefixes (single-table insert/update/delete).
    strip_prefix: bool,
}

impl<D: Dialect> Context<'_, D> {
    fn item(&self, item: &ClauseItem) -> String {
        match item.data_type {
            DataType::Column => self.column(item),
            DataType::Special => item
                .value
                .as_ref()
                .map_or_else(|| item.name.clone(), Scalar::as_text),
            _ => self.literal(item.value.as_ref(), &item.data_type),
        }
    }

    fn column(&self, item: &ClauseItem) -> String {
        let prefix = if self.strip_prefix {
            ""
        } else if !item.prefix.is_empty() {
            item.prefix.as_str()
        } else if item.name == "*" {
            ""
        } else {
            self.default_prefix.unwrap_or("")
        };
        self.dialect.quote_and_prefix(&item.name, prefix)
    }

    fn literal(&self, value: Option<&Scalar>, data_type: &DataType) -> String {
        match value {
            None | Some(Scalar::Null) => String::from("NULL"),
            Some(value) if data_type.is_numeric() && is_numeric(value) => value.as_text(),
            Some(value) => self.dialect.quote_value(&value.as_text()),
        }
    }

    fn selected(&self, item: &ClauseItem) -> String {
        let rendered = self.item(item);
        match &item.alias {
            Some(alias) => format!("{rendered} AS {}", self.dialect.quote_identifier(alias)),
            None => rendered,
        }
    }

    fn ordered(&self, item: &ClauseItem) -> String {
        let rendered = self.item(item);
        match item.direction {
            Some(direction) => format!("{rendered} {}", direction.as_sql()),
            None => rendered,
        }
    }

    fn table(&self, item: &ClauseItem) -> String {
        let table = self.dialect.quote_identifier(&item.name);
        match &item.alias {
            Some(alias) => format!("{table} AS {}", self.dialect.quote_identifier(alias)),
            None => table,
        }
    }

    fn condition(&self, condition: &Condition) -> String {
        let left = self.item(&condition.left);
        let right = if condition.is_in_list() && condition.right.data_type != DataType::Column {
            self.in_list(&condition.right)
        } else {
            self.item(&condition.right)
        };
        format!("{left} {} {right}", condition.operator)
    }

    fn in_list(&self, item: &ClauseItem) -> String {
        let values: Vec<String> = match &item.value {
            Some(Scalar::Text(text)) => text
                .split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(|piece| {
                    self.literal(Some(&Scalar::Text(piece.to_string())), &item.data_type)
                })
                .collect(),
            other => vec![self.literal(other.as_ref(), &item.data_type)],
        };
        self.dialect.value_list(&values)
    }

    /// Renders conditions bucketed by group.
    ///
    /// Registered groups come first in registration order, followed by
    /// unregistered groups in order of first use. Buckets are parenthesised
    /// only when more than one is non-empty.
    fn grouped(&self, groups: &[GroupDirective], conditions: &[Condition]) -> Option<String> {
        let mut buckets: Vec<(&str, Connector, Vec<&Condition>)> = groups
            .iter()
            .map(|g| (g.group.as_str(), g.connector, Vec::new()))
            .collect();

        for condition in conditions {
            let group = condition.group.as_str();
            match buckets.iter_mut().find(|(name, _, _)| *name == group) {
                Some((_, _, members)) => members.push(condition),
                None => buckets.push((group, Connector::And, vec![condition])),
            }
        }
        buckets.retain(|(_, _, members)| !members.is_empty());

        if buckets.is_empty() {
            return None;
        }

        let wrap = buckets.len() > 1;
        let mut sql = String::new();
        for (index, (_, connector, members)) in buckets.iter().enumerate() {
            if index > 0 {
                sql.push(' ');
                sql.push_str(connector.as_sql());
                sql.push(' ');
            }

            let mut bucket = String::new();
            for (position, condition) in members.iter().enumerate() {
                if position > 0 {
                    bucket.push(' ');
                    bucket.push_str(condition.connector.as_sql());
                    bucket.push(' ');
                }
                bucket.push_str(&self.condition(condition));
            }

            if wrap {
                sql.push('(');
                sql.push_str(&bucket);
                sql.push(')');
            } else {
                sql.push_str(&bucket);
            }
        }
        Some(sql)
    }
}

fn is_numeric(value: &Scalar) -> bool {
    match value {
        Scalar::Int(_) | Scalar::Float(_) | Scalar::Bool(_) => true,
        Scalar::Text(text) => text.trim().parse::<f64>().is_ok(),
        Scalar::Null => false,
    }
}

impl<D: Dialect> Query<D> {
    /// Renders the accumulated state as a SQL statement.
    ///
    /// Fails only when an insert, update, delete or exec statement has no
    /// target table, or when an insert or update has no columns.
    pub fn render_sql(&self) -> Result<String> {
        let sql = match self.query_type {
            QueryType::Select => self.render_select(),
            QueryType::Insert => self.render_insert()?,
            QueryType::InsertFrom => self.render_insert_from()?,
            QueryType::Update => self.render_update()?,
            QueryType::Delete => self.render_delete()?,
            QueryType::Exec => self.render_exec()?,
        };
        debug!(sql = %sql, "Rendered statement");
        Ok(sql)
    }

    fn context(&self, strip_prefix: bool) -> Context<'_, D> {
        let default_prefix = if self.from.len() > 1 {
            self.primary_from()
                .and_then(|item| item.alias.as_deref())
        } else {
            None
        };
        Context {
            dialect: &self.dialect,
            default_prefix,
            strip_prefix,
        }
    }

    /// FROM entries with the primary table first.
    fn ordered_from(&self) -> Vec<&ClauseItem> {
        let mut entries: Vec<&ClauseItem> = Vec::with_capacity(self.from.len());
        if let Some(primary) = self.primary_from() {
            entries.push(primary);
        }
        for (index, (_, item)) in self.from.iter().enumerate() {
            if Some(index) != self.primary_from {
                entries.push(item);
            }
        }
        entries
    }

    fn target_table(&self, statement: &str) -> Result<String> {
        let table = match (self.query_type, &self.insert_into) {
            (QueryType::Insert | QueryType::InsertFrom, Some(table)) => Some(table.clone()),
            _ => self.primary_from().map(|item| item.name.clone()),
        };
        table.ok_or_else(|| QueryError::Incomplete(format!("{statement} requires a table")))
    }

    fn render_select(&self) -> String {
        let ctx = self.context(false);
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self.columns().map(|c| ctx.selected(c)).collect();
            sql.push_str(&columns.join(", "));
        }

        self.push_select_tail(&ctx, &mut sql);
        sql
    }

    /// Appends FROM through the paging clause, each only when non-empty.
    fn push_select_tail(&self, ctx: &Context<'_, D>, sql: &mut String) {
        if !self.from.is_empty() {
            let tables: Vec<String> = self
                .ordered_from()
                .into_iter()
                .map(|t| ctx.table(t))
                .collect();
            sql.push_str(" FROM ");
            sql.push_str(&tables.join(", "));
        }

        if let Some(predicate) = ctx.grouped(&self.where_groups, &self.where_conditions) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }

        if !self.group_by.is_empty() {
            let columns: Vec<String> = self.group_by.iter().map(|c| ctx.item(c)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&columns.join(", "));
        }

        if let Some(predicate) = ctx.grouped(&self.having_groups, &self.having_conditions) {
            sql.push_str(" HAVING ");
            sql.push_str(&predicate);
        }

        if !self.order_by.is_empty() {
            let columns: Vec<String> = self.order_by.iter().map(|c| ctx.ordered(c)).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&columns.join(", "));
        }

        if self.offset > 0 || self.limit > 0 {
            sql.push(' ');
            sql.push_str(&self.dialect.limit_clause(self.offset, self.limit));
        }
    }

    fn require_columns(&self, statement: &str) -> Result<()> {
        if self.columns.is_empty() {
            return Err(QueryError::Incomplete(format!(
                "{statement} requires at least one column"
            )));
        }
        Ok(())
    }

    fn render_insert(&self) -> Result<String> {
        let table = self.target_table("insert")?;
        self.require_columns("insert")?;
        let ctx = self.context(true);

        let names: Vec<String> = self
            .columns()
            .map(|c| self.dialect.quote_identifier(&c.name))
            .collect();
        let values: Vec<String> = self.columns().map(|c| ctx.item(c)).collect();

        Ok(format!(
            "INSERT INTO {} ( {} ) VALUES ( {} )",
            self.dialect.quote_identifier(&table),
            names.join(", "),
            values.join(", ")
        ))
    }

    fn render_insert_from(&self) -> Result<String> {
        let table = self.target_table("insert from")?;
        self.require_columns("insert from")?;
        let ctx = self.context(false);

        let targets: Vec<String> = self
            .columns()
            .map(|c| {
                self.dialect
                    .quote_identifier(c.alias.as_deref().unwrap_or(&c.name))
            })
            .collect();
        let sources: Vec<String> = self.columns().map(|c| ctx.item(c)).collect();

        let mut sql = format!(
            "INSERT INTO {} ( {} ) SELECT ",
            self.dialect.quote_identifier(&table),
            targets.join(", ")
        );
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&sources.join(", "));
        self.push_select_tail(&ctx, &mut sql);
        Ok(sql)
    }

    fn render_update(&self) -> Result<String> {
        let table = self.target_table("update")?;
        self.require_columns("update")?;
        let ctx = self.context(true);

        let assignments: Vec<String> = self
            .columns()
            .map(|c| {
                format!(
                    "{} = {}",
                    self.dialect.quote_identifier(&c.name),
                    ctx.item(c)
                )
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.dialect.quote_identifier(&table),
            assignments.join(", ")
        );
        if let Some(predicate) = ctx.grouped(&self.where_groups, &self.where_conditions) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        Ok(sql)
    }

    fn render_delete(&self) -> Result<String> {
        let table = self.target_table("delete")?;
        let ctx = self.context(true);

        let mut sql = format!("DELETE FROM {}", self.dialect.quote_identifier(&table));
        if let Some(predicate) = ctx.grouped(&self.where_groups, &self.where_conditions) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        Ok(sql)
    }

    fn render_exec(&self) -> Result<String> {
        let routine = self.target_table("exec")?;
        let ctx = self.context(true);
        let arguments: Vec<String> = self.columns().map(|c| ctx.item(c)).collect();
        let routine = self.dialect.quote_identifier(&routine);
        let keyword = self.dialect.call_keyword();

        Ok(if self.dialect.call_uses_parentheses() {
            format!("{keyword} {routine}({})", arguments.join(", "))
        } else if arguments.is_empty() {
            format!("{keyword} {routine}")
        } else {
            format!("{keyword} {routine} {}", arguments.join(", "))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::dialect::{MySqlDialect, PostgresDialect, SqlServerDialect};
    use crate::query::{Query, QueryType};
    use crate::value::Scalar;

    fn text(s: &str) -> Option<Scalar> {
        Some(Scalar::Text(String::from(s)))
    }

    #[test]
    fn test_empty_select_is_minimal() {
        let query = Query::new();
        assert_eq!(query.render_sql().unwrap(), "SELECT *");
    }

    #[test]
    fn test_select_distinct() {
        let mut query = Query::new();
        query
            .select("status", None, None, "")
            .unwrap()
            .from("orders", "", false)
            .unwrap()
            .set_distinct(true);
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT DISTINCT "status" FROM "orders""#
        );
    }

    #[test]
    fn test_special_column_is_verbatim() {
        let mut query = Query::new();
        query
            .select("COUNT(*)", Some("total"), None, "special")
            .unwrap()
            .from("t", "a", false)
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT COUNT(*) AS "total" FROM "t" AS "a""#
        );
    }

    #[test]
    fn test_multi_table_prefixes_unqualified_columns() {
        let mut query = Query::new();
        query
            .select("title", None, None, "")
            .unwrap()
            .select("b.title", Some("catalog_title"), None, "")
            .unwrap()
            .from("#__content", "a", false)
            .unwrap()
            .from("#__catalog", "b", false)
            .unwrap()
            .where_clause("column", "b.source_id", "=", "column", "id")
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r##"SELECT "a"."title", "b"."title" AS "catalog_title" FROM "#__content" AS "a", "#__catalog" AS "b" WHERE "b"."source_id" = "a"."id""##
        );
    }

    #[test]
    fn test_star_stays_unprefixed() {
        let mut query = Query::new();
        query
            .select("*", None, None, "")
            .unwrap()
            .from("t1", "a", false)
            .unwrap()
            .from("t2", "b", false)
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t1" AS "a", "t2" AS "b""#
        );
    }

    #[test]
    fn test_primary_from_rendered_first() {
        let mut query = Query::new();
        query
            .from("t1", "a", false)
            .unwrap()
            .from("t2", "b", true)
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t2" AS "b", "t1" AS "a""#
        );
    }

    #[test]
    fn test_in_condition_renders_list() {
        let mut query = Query::new();
        query
            .from("t", "a", false)
            .unwrap()
            .where_clause("column", "a.status", "IN", "integer", "1, 0")
            .unwrap()
            .where_clause("column", "a.type", "in", "string", "x,y")
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t" AS "a" WHERE "a"."status" IN (1, 0) AND "a"."type" IN ('x', 'y')"#
        );
    }

    #[test]
    fn test_string_literal_quoted() {
        let mut query = Query::new();
        query
            .from("t", "", false)
            .unwrap()
            .where_clause("column", "name", "=", "string", "O'Brien")
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t" WHERE "name" = 'O''Brien'"#
        );
    }

    #[test]
    fn test_group_by_having() {
        let mut query = Query::new();
        query
            .select("catalog_type_id", None, None, "")
            .unwrap()
            .select("COUNT(*)", Some("n"), None, "special")
            .unwrap()
            .from("t", "", false)
            .unwrap()
            .group_by("catalog_type_id")
            .unwrap()
            .having_clause("special", "COUNT(*)", ">", "integer", 2)
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT "catalog_type_id", COUNT(*) AS "n" FROM "t" GROUP BY "catalog_type_id" HAVING COUNT(*) > 2"#
        );
    }

    #[test]
    fn test_single_group_not_parenthesised() {
        let mut query = Query::new();
        query
            .from("t", "", false)
            .unwrap()
            .where_group("g1", "AND")
            .unwrap()
            .where_grouped("column", "a", "=", "integer", 1, "AND", Some("g1"))
            .unwrap()
            .where_grouped("column", "b", "=", "integer", 2, "or", Some("g1"))
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t" WHERE "a" = 1 OR "b" = 2"#
        );
    }

    #[test]
    fn test_multiple_groups_parenthesised_and_joined() {
        let mut query = Query::new();
        query
            .from("t", "", false)
            .unwrap()
            .where_group("g1", "AND")
            .unwrap()
            .where_group("g2", "OR")
            .unwrap()
            .where_grouped("column", "c", "=", "integer", 3, "AND", Some("g2"))
            .unwrap()
            .where_grouped("column", "a", "=", "integer", 1, "AND", Some("g1"))
            .unwrap()
            .where_grouped("column", "b", "=", "integer", 2, "OR", Some("g1"))
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t" WHERE ("a" = 1 OR "b" = 2) OR ("c" = 3)"#
        );
    }

    #[test]
    fn test_unregistered_group_follows_registered() {
        let mut query = Query::new();
        query
            .from("t", "", false)
            .unwrap()
            .where_clause("column", "x", "=", "integer", 9)
            .unwrap()
            .where_group("g1", "OR")
            .unwrap()
            .where_grouped("column", "a", "=", "integer", 1, "AND", Some("g1"))
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t" WHERE ("a" = 1) AND ("x" = 9)"#
        );
    }

    #[test]
    fn test_registered_empty_group_is_skipped() {
        let mut query = Query::new();
        query
            .from("t", "", false)
            .unwrap()
            .where_group("unused", "OR")
            .unwrap()
            .where_clause("column", "x", "=", "integer", 9)
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t" WHERE "x" = 9"#
        );
    }

    #[test]
    fn test_insert() {
        let mut query = Query::new();
        query
            .set_type(QueryType::Insert)
            .set_insert_into("#__content")
            .unwrap()
            .select("title", None, text("Hello"), "string")
            .unwrap()
            .select("catalog_id", None, text("12"), "integer")
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r##"INSERT INTO "#__content" ( "title", "catalog_id" ) VALUES ( 'Hello', 12 )"##
        );
    }

    #[test]
    fn test_insert_requires_table_and_columns() {
        let mut query = Query::new();
        query.set_type(QueryType::Insert);
        assert!(query.render_sql().is_err());
        query.set_insert_into("t").unwrap();
        assert!(query.render_sql().is_err());
    }

    #[test]
    fn test_insert_from() {
        let mut query = Query::new();
        query
            .set_type(QueryType::InsertFrom)
            .set_insert_into("archive")
            .unwrap()
            .select("a.id", Some("source_id"), None, "")
            .unwrap()
            .select("a.title", None, None, "")
            .unwrap()
            .from("content", "a", false)
            .unwrap()
            .where_clause("column", "a.status", "=", "integer", 0)
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r#"INSERT INTO "archive" ( "source_id", "title" ) SELECT "a"."id", "a"."title" FROM "content" AS "a" WHERE "a"."status" = 0"#
        );
    }

    #[test]
    fn test_update_strips_prefixes() {
        let mut query = Query::new();
        query
            .set_type(QueryType::Update)
            .from("#__content", "a", false)
            .unwrap()
            .select("title", None, text("New"), "string")
            .unwrap()
            .where_clause("column", "a.id", "=", "integer", 7)
            .unwrap();
        assert_eq!(
            query.render_sql().unwrap(),
            r##"UPDATE "#__content" SET "title" = 'New' WHERE "id" = 7"##
        );
    }

    #[test]
    fn test_delete_without_where() {
        let mut query = Query::new();
        query
            .set_type(QueryType::Delete)
            .from("sessions", "", false)
            .unwrap();
        assert_eq!(query.render_sql().unwrap(), r#"DELETE FROM "sessions""#);
    }

    #[test]
    fn test_exec() {
        let mut query = Query::new();
        query
            .set_type(QueryType::Exec)
            .from("rebuild_tree", "", false)
            .unwrap()
            .select("root", None, text("1"), "integer")
            .unwrap();
        assert_eq!(query.render_sql().unwrap(), r#"CALL "rebuild_tree"(1)"#);

        let mut query = Query::with_dialect(SqlServerDialect::new());
        query
            .set_type(QueryType::Exec)
            .from("rebuild_tree", "", false)
            .unwrap()
            .select("root", None, text("1"), "integer")
            .unwrap();
        assert_eq!(query.render_sql().unwrap(), "EXEC [rebuild_tree] 1");
    }

    #[test]
    fn test_dialect_limit_translation() {
        let mut query = Query::with_dialect(PostgresDialect::new());
        query
            .from("t", "", false)
            .unwrap()
            .set_offset_and_limit(20, 10);
        assert_eq!(
            query.render_sql().unwrap(),
            r#"SELECT * FROM "t" LIMIT 10 OFFSET 20"#
        );

        let mut query = Query::with_dialect(MySqlDialect::new());
        query
            .from("t", "", false)
            .unwrap()
            .set_offset_and_limit(20, 10);
        assert_eq!(query.render_sql().unwrap(), "SELECT * FROM `t` LIMIT 20, 10");
    }
}
