//! SQLite adapter over sqlx.

use std::sync::atomic::{AtomicI64, Ordering};

use oxide_query::Scalar;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use crate::adapter::{DatabaseAdapter, Row};
use crate::error::AdapterError;

/// Token that registries put in front of table names.
pub const TABLE_PREFIX_TOKEN: &str = "#__";

/// A [`DatabaseAdapter`] for SQLite.
///
/// Replaces the `#__` token in every statement with the configured table
/// prefix before execution.
#[derive(Debug)]
pub struct SqliteAdapter {
    pool: SqlitePool,
    table_prefix: String,
    last_insert_id: AtomicI64,
}

impl SqliteAdapter {
    /// Creates an adapter over an existing pool with an empty table prefix.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            table_prefix: String::new(),
            last_insert_id: AtomicI64::new(0),
        }
    }

    /// Connects to `url` and creates an adapter.
    pub async fn connect(url: &str) -> Result<Self, AdapterError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Sets the string substituted for `#__` in table names.
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = prefix.to_string();
        self
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn prepare(&self, sql: &str) -> String {
        sql.replace(TABLE_PREFIX_TOKEN, &self.table_prefix)
    }
}

impl DatabaseAdapter for SqliteAdapter {
    fn escape(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn escape_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    async fn execute(&self, sql: &str) -> Result<u64, AdapterError> {
        let sql = self.prepare(sql);
        debug!(sql = %sql, "Executing SQL");
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.last_insert_rowid() != 0 {
            self.last_insert_id
                .store(result.last_insert_rowid(), Ordering::SeqCst);
        }
        Ok(result.rows_affected())
    }

    async fn load_single_value(&self, sql: &str) -> Result<Option<Scalar>, AdapterError> {
        let sql = self.prepare(sql);
        debug!(sql = %sql, "Loading single value");
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(convert_row(&row)?.first_value().cloned()),
            None => Ok(None),
        }
    }

    async fn load_rows(&self, sql: &str) -> Result<Vec<Row>, AdapterError> {
        let sql = self.prepare(sql);
        debug!(sql = %sql, "Loading rows");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(convert_row).collect()
    }

    async fn last_insert_id(&self) -> Result<i64, AdapterError> {
        match self.last_insert_id.load(Ordering::SeqCst) {
            0 => Err(AdapterError::NoResult),
            id => Ok(id),
        }
    }
}

fn convert_row(row: &SqliteRow) -> Result<Row, AdapterError> {
    let mut converted = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Scalar::Null
        } else {
            let type_name = raw.type_info().name().to_ascii_uppercase();
            match type_name.as_str() {
                "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => Scalar::Int(row.try_get(index)?),
                "REAL" | "FLOAT" | "DOUBLE" => Scalar::Float(row.try_get(index)?),
                "TEXT" | "DATE" | "TIME" | "DATETIME" => Scalar::Text(row.try_get(index)?),
                other => {
                    return Err(AdapterError::Unsupported(format!(
                        "column {} has type {other}",
                        column.name()
                    )))
                }
            }
        };
        converted.push(column.name(), value);
    }
    Ok(converted)
}
