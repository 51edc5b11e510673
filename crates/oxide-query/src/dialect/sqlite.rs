//! SQLite dialect.

use super::Dialect;

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn identifier_quote_start(&self) -> char {
        '"' // SQLite also accepts backticks, but double quotes are standard
    }

    fn limit_clause(&self, offset: u64, limit: u64) -> String {
        // A negative count means "no upper bound" in SQLite.
        if limit == 0 {
            format!("LIMIT -1 OFFSET {offset}")
        } else {
            format!("LIMIT {limit} OFFSET {offset}")
        }
    }
}
