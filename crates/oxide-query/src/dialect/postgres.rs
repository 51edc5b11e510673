//! PostgreSQL dialect.

use super::Dialect;

/// PostgreSQL dialect.
///
/// PostgreSQL has no two-argument `LIMIT`, so paging is rendered as
/// `LIMIT count OFFSET offset`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn limit_clause(&self, offset: u64, limit: u64) -> String {
        if limit == 0 {
            format!("OFFSET {offset}")
        } else {
            format!("LIMIT {limit} OFFSET {offset}")
        }
    }
}
