//! SQL Server dialect.

use super::Dialect;

/// SQL Server dialect: bracketed identifiers and `OFFSET … FETCH` paging.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn identifier_quote_start(&self) -> char {
        '['
    }

    fn identifier_quote_end(&self) -> char {
        ']'
    }

    fn limit_clause(&self, offset: u64, limit: u64) -> String {
        if limit == 0 {
            format!("OFFSET {offset} ROWS")
        } else {
            format!("OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY")
        }
    }

    fn call_keyword(&self) -> &'static str {
        "EXEC"
    }

    fn call_uses_parentheses(&self) -> bool {
        false
    }
}
