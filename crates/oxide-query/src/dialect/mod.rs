//! SQL dialect support.
//!
//! Different databases quote identifiers and values differently, and page
//! results with different syntax. This module provides a trait for that
//! driver-specific behavior; everything else in the generator is shared.

mod generic;
mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the opening identifier quote.
    fn identifier_quote_start(&self) -> char {
        '"'
    }

    /// Returns the closing identifier quote.
    fn identifier_quote_end(&self) -> char {
        self.identifier_quote_start()
    }

    /// Returns the character wrapped around literal values.
    fn value_quote(&self) -> char {
        '\''
    }

    /// Quotes an identifier. `*` is never quoted.
    fn quote_identifier(&self, name: &str) -> String {
        if name == "*" {
            return String::from("*");
        }
        format!(
            "{}{name}{}",
            self.identifier_quote_start(),
            self.identifier_quote_end()
        )
    }

    /// Quotes a column and, when present, its table prefix.
    fn quote_and_prefix(&self, name: &str, prefix: &str) -> String {
        if prefix.is_empty() {
            self.quote_identifier(name)
        } else {
            format!(
                "{}.{}",
                self.quote_identifier(prefix),
                self.quote_identifier(name)
            )
        }
    }

    /// Wraps a literal in the value quote, doubling embedded quote characters.
    fn quote_value(&self, value: &str) -> String {
        let quote = self.value_quote();
        let doubled = format!("{quote}{quote}");
        let escaped = value.replace(quote, &doubled);
        format!("{quote}{escaped}{quote}")
    }

    /// Renders already-formatted values as a parenthesised list.
    fn value_list(&self, values: &[String]) -> String {
        format!("({})", values.join(", "))
    }

    /// Renders the paging clause. Called only when offset or limit is non-zero.
    fn limit_clause(&self, offset: u64, limit: u64) -> String {
        format!("LIMIT {offset}, {limit}")
    }

    /// Keyword used to invoke a stored routine.
    fn call_keyword(&self) -> &'static str {
        "CALL"
    }

    /// Returns whether routine arguments are wrapped in parentheses.
    fn call_uses_parentheses(&self) -> bool {
        true
    }
}
