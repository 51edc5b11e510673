//! Generic SQL dialect.

use super::Dialect;

/// A generic SQL dialect: ANSI double-quoted identifiers, single-quoted
/// values, and the two-argument `LIMIT offset, count` paging form.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}
