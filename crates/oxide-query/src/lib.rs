//! # oxide-query
//!
//! A statement accumulator and SQL generator with dialect-aware quoting.
//!
//! This crate provides:
//! - [`Query`], a mutable builder that collects columns, tables, grouped
//!   conditions, ordering and paging through validated mutators
//! - A generator that renders select, insert, insert-from, update, delete
//!   and routine calls, omitting every empty clause
//! - [`Dialect`] implementations for identifier quoting, value quoting and
//!   paging syntax
//! - A [`Fieldhandler`] seam that sanitizes literal values before they reach
//!   the generated SQL
//!
//! ## Building a statement
//!
//! ```rust
//! use oxide_query::Query;
//!
//! let mut query = Query::new();
//! query
//!     .select("a.application_id", Some("app_id"), None, "integer")?
//!     .from("#__catalog_types", "a", false)?
//!     .where_clause("column", "a.enabled", "=", "integer", 1)?
//!     .order_by("order_id", None)?
//!     .set_offset_and_limit(10, 5);
//!
//! assert_eq!(
//!     query.render_sql()?,
//!     r##"SELECT "a"."application_id" AS "app_id" FROM "#__catalog_types" AS "a" WHERE "a"."enabled" = 1 ORDER BY "order_id" ASC LIMIT 10, 5"##
//! );
//! # Ok::<(), oxide_query::QueryError>(())
//! ```
//!
//! ## Grouped conditions
//!
//! Conditions are bucketed by group. With more than one non-empty group,
//! every bucket is parenthesised and buckets are joined with the connector
//! registered through [`Query::where_group`]:
//!
//! ```rust
//! use oxide_query::Query;
//!
//! let mut query = Query::new();
//! query
//!     .from("t", "", false)?
//!     .where_group("published", "AND")?
//!     .where_group("owner", "OR")?
//!     .where_grouped("column", "state", "=", "integer", 1, "AND", Some("published"))?
//!     .where_grouped("column", "created_by", "=", "integer", 42, "AND", Some("owner"))?;
//!
//! assert_eq!(
//!     query.render_sql()?,
//!     r#"SELECT * FROM "t" WHERE ("state" = 1) OR ("created_by" = 42)"#
//! );
//! # Ok::<(), oxide_query::QueryError>(())
//! ```

pub mod dialect;
pub mod error;
pub mod fieldhandler;
pub mod item;
pub mod query;
mod render;
pub mod value;

pub use dialect::{
    Dialect, GenericDialect, MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect,
};
pub use error::{QueryError, Result};
pub use fieldhandler::{Fieldhandler, StandardFieldhandler};
pub use item::{ClauseItem, Condition, Connector, DataType, SortDirection};
pub use query::{GroupDirective, Query, QueryType};
pub use value::{Scalar, ToScalar};
