//! Registry-driven query derivation and CRUD for `oxide-query`.
//!
//! `oxide-registry` turns a declarative model description into SQL and runs
//! it:
//! - **Registry** - table, keys, fields, joins, foreign keys, criteria and
//!   paging mode, loaded from JSON with every default applied once
//! - **Deriver** - fills a [`Query`](oxide_query::Query) from a registry in a
//!   fixed order, including join columns and join conditions
//! - **Pagination** - slices loaded rows by query object
//! - **Adapter** - the database seam, with a SQLite implementation over sqlx
//! - **Controller** - create, read, update and delete with event hooks and
//!   foreign key checks
//!
//! # Example
//!
//! ```rust
//! use oxide_query::Query;
//! use oxide_registry::derive::derive_query;
//! use oxide_registry::registry::ModelRegistry;
//!
//! let mut registry = ModelRegistry::from_json(
//!     r##"{
//!         "table_name": "#__content",
//!         "query_object": "item",
//!         "fields": [
//!             {"name": "id", "type": "integer", "identity": true},
//!             {"name": "title", "type": "string"}
//!         ]
//!     }"##,
//! )?;
//! registry.primary_key_value = Some(5);
//!
//! let mut query = Query::new();
//! derive_query(&mut registry, &mut query)?;
//! assert_eq!(
//!     query.render_sql()?,
//!     r##"SELECT "a"."id", "a"."title" FROM "#__content" AS "a" WHERE "a"."id" = 5"##
//! );
//! # Ok::<(), oxide_registry::error::RegistryError>(())
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the statement derived from a registry
//! oxide-registry --registry content.json render --dialect mysql --id 5
//!
//! # Run it against SQLite and print the rows as JSON
//! oxide-registry --registry content.json query --database sqlite:site.db
//! ```

pub mod adapter;
pub mod controller;
pub mod derive;
pub mod error;
pub mod event;
pub mod paginate;
pub mod registry;
pub mod sqlite;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::adapter::{DatabaseAdapter, Row};
    pub use crate::controller::{Controller, Values};
    pub use crate::derive::derive_query;
    pub use crate::error::{AdapterError, RegistryError, Result};
    pub use crate::event::{EventScheduler, NoopScheduler, Payload};
    pub use crate::paginate::{apply_query_object, paginate, QueryResult};
    pub use crate::registry::{
        CriteriaDef, FieldDef, ForeignKeyDef, JoinDef, ModelRegistry, QueryObject,
        RawModelRegistry, RuntimeProperties,
    };
    pub use crate::sqlite::SqliteAdapter;
}
