//! CRUD controllers.
//!
//! A [`Controller`] ties a [`ModelRegistry`] to a [`Query`], a
//! [`DatabaseAdapter`] and an [`EventScheduler`]. Each operation builds its
//! statement in the controller's query, clears the query again and then
//! talks to the adapter, so one controller can serve any number of calls.

mod read;
mod write;

use std::collections::BTreeMap;
use std::sync::Arc;

use oxide_query::{Dialect, GenericDialect, Query, Scalar};
use serde_json::Value;

use crate::adapter::{scalar_to_json, DatabaseAdapter};
use crate::error::{RegistryError, Result};
use crate::event::{EventScheduler, NoopScheduler, Payload};
use crate::registry::{ForeignKeyDef, ModelRegistry};

/// Field values for create and update, keyed by field name.
pub type Values = BTreeMap<String, Scalar>;

/// Create, read, update and delete for one model.
pub struct Controller<A: DatabaseAdapter, D: Dialect = GenericDialect> {
    registry: ModelRegistry,
    query: Query<D>,
    adapter: A,
    scheduler: Arc<dyn EventScheduler>,
}

impl<A: DatabaseAdapter, D: Dialect> Controller<A, D> {
    /// Creates a controller that schedules no events.
    pub fn new(registry: ModelRegistry, query: Query<D>, adapter: A) -> Self {
        Self {
            registry,
            query,
            adapter,
            scheduler: Arc::new(NoopScheduler),
        }
    }

    /// Replaces the event scheduler.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn EventScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub const fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Gives access to runtime settings such as key values and paging.
    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    /// Gives access to the query before a read, e.g. to pick columns.
    pub fn query_mut(&mut self) -> &mut Query<D> {
        &mut self.query
    }

    pub const fn adapter(&self) -> &A {
        &self.adapter
    }

    fn payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(
            String::from("model"),
            Value::from(self.registry.table_name.clone()),
        );
        payload.insert(
            String::from("query_object"),
            Value::from(self.registry.query_object().as_str()),
        );
        payload
    }

    fn schedule(&self, event: &str, payload: Payload) -> Result<Payload> {
        self.scheduler.schedule(event, payload)
    }

    /// Checks that every foreign key in `values` points at an existing row.
    async fn check_foreign_keys(&mut self, values: &Values) -> Result<()> {
        let foreign_keys = self.registry.foreign_keys.clone();
        for foreign_key in &foreign_keys {
            let Some(value) = values.get(&foreign_key.name) else {
                continue;
            };
            if value.is_empty() || value.as_i64() == Some(0) {
                continue;
            }

            let statement = self.render_foreign_key_count(foreign_key, value);
            self.query.clear_query();
            let sql = statement?;

            let count = self
                .adapter
                .load_single_value(&sql)
                .await?
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            if count == 0 {
                return Err(RegistryError::ForeignKey {
                    field: foreign_key.name.clone(),
                    value: value.as_text(),
                });
            }
        }
        Ok(())
    }

    fn render_foreign_key_count(
        &mut self,
        foreign_key: &ForeignKeyDef,
        value: &Scalar,
    ) -> Result<String> {
        self.query.clear_query();
        self.query
            .select("COUNT(*)", None, None, "special")?
            .from(&foreign_key.source_table, "", true)?
            .where_clause(
                "column",
                foreign_key.source_id.as_str(),
                "=",
                "integer",
                value,
            )?;
        Ok(self.query.render_sql()?)
    }
}

fn event_error(event: &str, message: impl ToString) -> RegistryError {
    RegistryError::Event {
        event: event.to_string(),
        message: message.to_string(),
    }
}

fn values_to_json(values: &Values) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(name, value)| (name.clone(), scalar_to_json(value)))
            .collect(),
    )
}
