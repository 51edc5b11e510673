#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use oxide_query::{Query, Scalar};
use oxide_registry::adapter::{DatabaseAdapter, Row};
use oxide_registry::controller::{Controller, Values};
use oxide_registry::error::{AdapterError, RegistryError};
use oxide_registry::event::{EventScheduler, Payload};
use oxide_registry::registry::ModelRegistry;
use serde_json::Value;

/// Registry JSON for the content model used across the tests.
pub fn content_json(query_object: &str) -> String {
    format!(
        r##"{{
            "table_name": "#__content",
            "query_object": "{query_object}",
            "fields": [
                {{"name": "id", "type": "integer", "identity": true}},
                {{"name": "title", "type": "string"}},
                {{"name": "state", "type": "integer", "default": 1}},
                {{"name": "catalog_id", "type": "integer", "nullable": true}},
                {{"name": "created_by", "type": "integer", "default": 0, "locked": true}}
            ],
            "foreign_keys": [
                {{"name": "catalog_id", "source_id": "id", "source_table": "#__catalog"}}
            ]
        }}"##
    )
}

pub fn content_registry(query_object: &str) -> ModelRegistry {
    ModelRegistry::from_json(&content_json(query_object))
        .unwrap_or_else(|e| panic!("Failed to load content registry: {e}"))
}

pub fn values(pairs: &[(&str, Scalar)]) -> Values {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

pub fn text(value: &str) -> Scalar {
    Scalar::Text(value.to_string())
}

pub fn numbered_rows(count: i64) -> Vec<Row> {
    (1..=count)
        .map(|id| Row::new().with("id", Scalar::Int(id)))
        .collect()
}

pub fn row_ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Scalar::as_i64))
        .collect()
}

// ===================================================================
// Recording adapter
// ===================================================================

/// An in-memory adapter that records every statement it receives.
pub struct RecordingAdapter {
    statements: Mutex<Vec<String>>,
    rows: Vec<Row>,
    single_values: Mutex<VecDeque<Option<Scalar>>>,
    affected: u64,
    insert_id: i64,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            rows: Vec::new(),
            single_values: Mutex::new(VecDeque::new()),
            affected: 1,
            insert_id: 1,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Queues answers for `load_single_value`, consumed in order.
    pub fn with_single_values(self, values: Vec<Option<Scalar>>) -> Self {
        self.single_values.lock().unwrap().extend(values);
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn with_insert_id(mut self, id: i64) -> Self {
        self.insert_id = id;
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) {
        self.statements.lock().unwrap().push(sql.to_string());
    }
}

impl DatabaseAdapter for RecordingAdapter {
    fn escape(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn escape_identifier(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    async fn execute(&self, sql: &str) -> Result<u64, AdapterError> {
        self.record(sql);
        Ok(self.affected)
    }

    async fn load_single_value(&self, sql: &str) -> Result<Option<Scalar>, AdapterError> {
        self.record(sql);
        Ok(self.single_values.lock().unwrap().pop_front().flatten())
    }

    async fn load_rows(&self, sql: &str) -> Result<Vec<Row>, AdapterError> {
        self.record(sql);
        Ok(self.rows.clone())
    }

    async fn last_insert_id(&self) -> Result<i64, AdapterError> {
        Ok(self.insert_id)
    }
}

pub fn controller(
    registry: ModelRegistry,
    adapter: RecordingAdapter,
) -> Controller<RecordingAdapter> {
    Controller::new(registry, Query::new(), adapter)
}

// ===================================================================
// Recording scheduler
// ===================================================================

type Rewrite = Box<dyn Fn(&str, &mut Payload) -> Result<(), RegistryError> + Send + Sync>;

/// A scheduler that records events and can rewrite their payloads.
pub struct RecordingScheduler {
    events: Mutex<Vec<(String, Payload)>>,
    rewrite: Option<Rewrite>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            rewrite: None,
        }
    }

    pub fn rewriting(
        rewrite: impl Fn(&str, &mut Payload) -> Result<(), RegistryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            rewrite: Some(Box::new(rewrite)),
        }
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns the payload of the first event with the given name.
    pub fn payload_of(&self, event: &str) -> Option<Payload> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == event)
            .map(|(_, payload)| payload.clone())
    }
}

impl EventScheduler for RecordingScheduler {
    fn schedule(&self, event: &str, mut payload: Payload) -> Result<Payload, RegistryError> {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload.clone()));
        if let Some(rewrite) = &self.rewrite {
            rewrite(event, &mut payload)?;
        }
        Ok(payload)
    }
}

pub fn json_i64(payload: &Payload, key: &str) -> Option<i64> {
    payload.get(key).and_then(Value::as_i64)
}
