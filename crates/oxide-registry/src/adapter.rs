//! The database adapter seam.
//!
//! Controllers never talk to a driver directly. They hand rendered SQL to a
//! [`DatabaseAdapter`], which is the only place a call may block or fail for
//! reasons outside the builder.

use oxide_query::Scalar;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::AdapterError;

/// One result row: column names and values in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Scalar)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Appends a column, replacing an earlier column of the same name.
    pub fn push(&mut self, name: impl Into<String>, value: Scalar) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((name, value)),
        }
    }

    /// Builder form of [`Row::push`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Scalar) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns the column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Returns the value of the first column.
    pub fn first_value(&self) -> Option<&Scalar> {
        self.columns.first().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Converts the row to a JSON object for event payloads.
    pub fn to_json(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|(name, value)| (name.clone(), scalar_to_json(value)))
            .collect()
    }

    /// Writes the columns of a JSON object back into the row.
    ///
    /// Existing columns keep their position; new columns are appended. The
    /// row is unchanged when any value is not a scalar.
    pub fn merge_json(&mut self, object: Map<String, Value>) -> Result<(), serde_json::Error> {
        let values = object
            .into_iter()
            .map(|(name, value)| Ok((name, serde_json::from_value(value)?)))
            .collect::<Result<Vec<(String, Scalar)>, serde_json::Error>>()?;
        for (name, value) in values {
            self.push(name, value);
        }
        Ok(())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub(crate) fn scalar_to_json(value: &Scalar) -> Value {
    match value {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Int(n) => Value::from(*n),
        Scalar::Float(f) => Value::from(*f),
        Scalar::Text(s) => Value::String(s.clone()),
    }
}

/// Trait for database adapters.
///
/// Statements arrive fully rendered; adapters execute them as-is apart from
/// driver-specific rewriting such as table prefix substitution.
#[allow(async_fn_in_trait)]
pub trait DatabaseAdapter {
    /// Escapes a value for inclusion inside a quoted literal.
    fn escape(&self, value: &str) -> String;

    /// Quotes an identifier for this driver.
    fn escape_identifier(&self, name: &str) -> String;

    /// Executes a statement, returning the number of affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, AdapterError>;

    /// Returns the first column of the first row, or `None` for no rows.
    async fn load_single_value(&self, sql: &str) -> Result<Option<Scalar>, AdapterError>;

    /// Returns every row.
    async fn load_rows(&self, sql: &str) -> Result<Vec<Row>, AdapterError>;

    /// Returns the key generated by the most recent insert.
    async fn last_insert_id(&self) -> Result<i64, AdapterError>;
}
