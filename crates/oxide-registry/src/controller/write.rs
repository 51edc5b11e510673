use oxide_query::{Dialect, QueryType};
use serde_json::Value;
use tracing::info;

use super::{event_error, values_to_json, Controller, Values};
use crate::adapter::DatabaseAdapter;
use crate::error::{RegistryError, Result};
use crate::event::{
    ON_AFTER_CREATE, ON_AFTER_DELETE, ON_AFTER_UPDATE, ON_BEFORE_CREATE, ON_BEFORE_DELETE,
    ON_BEFORE_UPDATE,
};

impl<A: DatabaseAdapter, D: Dialect> Controller<A, D> {
    /// Inserts a row and returns its generated key.
    ///
    /// Missing fields take their default. A non-nullable field with neither
    /// a value nor a default is a validation error, as is a value for an
    /// unknown, identity or calculated field.
    pub async fn create(&mut self, values: Values) -> Result<i64> {
        self.query.clear_query();
        let values = self.before_write(ON_BEFORE_CREATE, values, None)?;
        self.check_writable(&values, false)?;
        self.check_foreign_keys(&values).await?;

        let statement = self.render_insert(&values);
        self.query.clear_query();
        let sql = statement?;

        self.adapter.execute(&sql).await?;
        let key = self.adapter.last_insert_id().await?;
        info!(table = %self.registry.table_name, key, "Created row");

        let mut payload = self.payload();
        payload.insert(String::from("key"), Value::from(key));
        payload.insert(String::from("values"), values_to_json(&values));
        self.schedule(ON_AFTER_CREATE, payload)?;
        Ok(key)
    }

    /// Updates the row with primary key `key`, returning the affected rows.
    ///
    /// Empty `values` is [`RegistryError::NothingToDo`], not a failure.
    pub async fn update(&mut self, key: i64, values: Values) -> Result<u64> {
        require_key("update", key)?;
        if values.is_empty() {
            return Err(RegistryError::NothingToDo(format!(
                "no values to update for key {key}"
            )));
        }

        self.query.clear_query();
        let values = self.before_write(ON_BEFORE_UPDATE, values, Some(key))?;
        self.check_writable(&values, true)?;
        self.check_foreign_keys(&values).await?;

        let statement = self.render_update(key, &values);
        self.query.clear_query();
        let sql = statement?;

        let affected = self.adapter.execute(&sql).await?;
        info!(table = %self.registry.table_name, key, affected, "Updated row");

        let mut payload = self.payload();
        payload.insert(String::from("key"), Value::from(key));
        payload.insert(String::from("affected"), Value::from(affected));
        self.schedule(ON_AFTER_UPDATE, payload)?;
        Ok(affected)
    }

    /// Deletes the row with primary key `key`.
    ///
    /// Fails with [`RegistryError::NotFound`] when no row was deleted.
    pub async fn delete(&mut self, key: i64) -> Result<u64> {
        require_key("delete", key)?;
        self.query.clear_query();

        let mut payload = self.payload();
        payload.insert(String::from("key"), Value::from(key));
        self.schedule(ON_BEFORE_DELETE, payload)?;

        let statement = self.render_delete(key);
        self.query.clear_query();
        let sql = statement?;

        let affected = self.adapter.execute(&sql).await?;
        if affected == 0 {
            return Err(RegistryError::NotFound);
        }
        info!(table = %self.registry.table_name, key, "Deleted row");

        let mut payload = self.payload();
        payload.insert(String::from("key"), Value::from(key));
        self.schedule(ON_AFTER_DELETE, payload)?;
        Ok(affected)
    }

    /// Runs a before-event and takes back the values it returns.
    fn before_write(&self, event: &str, values: Values, key: Option<i64>) -> Result<Values> {
        let mut payload = self.payload();
        if let Some(key) = key {
            payload.insert(String::from("key"), Value::from(key));
        }
        payload.insert(String::from("values"), values_to_json(&values));

        let mut returned = self.schedule(event, payload)?;
        match returned.remove("values") {
            Some(Value::Object(object)) => object
                .into_iter()
                .map(|(name, value)| Ok((name, serde_json::from_value(value)?)))
                .collect::<std::result::Result<Values, serde_json::Error>>()
                .map_err(|e| event_error(event, e)),
            Some(_) => Err(event_error(event, "values must be an object")),
            None => Ok(values),
        }
    }

    fn check_writable(&self, values: &Values, updating: bool) -> Result<()> {
        for (name, value) in values {
            let field = self
                .registry
                .field(name)
                .ok_or_else(|| RegistryError::Validation(format!("unknown field {name}")))?;
            if !field.is_writable() || (updating && field.locked) {
                return Err(RegistryError::Validation(format!(
                    "field {name} cannot be written"
                )));
            }
            if value.is_null() && !field.nullable {
                return Err(RegistryError::Validation(format!(
                    "field {name} cannot be null"
                )));
            }
        }
        Ok(())
    }

    fn render_insert(&mut self, values: &Values) -> Result<String> {
        self.query
            .set_type(QueryType::Insert)
            .set_insert_into(&self.registry.table_name)?;

        for field in self.registry.fields.iter().filter(|f| f.is_writable()) {
            match values.get(&field.name).or(field.default.as_ref()) {
                Some(value) if value.is_null() && !field.nullable => {
                    return Err(RegistryError::Validation(format!(
                        "field {} is required",
                        field.name
                    )));
                }
                Some(value) => {
                    self.query
                        .select(&field.name, None, Some(value.clone()), &field.field_type)?;
                }
                None if field.nullable => {}
                None => {
                    return Err(RegistryError::Validation(format!(
                        "field {} is required",
                        field.name
                    )));
                }
            }
        }
        Ok(self.query.render_sql()?)
    }

    fn render_update(&mut self, key: i64, values: &Values) -> Result<String> {
        self.query
            .set_type(QueryType::Update)
            .from(&self.registry.table_name, &self.registry.primary_prefix, true)?;

        for (name, value) in values {
            let field_type = self
                .registry
                .field(name)
                .map_or("", |f| f.field_type.as_str());
            self.query
                .select(name, None, Some(value.clone()), field_type)?;
        }
        self.query.where_clause(
            "column",
            self.registry.qualified(&self.registry.primary_key),
            "=",
            "integer",
            key,
        )?;
        Ok(self.query.render_sql()?)
    }

    fn render_delete(&mut self, key: i64) -> Result<String> {
        self.query
            .set_type(QueryType::Delete)
            .from(&self.registry.table_name, &self.registry.primary_prefix, true)?
            .where_clause(
                "column",
                self.registry.qualified(&self.registry.primary_key),
                "=",
                "integer",
                key,
            )?;
        Ok(self.query.render_sql()?)
    }
}

fn require_key(operation: &str, key: i64) -> Result<()> {
    if key <= 0 {
        return Err(RegistryError::Validation(format!(
            "{operation} requires a primary key value, got {key}"
        )));
    }
    Ok(())
}
