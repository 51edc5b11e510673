use oxide_query::Dialect;
use serde_json::Value;
use tracing::info;

use super::{event_error, Controller};
use crate::adapter::{DatabaseAdapter, Row};
use crate::derive::derive_query;
use crate::error::Result;
use crate::event::{ON_AFTER_READ, ON_BEFORE_READ};
use crate::paginate::{apply_query_object, QueryResult};
use crate::registry::QueryObject;

impl<A: DatabaseAdapter, D: Dialect + Clone> Controller<A, D> {
    /// Reads the model as its query object describes.
    ///
    /// `result` reads load a single value; every other read loads rows and
    /// shapes them with [`apply_query_object`]. Each returned row passes
    /// through `onAfterRead`, which may rewrite its columns.
    pub async fn read(&mut self) -> Result<QueryResult> {
        self.schedule(ON_BEFORE_READ, self.payload())?;

        let sql = self.render_read();
        self.query.clear_query();
        let sql = sql?;

        let query_object = self.registry.query_object();
        let mut result = if query_object == QueryObject::Result {
            QueryResult::Result(self.adapter.load_single_value(&sql).await?)
        } else {
            let rows = self.adapter.load_rows(&sql).await?;
            apply_query_object(
                rows,
                query_object,
                self.registry.use_pagination(),
                self.registry.model_offset(),
                self.registry.model_count(),
            )
        };

        match &mut result {
            QueryResult::List(rows) => {
                for row in rows.iter_mut() {
                    self.after_read(row)?;
                }
            }
            QueryResult::Item(Some(row)) => self.after_read(row)?,
            _ => {}
        }

        info!(
            table = %self.registry.table_name,
            query_object = %query_object,
            rows = result.rows().len(),
            "Read complete"
        );
        Ok(result)
    }

    fn render_read(&mut self) -> Result<String> {
        derive_query(&mut self.registry, &mut self.query)?;
        Ok(self.query.render_sql()?)
    }

    fn after_read(&self, row: &mut Row) -> Result<()> {
        let mut payload = self.payload();
        payload.insert(String::from("row"), Value::Object(row.to_json()));
        let mut returned = self.schedule(ON_AFTER_READ, payload)?;
        match returned.remove("row") {
            Some(Value::Object(object)) => row
                .merge_json(object)
                .map_err(|e| event_error(ON_AFTER_READ, e)),
            Some(_) => Err(event_error(ON_AFTER_READ, "row must be an object")),
            None => Ok(()),
        }
    }
}
