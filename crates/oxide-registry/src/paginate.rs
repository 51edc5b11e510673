//! Result post-processing by query object.

use oxide_query::Scalar;
use serde::Serialize;
use tracing::warn;

use crate::adapter::Row;
use crate::registry::QueryObject;

/// The shaped result of a read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// Rows of a list read, paginated when the registry asks for it.
    List(Vec<Row>),
    /// The first row of an item read.
    Item(Option<Row>),
    /// A single value.
    Result(Option<Scalar>),
    /// Key/name rows, never paginated.
    Distinct(Vec<Row>),
}

impl QueryResult {
    /// Returns the rows carried by the result.
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::List(rows) | Self::Distinct(rows) => rows,
            Self::Item(Some(row)) => std::slice::from_ref(row),
            Self::Item(None) | Self::Result(_) => &[],
        }
    }
}

/// Returns the page of `rows` starting at `offset` holding at most `count`
/// rows.
///
/// An offset at or past the end is stale and is reset to 0.
pub fn paginate<T>(rows: Vec<T>, offset: u64, count: u64) -> Vec<T> {
    let len = rows.len();
    let mut offset = usize::try_from(offset).unwrap_or(usize::MAX);
    if offset >= len && offset > 0 {
        warn!(offset, rows = len, "Offset past end of results, resetting to 0");
        offset = 0;
    }
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(count).collect()
}

/// Shapes loaded rows according to the registry's query object.
pub fn apply_query_object(
    rows: Vec<Row>,
    query_object: QueryObject,
    use_pagination: bool,
    offset: u64,
    count: u64,
) -> QueryResult {
    match query_object {
        QueryObject::List if use_pagination => QueryResult::List(paginate(rows, offset, count)),
        QueryObject::List => QueryResult::List(rows),
        QueryObject::Item => QueryResult::Item(rows.into_iter().next()),
        QueryObject::Result => {
            QueryResult::Result(rows.first().and_then(Row::first_value).cloned())
        }
        QueryObject::Distinct => QueryResult::Distinct(rows),
    }
}
