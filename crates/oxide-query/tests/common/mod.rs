#![allow(dead_code)]

use oxide_query::{Dialect, Query, QueryError, Scalar};

pub fn render<D: Dialect>(query: &Query<D>) -> String {
    query
        .render_sql()
        .unwrap_or_else(|e| panic!("Failed to render {query:?}\nError: {e}"))
}

pub fn render_err<D: Dialect>(query: &Query<D>) -> QueryError {
    query
        .render_sql()
        .expect_err(&format!("Expected render error for {query:?}"))
}

pub fn text(value: &str) -> Option<Scalar> {
    Some(Scalar::Text(value.to_string()))
}

/// Asserts that no clause keyword is followed by nothing.
pub fn assert_no_empty_clause(sql: &str) {
    for keyword in ["WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT"] {
        assert!(
            !sql.ends_with(keyword) && !sql.contains(&format!("{keyword}  ")),
            "empty {keyword} clause in: {sql}"
        );
    }
    assert!(!sql.ends_with(' '), "trailing whitespace in: {sql}");
}

/// The catalog-type listing used across the select tests.
pub fn catalog_types_query() -> Query {
    let mut query = Query::new();
    query
        .select("a.application_id", Some("app_id"), None, "integer")
        .unwrap()
        .from("#__catalog_types", "a", false)
        .unwrap()
        .where_clause("column", "a.enabled", "=", "integer", 1)
        .unwrap()
        .order_by("order_id", None)
        .unwrap()
        .set_offset_and_limit(10, 5);
    query
}
