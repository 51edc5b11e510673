//! Tests for registry loading and query derivation.

mod common;
use common::*;

use std::io::Write;

use oxide_query::{MySqlDialect, Query, QueryError, Scalar};
use oxide_registry::derive::derive_query;
use oxide_registry::error::RegistryError;
use oxide_registry::registry::{CriteriaDef, JoinDef, ModelRegistry, QueryObject};

fn users_join(join_to: &[&str], join_with: &[&str]) -> JoinDef {
    JoinDef {
        table_name: String::from("#__users"),
        alias: String::from("u"),
        select: vec![String::from("username"), String::from("email")],
        join_to: join_to.iter().map(ToString::to_string).collect(),
        join_with: join_with.iter().map(ToString::to_string).collect(),
    }
}

// ===================================================================
// Loading
// ===================================================================

#[test]
fn unknown_query_object_falls_back_to_list() {
    let registry = ModelRegistry::from_json(r##"{"table_name": "#__content", "query_object": "bogus"}"##)
        .expect("bogus query object must not be an error");
    assert_eq!(registry.query_object(), QueryObject::List);
}

#[test]
fn paging_survives_only_on_lists() {
    let json = r##"{"table_name": "#__content", "query_object": "%s",
                    "use_pagination": true, "model_offset": 10, "model_count": 5}"##;

    let list = ModelRegistry::from_json(&json.replace("%s", "list")).unwrap();
    assert!(list.use_pagination());
    assert_eq!((list.model_offset(), list.model_count()), (10, 5));

    for query_object in ["item", "result", "distinct"] {
        let registry = ModelRegistry::from_json(&json.replace("%s", query_object)).unwrap();
        assert!(!registry.use_pagination(), "{query_object} must not paginate");
        assert_eq!((registry.model_offset(), registry.model_count()), (0, 0));
    }
}

#[test]
fn registry_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content_json("item").as_bytes()).unwrap();

    let registry = ModelRegistry::from_json_file(file.path()).unwrap();
    assert_eq!(registry.table_name, "#__content");
    assert_eq!(registry.query_object(), QueryObject::Item);
    assert_eq!(registry.primary_prefix, "a");
    assert_eq!(registry.primary_key, "id");
    assert_eq!(registry.name_key, "title");
    assert_eq!(registry.foreign_keys.len(), 1);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelRegistry::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, RegistryError::Io(_)), "{err:?}");
}

// ===================================================================
// Joins
// ===================================================================

#[test]
fn item_join_adds_two_columns_two_conditions_one_table() {
    let mut registry = ModelRegistry::from_json(
        r##"{
            "table_name": "#__content",
            "query_object": "item",
            "site_id": 3,
            "fields": [
                {"name": "id", "type": "integer", "identity": true},
                {"name": "title", "type": "string"}
            ]
        }"##,
    )
    .unwrap();
    registry
        .joins
        .push(users_join(&["id", "site_id"], &["created_by", "SITE_ID"]));

    let mut query = Query::new();
    derive_query(&mut registry, &mut query).unwrap();

    assert_eq!(query.columns().count(), 4);
    assert_eq!(query.where_conditions().len(), 2);
    assert_eq!(query.from_entries().count(), 2);
    assert_eq!(
        query.render_sql().unwrap(),
        r##"SELECT "a"."id", "a"."title", "u"."username" AS "u_username", "u"."email" AS "u_email" FROM "#__content" AS "a", "#__users" AS "u" WHERE "u"."id" = "a"."created_by" AND "u"."site_id" = 3"##
    );
    assert!(registry.field("u_email").unwrap().calculated);
}

#[test]
fn mismatched_join_leaves_query_untouched() {
    let mut registry = content_registry("list");
    registry
        .joins
        .push(users_join(&["id", "site_id"], &["created_by"]));

    let mut query = Query::new();
    let err = derive_query(&mut registry, &mut query).unwrap_err();

    assert!(matches!(err, RegistryError::Validation(_)), "{err:?}");
    assert!(query.where_conditions().is_empty());
    assert!(!query.has_columns());
    assert!(!query.has_from());
}

#[test]
fn failing_criterion_leaves_query_and_registry_untouched() {
    let mut registry = content_registry("list");
    registry
        .joins
        .push(users_join(&["id"], &["created_by"]));
    registry.criteria.push(CriteriaDef {
        name: String::from("a.state"),
        operator: String::from("="),
        value: Some(text("published")),
        name2: None,
    });
    let fields_before = registry.fields.clone();

    let mut query = Query::new();
    query.order_by("a.title", None).unwrap();
    let err = derive_query(&mut registry, &mut query).unwrap_err();

    assert!(
        matches!(&err, RegistryError::Query(QueryError::Sanitization { field, .. }) if field == "state"),
        "{err:?}"
    );
    assert!(!query.has_columns());
    assert!(!query.has_from());
    assert!(query.where_conditions().is_empty());
    assert_eq!(query.order_by_items().len(), 1);
    assert_eq!(registry.fields, fields_before);
    assert!(!registry.has_field("u_username"));

    registry.criteria[0].value = Some(Scalar::Int(1));
    derive_query(&mut registry, &mut query).unwrap();
    assert!(registry.has_field("u_username"));
    assert_eq!(query.where_conditions().len(), 2);
    assert_eq!(query.from_entries().count(), 2);
}

#[test]
fn join_without_alias_rejected() {
    let mut registry = content_registry("list");
    registry.joins.push(JoinDef {
        alias: String::new(),
        ..users_join(&["id"], &["created_by"])
    });
    let err = derive_query(&mut registry, &mut Query::new()).unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)), "{err:?}");
}

// ===================================================================
// Criteria and dialects
// ===================================================================

#[test]
fn name_key_used_without_primary_key() {
    let mut registry = content_registry("item");
    registry.name_key_value = Some(String::from("O'Brien"));
    let mut query = Query::new();
    derive_query(&mut registry, &mut query).unwrap();
    assert!(query
        .render_sql()
        .unwrap()
        .ends_with(r#"WHERE "a"."title" = 'O''Brien'"#));
}

#[test]
fn primary_key_wins_over_name_key() {
    let mut registry = content_registry("item");
    registry.primary_key_value = Some(8);
    registry.name_key_value = Some(String::from("About"));
    let mut query = Query::new();
    derive_query(&mut registry, &mut query).unwrap();
    assert_eq!(query.where_conditions().len(), 1);
    assert!(query.render_sql().unwrap().ends_with(r#"WHERE "a"."id" = 8"#));
}

#[test]
fn derived_query_renders_for_mysql() {
    let mut registry = content_registry("distinct");
    let mut query = Query::with_dialect(MySqlDialect::new());
    derive_query(&mut registry, &mut query).unwrap();
    assert_eq!(
        query.render_sql().unwrap(),
        "SELECT `a`.`id`, `a`.`title` FROM `#__content` AS `a`"
    );
}

#[test]
fn caller_columns_and_ordering_are_kept() {
    let mut registry = content_registry("list");
    let mut query = Query::new();
    query
        .select("a.title", None, None, "column")
        .unwrap()
        .order_by("a.title", Some("desc"))
        .unwrap();
    derive_query(&mut registry, &mut query).unwrap();
    assert_eq!(
        query.render_sql().unwrap(),
        r##"SELECT "a"."title" FROM "#__content" AS "a" ORDER BY "a"."title" DESC"##
    );
}
