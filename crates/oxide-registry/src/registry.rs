//! Model registries.
//!
//! A [`ModelRegistry`] describes one queryable entity: its table, keys,
//! fields, joins, foreign keys, default criteria and paging mode. Registries
//! arrive as a [`RawModelRegistry`] (usually JSON) and are completed by
//! [`ModelRegistry::new`], which fills every default exactly once.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use oxide_query::Scalar;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};

/// Alias given to the primary table when none is configured.
pub const DEFAULT_PRIMARY_PREFIX: &str = "a";
/// Primary key column used when none is configured.
pub const DEFAULT_PRIMARY_KEY: &str = "id";
/// Name key column used when none is configured.
pub const DEFAULT_NAME_KEY: &str = "title";
/// Page size used by list registries when none is configured.
pub const DEFAULT_MODEL_COUNT: u64 = 20;

/// How the results of a read are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryObject {
    /// A paginated list of rows.
    #[default]
    List,
    /// The first row only.
    Item,
    /// A single scalar.
    Result,
    /// Key/name pairs.
    Distinct,
}

impl QueryObject {
    /// Parses a query object name case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "list" => Some(Self::List),
            "item" => Some(Self::Item),
            "result" => Some(Self::Result),
            "distinct" => Some(Self::Distinct),
            _ => None,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Item => "item",
            Self::Result => "result",
            Self::Distinct => "distinct",
        }
    }
}

impl fmt::Display for QueryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of the model.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    pub name: String,
    /// Data type name understood by the field handler (`integer`, `string`, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    pub nullable: bool,
    pub default: Option<Scalar>,
    /// Generated by the database; never written.
    pub identity: bool,
    /// Produced by the query (joined columns); not a table column.
    pub calculated: bool,
    /// Cannot be changed by updates.
    pub locked: bool,
}

impl FieldDef {
    /// Creates a plain field.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }

    /// Returns whether create and update may write this field.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !self.identity && !self.calculated
    }
}

/// A table joined to the primary table.
///
/// `join_to` columns belong to the joined table and `join_with` columns to
/// the primary table; they are paired by position. Both lists accept either
/// a JSON array or a comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JoinDef {
    pub table_name: String,
    pub alias: String,
    #[serde(deserialize_with = "comma_list")]
    pub select: Vec<String>,
    #[serde(deserialize_with = "comma_list")]
    pub join_to: Vec<String>,
    #[serde(deserialize_with = "comma_list")]
    pub join_with: Vec<String>,
}

impl JoinDef {
    /// Checks the join is complete and its column lists pair up.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(RegistryError::Validation(String::from(
                "join table_name is required",
            )));
        }
        if self.alias.trim().is_empty() {
            return Err(RegistryError::Validation(format!(
                "join {} requires an alias",
                self.table_name
            )));
        }
        if self.join_to.len() != self.join_with.len() {
            return Err(RegistryError::Validation(format!(
                "join {} pairs {} join_to column(s) with {} join_with column(s)",
                self.table_name,
                self.join_to.len(),
                self.join_with.len()
            )));
        }
        Ok(())
    }
}

/// A field whose value must exist as a key in another table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForeignKeyDef {
    /// Field on this model.
    pub name: String,
    /// Key column in the source table.
    pub source_id: String,
    pub source_table: String,
}

/// A static criterion added to every derived read.
///
/// Either compares `name` to an integer `value`, or to the column `name2`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CriteriaDef {
    pub name: String,
    /// Comparison operator; `=` when empty.
    #[serde(alias = "connector")]
    pub operator: String,
    pub value: Option<Scalar>,
    pub name2: Option<String>,
}

/// Values supplied by the running application rather than the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeProperties {
    pub application_id: Option<i64>,
    pub site_id: Option<i64>,
}

/// A registry as it arrives from configuration. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawModelRegistry {
    pub table_name: Option<String>,
    pub primary_prefix: Option<String>,
    pub primary_key: Option<String>,
    pub primary_key_value: Option<i64>,
    pub name_key: Option<String>,
    pub name_key_value: Option<String>,
    pub fields: Vec<FieldDef>,
    pub custom_fields: BTreeMap<String, Vec<FieldDef>>,
    pub joins: Vec<JoinDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    pub criteria: Vec<CriteriaDef>,
    pub query_object: Option<String>,
    pub use_pagination: Option<bool>,
    pub model_offset: Option<u64>,
    pub model_count: Option<u64>,
    pub criteria_status: Option<String>,
    pub criteria_catalog_type_id: Option<i64>,
    pub criteria_extension_instance_id: Option<i64>,
    pub criteria_menu_id: Option<i64>,
    #[serde(flatten)]
    pub runtime: RuntimeProperties,
}

/// A completed model registry.
///
/// Paging fields are private so the "only lists paginate" rule cannot be
/// broken after construction; use [`ModelRegistry::set_pagination`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    pub table_name: String,
    pub primary_prefix: String,
    pub primary_key: String,
    pub primary_key_value: Option<i64>,
    pub name_key: String,
    pub name_key_value: Option<String>,
    pub fields: Vec<FieldDef>,
    /// Named groups of fields stored outside the table's own columns.
    pub custom_fields: BTreeMap<String, Vec<FieldDef>>,
    pub joins: Vec<JoinDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    pub criteria: Vec<CriteriaDef>,
    pub criteria_status: Option<String>,
    pub criteria_catalog_type_id: Option<i64>,
    pub criteria_extension_instance_id: Option<i64>,
    pub criteria_menu_id: Option<i64>,
    pub runtime: RuntimeProperties,
    query_object: QueryObject,
    use_pagination: bool,
    model_offset: u64,
    model_count: u64,
}

impl ModelRegistry {
    /// Completes a raw registry, applying every default.
    ///
    /// Fails when the table name is missing, a field has no name, or a join
    /// is invalid. An unknown query object falls back to `list`.
    pub fn new(raw: RawModelRegistry) -> Result<Self> {
        let table_name = non_empty(raw.table_name).ok_or_else(|| {
            RegistryError::Validation(String::from("table_name is required"))
        })?;

        if let Some(field) = raw.fields.iter().find(|f| f.name.trim().is_empty()) {
            return Err(RegistryError::Validation(format!(
                "field of type {:?} in {table_name} has no name",
                field.field_type
            )));
        }
        for join in &raw.joins {
            join.validate()?;
        }

        let query_object = match non_empty(raw.query_object) {
            None => QueryObject::List,
            Some(name) => QueryObject::from_name(&name).unwrap_or_else(|| {
                warn!(table = %table_name, query_object = %name, "Unknown query object, using list");
                QueryObject::List
            }),
        };

        let (use_pagination, model_offset, model_count) = if query_object == QueryObject::List {
            (
                raw.use_pagination.unwrap_or(true),
                raw.model_offset.unwrap_or(0),
                raw.model_count.unwrap_or(DEFAULT_MODEL_COUNT),
            )
        } else {
            (false, 0, 0)
        };

        let registry = Self {
            table_name,
            primary_prefix: non_empty(raw.primary_prefix)
                .unwrap_or_else(|| String::from(DEFAULT_PRIMARY_PREFIX)),
            primary_key: non_empty(raw.primary_key)
                .unwrap_or_else(|| String::from(DEFAULT_PRIMARY_KEY)),
            primary_key_value: raw.primary_key_value,
            name_key: non_empty(raw.name_key).unwrap_or_else(|| String::from(DEFAULT_NAME_KEY)),
            name_key_value: non_empty(raw.name_key_value),
            fields: raw.fields,
            custom_fields: raw.custom_fields,
            joins: raw.joins,
            foreign_keys: raw.foreign_keys,
            criteria: raw.criteria,
            criteria_status: non_empty(raw.criteria_status),
            criteria_catalog_type_id: raw.criteria_catalog_type_id,
            criteria_extension_instance_id: raw.criteria_extension_instance_id,
            criteria_menu_id: raw.criteria_menu_id,
            runtime: raw.runtime,
            query_object,
            use_pagination,
            model_offset,
            model_count,
        };
        debug!(
            table = %registry.table_name,
            query_object = %registry.query_object,
            fields = registry.fields.len(),
            joins = registry.joins.len(),
            "Loaded model registry"
        );
        Ok(registry)
    }

    /// Parses and completes a JSON registry.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawModelRegistry = serde_json::from_str(json)?;
        Self::new(raw)
    }

    /// Reads, parses and completes a JSON registry file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub const fn query_object(&self) -> QueryObject {
        self.query_object
    }

    pub const fn use_pagination(&self) -> bool {
        self.use_pagination
    }

    pub const fn model_offset(&self) -> u64 {
        self.model_offset
    }

    pub const fn model_count(&self) -> u64 {
        self.model_count
    }

    /// Sets the paging window requested at runtime.
    ///
    /// Only list registries paginate; for any other query object the call is
    /// ignored and `false` is returned.
    pub fn set_pagination(&mut self, offset: u64, count: u64) -> bool {
        if self.query_object != QueryObject::List {
            return false;
        }
        self.model_offset = offset;
        self.model_count = count;
        true
    }

    /// Finds a table field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns a named group of custom fields.
    pub fn custom_field_group(&self, group: &str) -> Option<&[FieldDef]> {
        self.custom_fields.get(group).map(Vec::as_slice)
    }

    /// Returns the primary key value when it selects a row.
    pub fn key_value(&self) -> Option<i64> {
        self.primary_key_value.filter(|v| *v > 0)
    }

    /// Returns the name key value when it is set.
    pub fn name_value(&self) -> Option<&str> {
        self.name_key_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Returns `prefix.column` for a column of the primary table.
    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{column}", self.primary_prefix)
    }

    /// Records a column produced by the query itself, such as a joined column.
    pub(crate) fn register_calculated_field(fields: &mut Vec<FieldDef>, name: &str) {
        if fields.iter().any(|f| f.name == name) {
            return;
        }
        fields.push(FieldDef {
            name: name.to_string(),
            calculated: true,
            locked: true,
            ..FieldDef::default()
        });
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrText {
    List(Vec<String>),
    Text(String),
}

fn comma_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    let items = match ListOrText::deserialize(deserializer)? {
        ListOrText::List(items) => items,
        ListOrText::Text(text) => text.split(',').map(str::to_string).collect(),
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(table: &str) -> RawModelRegistry {
        RawModelRegistry {
            table_name: Some(table.to_string()),
            ..RawModelRegistry::default()
        }
    }

    #[test]
    fn test_defaults() {
        let registry = ModelRegistry::new(raw("#__content")).unwrap();
        assert_eq!(registry.primary_prefix, "a");
        assert_eq!(registry.primary_key, "id");
        assert_eq!(registry.name_key, "title");
        assert_eq!(registry.query_object(), QueryObject::List);
        assert!(registry.use_pagination());
        assert_eq!(registry.model_offset(), 0);
        assert_eq!(registry.model_count(), DEFAULT_MODEL_COUNT);
    }

    #[test]
    fn test_table_name_required() {
        let err = ModelRegistry::new(raw("  ")).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn test_unknown_query_object_is_list() {
        let mut input = raw("t");
        input.query_object = Some(String::from("bogus"));
        let registry = ModelRegistry::new(input).unwrap();
        assert_eq!(registry.query_object(), QueryObject::List);
        assert!(registry.use_pagination());
    }

    #[test]
    fn test_non_list_forces_pagination_off() {
        for name in ["item", "Result", "DISTINCT"] {
            let mut input = raw("t");
            input.query_object = Some(name.to_string());
            input.use_pagination = Some(true);
            input.model_offset = Some(40);
            input.model_count = Some(10);
            let mut registry = ModelRegistry::new(input).unwrap();
            assert!(!registry.use_pagination(), "{name}");
            assert_eq!((registry.model_offset(), registry.model_count()), (0, 0));
            assert!(!registry.set_pagination(5, 5));
            assert_eq!((registry.model_offset(), registry.model_count()), (0, 0));
        }
    }

    #[test]
    fn test_set_pagination_on_list() {
        let mut registry = ModelRegistry::new(raw("t")).unwrap();
        assert!(registry.set_pagination(10, 5));
        assert_eq!((registry.model_offset(), registry.model_count()), (10, 5));
    }

    #[test]
    fn test_join_length_mismatch_rejected() {
        let mut input = raw("t");
        input.joins.push(JoinDef {
            table_name: String::from("#__users"),
            alias: String::from("b"),
            select: vec![],
            join_to: vec![String::from("id"), String::from("site_id")],
            join_with: vec![String::from("created_by")],
        });
        let err = ModelRegistry::new(input).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn test_from_json() {
        let registry = ModelRegistry::from_json(
            r##"{
                "table_name": "#__content",
                "primary_prefix": "c",
                "query_object": "item",
                "application_id": 2,
                "fields": [
                    {"name": "id", "type": "integer", "identity": true},
                    {"name": "title", "type": "string"},
                    {"name": "catalog_id", "type": "integer", "default": 0}
                ],
                "custom_fields": {
                    "parameters": [{"name": "theme", "type": "string"}]
                },
                "joins": [
                    {"table_name": "#__users", "alias": "u", "select": "username, email",
                     "join_to": "id", "join_with": ["created_by"]}
                ],
                "criteria": [{"name": "c.state", "connector": ">", "value": 0}]
            }"##,
        )
        .unwrap();

        assert_eq!(registry.primary_prefix, "c");
        assert_eq!(registry.query_object(), QueryObject::Item);
        assert_eq!(registry.runtime.application_id, Some(2));
        assert!(registry.field("id").unwrap().identity);
        assert_eq!(registry.field("catalog_id").unwrap().default, Some(Scalar::Int(0)));
        assert_eq!(registry.joins[0].select, vec!["username", "email"]);
        assert_eq!(registry.joins[0].join_with, vec!["created_by"]);
        assert_eq!(registry.criteria[0].operator, ">");
        assert_eq!(registry.custom_field_group("parameters").unwrap()[0].name, "theme");
        assert!(registry.custom_field_group("metadata").is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = ModelRegistry::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn test_key_value_ignores_zero() {
        let mut registry = ModelRegistry::new(raw("t")).unwrap();
        registry.primary_key_value = Some(0);
        assert_eq!(registry.key_value(), None);
        registry.primary_key_value = Some(7);
        assert_eq!(registry.key_value(), Some(7));
        registry.name_key_value = Some(String::from("  "));
        assert_eq!(registry.name_value(), None);
    }

    #[test]
    fn test_register_calculated_field_once() {
        let mut registry = ModelRegistry::new(raw("t")).unwrap();
        ModelRegistry::register_calculated_field(&mut registry.fields, "b_title");
        ModelRegistry::register_calculated_field(&mut registry.fields, "b_title");
        assert_eq!(registry.fields.len(), 1);
        let field = registry.field("b_title").unwrap();
        assert!(field.calculated && field.locked);
        assert!(!field.is_writable());
    }
}
