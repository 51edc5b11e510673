//! Query derivation from a model registry.
//!
//! [`derive_query`] drives a [`Query`] from the facts in a [`ModelRegistry`]
//! in a fixed order: column selection, primary table, key criteria, joins,
//! model criteria, then the registry's criteria list.

use oxide_query::{Dialect, Query, Scalar};
use tracing::debug;

use crate::error::Result;
use crate::registry::{FieldDef, ModelRegistry, QueryObject};

/// Property tokens that join conditions may use in place of a column.
/// Matched case-sensitively so lower-case column names are never replaced.
const SUBSTITUTION_TOKENS: [&str; 4] = ["APPLICATION_ID", "SITE_ID", "MENU_ID", "CATALOG_TYPE_ID"];

/// Derives columns, tables and criteria for `registry` into `query`.
///
/// Derivation runs against a copy of `query`, which replaces it only when
/// every step succeeded; on error neither `query` nor `registry` changes.
/// Joined columns are registered on the registry as calculated, locked
/// fields.
pub fn derive_query<D: Dialect + Clone>(
    registry: &mut ModelRegistry,
    query: &mut Query<D>,
) -> Result<()> {
    for join in &registry.joins {
        join.validate()?;
    }

    let mut staged = query.clone();
    let mut fields = registry.fields.clone();
    derive_steps(registry, &mut fields, &mut staged)?;

    *query = staged;
    registry.fields = fields;
    Ok(())
}

fn derive_steps<D: Dialect>(
    registry: &ModelRegistry,
    fields: &mut Vec<FieldDef>,
    query: &mut Query<D>,
) -> Result<()> {
    select_columns(registry, query)?;
    set_from(registry, query)?;
    key_criteria(registry, query)?;
    joins(registry, fields, query)?;
    model_criteria(registry, query)?;
    criteria_array(registry, query)?;
    Ok(())
}

fn select_columns<D: Dialect>(registry: &ModelRegistry, query: &mut Query<D>) -> Result<()> {
    if query.has_columns() {
        debug!("Columns already selected, skipping defaults");
        return Ok(());
    }

    match registry.query_object() {
        QueryObject::Result => {
            let key = if registry.name_value().is_some() {
                &registry.name_key
            } else {
                &registry.primary_key
            };
            query.select(&registry.qualified(key), None, None, "column")?;
        }
        QueryObject::Distinct => {
            query
                .select(&registry.qualified(&registry.primary_key), None, None, "column")?
                .select(&registry.qualified(&registry.name_key), None, None, "column")?;
        }
        QueryObject::List | QueryObject::Item => {
            let mut selected = 0;
            for field in registry.fields.iter().filter(|f| !f.calculated) {
                query.select(&registry.qualified(&field.name), None, None, "column")?;
                selected += 1;
            }
            if selected == 0 {
                query.select(&registry.qualified("*"), None, None, "column")?;
            }
        }
    }
    debug!(query_object = %registry.query_object(), "Selected default columns");
    Ok(())
}

fn set_from<D: Dialect>(registry: &ModelRegistry, query: &mut Query<D>) -> Result<()> {
    if !query.has_from() {
        query.from(&registry.table_name, &registry.primary_prefix, true)?;
    }
    Ok(())
}

fn key_criteria<D: Dialect>(registry: &ModelRegistry, query: &mut Query<D>) -> Result<()> {
    if let Some(key) = registry.key_value() {
        query.where_clause(
            "column",
            registry.qualified(&registry.primary_key),
            "=",
            "integer",
            key,
        )?;
        debug!(key, "Added primary key criterion");
    } else if let Some(name) = registry.name_value() {
        query.where_clause(
            "column",
            registry.qualified(&registry.name_key),
            "=",
            "string",
            name,
        )?;
        debug!(name, "Added name key criterion");
    }
    Ok(())
}

fn joins<D: Dialect>(
    registry: &ModelRegistry,
    fields: &mut Vec<FieldDef>,
    query: &mut Query<D>,
) -> Result<()> {
    let joins = &registry.joins;
    let select_joined = !matches!(
        registry.query_object(),
        QueryObject::Result | QueryObject::Distinct
    );

    for join in joins {
        let mut emitted = false;

        if select_joined {
            for column in &join.select {
                let alias = format!("{}_{column}", join.alias);
                query.select(&format!("{}.{column}", join.alias), Some(&alias), None, "column")?;
                ModelRegistry::register_calculated_field(fields, &alias);
                emitted = true;
            }
        }

        for (to, with) in join.join_to.iter().zip(&join.join_with) {
            let (left_filter, left) = resolve_join_side(registry, to, &join.alias);
            let (right_filter, right) = resolve_join_side(registry, with, &registry.primary_prefix);
            query.where_clause(left_filter, left, "=", right_filter, right)?;
            emitted = true;
        }

        if emitted {
            query.from(&join.table_name, &join.alias, false)?;
        }
        debug!(table = %join.table_name, alias = %join.alias, emitted, "Processed join");
    }
    Ok(())
}

/// Resolves one side of a join condition to a filter and a value.
fn resolve_join_side(registry: &ModelRegistry, token: &str, prefix: &str) -> (&'static str, Scalar) {
    let token = token.trim();
    if let Some(value) = substitution(registry, token) {
        return ("integer", Scalar::Int(value));
    }
    if let Ok(number) = token.parse::<i64>() {
        return ("integer", Scalar::Int(number));
    }
    if token.contains('.') {
        ("column", Scalar::Text(token.to_string()))
    } else {
        ("column", Scalar::Text(format!("{prefix}.{token}")))
    }
}

fn substitution(registry: &ModelRegistry, token: &str) -> Option<i64> {
    if !SUBSTITUTION_TOKENS.contains(&token) {
        return None;
    }
    let value = match token {
        "APPLICATION_ID" => registry.runtime.application_id,
        "SITE_ID" => registry.runtime.site_id,
        "MENU_ID" => registry.criteria_menu_id,
        _ => registry.criteria_catalog_type_id,
    };
    Some(value.unwrap_or(0))
}

fn model_criteria<D: Dialect>(registry: &ModelRegistry, query: &mut Query<D>) -> Result<()> {
    if let Some(status) = registry.criteria_status.as_deref() {
        if registry.has_field("status") && !status.trim().is_empty() {
            query.where_clause("column", registry.qualified("status"), "IN", "integer", status)?;
        }
    }

    let scalars = [
        ("catalog_type_id", registry.criteria_catalog_type_id),
        ("extension_instance_id", registry.criteria_extension_instance_id),
        ("menu_id", registry.criteria_menu_id),
    ];
    for (column, value) in scalars {
        match value {
            Some(value) if value != 0 && registry.has_field(column) => {
                query.where_clause("column", registry.qualified(column), "=", "integer", value)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn criteria_array<D: Dialect>(registry: &ModelRegistry, query: &mut Query<D>) -> Result<()> {
    for criterion in &registry.criteria {
        let operator = if criterion.operator.trim().is_empty() {
            "="
        } else {
            criterion.operator.as_str()
        };

        match (&criterion.value, &criterion.name2) {
            (Some(value), _) if !value.is_null() => {
                query.where_clause("column", criterion.name.as_str(), operator, "integer", value)?;
            }
            (_, Some(name2)) => {
                query.where_clause("column", criterion.name.as_str(), operator, "column", name2)?;
            }
            _ => {
                debug!(name = %criterion.name, "Criterion has neither value nor name2, skipping");
            }
        }
    }
    Ok(())
}
