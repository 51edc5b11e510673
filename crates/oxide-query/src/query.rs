//! The statement accumulator.
//!
//! [`Query`] collects the facts of one statement (columns, tables,
//! conditions, grouping, ordering and paging) through validated mutators.
//! A call either applies completely or returns an error before anything is
//! changed. [`Query::render_sql`] turns the state into SQL.

use std::fmt;
use std::sync::Arc;

use crate::dialect::{Dialect, GenericDialect};
use crate::error::{QueryError, Result};
use crate::fieldhandler::{Fieldhandler, StandardFieldhandler};
use crate::item::{ClauseItem, Condition, Connector, DataType, SortDirection};
use crate::value::{Scalar, ToScalar};

/// Statement type produced by [`Query::render_sql`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    /// `SELECT`
    #[default]
    Select,
    /// `INSERT INTO … VALUES`
    Insert,
    /// `INSERT INTO … SELECT`
    InsertFrom,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
    /// Stored routine invocation.
    Exec,
}

impl QueryType {
    /// Parses a statement type case-insensitively.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Self::Select),
            "insert" => Ok(Self::Insert),
            "insertfrom" => Ok(Self::InsertFrom),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "exec" => Ok(Self::Exec),
            other => Err(QueryError::Validation(format!(
                "unknown query type: {other}"
            ))),
        }
    }
}

/// A where/having group and the connector joining it to earlier groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDirective {
    /// Group label.
    pub group: String,
    /// Connector placed before the group.
    pub connector: Connector,
}

/// A mutable statement accumulator.
///
/// The dialect and field handler are driver-level configuration and survive
/// [`Query::clear_query`]; everything else is per statement.
///
/// # Example
///
/// ```rust
/// use oxide_query::Query;
///
/// let mut query = Query::new();
/// query
///     .select("a.id", None, None, "column")?
///     .from("#__content", "a", false)?
///     .where_clause("column", "a.catalog_id", "=", "integer", 5)?
///     .order_by("a.title", None)?;
///
/// assert_eq!(
///     query.render_sql()?,
///     r##"SELECT "a"."id" FROM "#__content" AS "a" WHERE "a"."catalog_id" = 5 ORDER BY "a"."title" ASC"##
/// );
/// # Ok::<(), oxide_query::QueryError>(())
/// ```
pub struct Query<D: Dialect = GenericDialect> {
    pub(crate) dialect: D,
    pub(crate) fieldhandler: Arc<dyn Fieldhandler>,
    pub(crate) query_type: QueryType,
    pub(crate) distinct: bool,
    pub(crate) columns: Vec<(String, ClauseItem)>,
    pub(crate) from: Vec<(String, ClauseItem)>,
    pub(crate) primary_from: Option<usize>,
    pub(crate) insert_into: Option<String>,
    pub(crate) where_groups: Vec<GroupDirective>,
    pub(crate) where_conditions: Vec<Condition>,
    pub(crate) having_groups: Vec<GroupDirective>,
    pub(crate) having_conditions: Vec<Condition>,
    pub(crate) group_by: Vec<ClauseItem>,
    pub(crate) order_by: Vec<ClauseItem>,
    pub(crate) offset: u64,
    pub(crate) limit: u64,
}

impl Query<GenericDialect> {
    /// Creates a query using the generic dialect and the standard field handler.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dialect(GenericDialect::new())
    }
}

impl Default for Query<GenericDialect> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dialect> fmt::Debug for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("dialect", &self.dialect.name())
            .field("query_type", &self.query_type)
            .field("distinct", &self.distinct)
            .field("columns", &self.columns)
            .field("from", &self.from)
            .field("primary_from", &self.primary_from)
            .field("insert_into", &self.insert_into)
            .field("where_groups", &self.where_groups)
            .field("where_conditions", &self.where_conditions)
            .field("having_groups", &self.having_groups)
            .field("having_conditions", &self.having_conditions)
            .field("group_by", &self.group_by)
            .field("order_by", &self.order_by)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl<D: Dialect + Clone> Clone for Query<D> {
    fn clone(&self) -> Self {
        Self {
            dialect: self.dialect.clone(),
            fieldhandler: Arc::clone(&self.fieldhandler),
            query_type: self.query_type,
            distinct: self.distinct,
            columns: self.columns.clone(),
            from: self.from.clone(),
            primary_from: self.primary_from,
            insert_into: self.insert_into.clone(),
            where_groups: self.where_groups.clone(),
            where_conditions: self.where_conditions.clone(),
            having_groups: self.having_groups.clone(),
            having_conditions: self.having_conditions.clone(),
            group_by: self.group_by.clone(),
            order_by: self.order_by.clone(),
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl<D: Dialect> Query<D> {
    /// Creates a query for the given dialect with the standard field handler.
    pub fn with_dialect(dialect: D) -> Self {
        Self {
            dialect,
            fieldhandler: Arc::new(StandardFieldhandler::new()),
            query_type: QueryType::Select,
            distinct: false,
            columns: Vec::new(),
            from: Vec::new(),
            primary_from: None,
            insert_into: None,
            where_groups: Vec::new(),
            where_conditions: Vec::new(),
            having_groups: Vec::new(),
            having_conditions: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            offset: 0,
            limit: 0,
        }
    }

    /// Replaces the field handler used to sanitize literal values.
    #[must_use]
    pub fn with_fieldhandler(mut self, fieldhandler: Arc<dyn Fieldhandler>) -> Self {
        self.fieldhandler = fieldhandler;
        self
    }

    /// Returns the dialect.
    pub const fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Returns the field handler.
    pub fn fieldhandler(&self) -> &dyn Fieldhandler {
        self.fieldhandler.as_ref()
    }

    /// Resets every per-statement field to its default.
    pub fn clear_query(&mut self) -> &mut Self {
        self.query_type = QueryType::Select;
        self.distinct = false;
        self.columns.clear();
        self.from.clear();
        self.primary_from = None;
        self.insert_into = None;
        self.where_groups.clear();
        self.where_conditions.clear();
        self.having_groups.clear();
        self.having_conditions.clear();
        self.group_by.clear();
        self.order_by.clear();
        self.offset = 0;
        self.limit = 0;
        self
    }

    /// Sets the statement type.
    pub fn set_type(&mut self, query_type: QueryType) -> &mut Self {
        self.query_type = query_type;
        self
    }

    /// Sets DISTINCT.
    pub fn set_distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Adds a column to the select list, or a column/value pair for
    /// insert and update statements.
    ///
    /// Without a value the item is a column reference unless `data_type` is
    /// `special`. Values are sanitized as `data_type`. Selecting the same
    /// `column_name` again replaces the earlier entry in place.
    pub fn select(
        &mut self,
        column_name: &str,
        alias: Option<&str>,
        value: Option<Scalar>,
        data_type: &str,
    ) -> Result<&mut Self> {
        let column_name = column_name.trim();
        if column_name.is_empty() {
            return Err(QueryError::required("select", "column_name"));
        }

        let mut data_type = DataType::parse(data_type);
        if value.is_none() && data_type != DataType::Special {
            data_type = DataType::Column;
        } else if value.is_some() && data_type == DataType::Column {
            data_type = DataType::String;
        }

        let item = ClauseItem::new(
            column_name,
            data_type,
            value,
            alias,
            "",
            Some(self.fieldhandler.as_ref()),
        )?;

        match self.columns.iter_mut().find(|(key, _)| key == column_name) {
            Some((_, existing)) => *existing = item,
            None => self.columns.push((column_name.to_string(), item)),
        }
        Ok(self)
    }

    /// Adds a table to the FROM list.
    ///
    /// The first table becomes the primary table; later tables only take over
    /// when `primary` is true. Adding the same table and alias twice is a no-op
    /// apart from the primary flag.
    pub fn from(&mut self, table_name: &str, alias: &str, primary: bool) -> Result<&mut Self> {
        let table_name = table_name.trim();
        if table_name.is_empty() {
            return Err(QueryError::required("from", "table_name"));
        }
        let alias = alias.trim();
        let key = format!("{table_name} {alias}");

        let index = match self.from.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.from
                    .push((key, ClauseItem::table(table_name, alias)));
                self.from.len() - 1
            }
        };

        if primary || self.primary_from.is_none() {
            self.primary_from = Some(index);
        }
        Ok(self)
    }

    /// Sets the target table of an insert.
    pub fn set_insert_into(&mut self, table_name: &str) -> Result<&mut Self> {
        let table_name = table_name.trim();
        if table_name.is_empty() {
            return Err(QueryError::required("set_insert_into", "table_name"));
        }
        self.insert_into = Some(table_name.to_string());
        Ok(self)
    }

    /// Registers a where group and the connector joining it to earlier groups.
    pub fn where_group(&mut self, group: &str, connector: &str) -> Result<&mut Self> {
        register_group(&mut self.where_groups, "where_group", group, connector)?;
        Ok(self)
    }

    /// Registers a having group and the connector joining it to earlier groups.
    pub fn having_group(&mut self, group: &str, connector: &str) -> Result<&mut Self> {
        register_group(&mut self.having_groups, "having_group", group, connector)?;
        Ok(self)
    }

    /// Adds an `AND`-connected condition to the default where group.
    ///
    /// A side whose filter is `column` is a column reference (`prefix.name`);
    /// any other filter makes it a literal sanitized as that type.
    pub fn where_clause(
        &mut self,
        left_filter: &str,
        left: impl ToScalar,
        condition: &str,
        right_filter: &str,
        right: impl ToScalar,
    ) -> Result<&mut Self> {
        self.where_grouped(
            left_filter,
            left,
            condition,
            right_filter,
            right,
            "AND",
            None,
        )
    }

    /// Adds a where condition with an explicit connector and group.
    #[allow(clippy::too_many_arguments)]
    pub fn where_grouped(
        &mut self,
        left_filter: &str,
        left: impl ToScalar,
        condition: &str,
        right_filter: &str,
        right: impl ToScalar,
        connector: &str,
        group: Option<&str>,
    ) -> Result<&mut Self> {
        let condition = self.build_condition(
            "where",
            (left_filter, left.to_scalar()),
            condition,
            (right_filter, right.to_scalar()),
            connector,
            group,
        )?;
        self.where_conditions.push(condition);
        Ok(self)
    }

    /// Adds an `AND`-connected condition to the default having group.
    pub fn having_clause(
        &mut self,
        left_filter: &str,
        left: impl ToScalar,
        condition: &str,
        right_filter: &str,
        right: impl ToScalar,
    ) -> Result<&mut Self> {
        self.having_grouped(
            left_filter,
            left,
            condition,
            right_filter,
            right,
            "AND",
            None,
        )
    }

    /// Adds a having condition with an explicit connector and group.
    #[allow(clippy::too_many_arguments)]
    pub fn having_grouped(
        &mut self,
        left_filter: &str,
        left: impl ToScalar,
        condition: &str,
        right_filter: &str,
        right: impl ToScalar,
        connector: &str,
        group: Option<&str>,
    ) -> Result<&mut Self> {
        let condition = self.build_condition(
            "having",
            (left_filter, left.to_scalar()),
            condition,
            (right_filter, right.to_scalar()),
            connector,
            group,
        )?;
        self.having_conditions.push(condition);
        Ok(self)
    }

    /// Adds a GROUP BY column.
    pub fn group_by(&mut self, column_name: &str) -> Result<&mut Self> {
        if column_name.trim().is_empty() {
            return Err(QueryError::required("group_by", "column_name"));
        }
        let item = ClauseItem::column(column_name)?;
        self.group_by.push(item);
        Ok(self)
    }

    /// Adds an ORDER BY column.
    ///
    /// `None` sorts ascending. An explicit direction other than `ASC` sorts
    /// descending.
    pub fn order_by(&mut self, column_name: &str, direction: Option<&str>) -> Result<&mut Self> {
        if column_name.trim().is_empty() {
            return Err(QueryError::required("order_by", "column_name"));
        }
        let mut item = ClauseItem::column(column_name)?;
        item.direction = Some(direction.map_or(SortDirection::Asc, SortDirection::parse));
        self.order_by.push(item);
        Ok(self)
    }

    /// Sets the paging window. Zero for both disables the limit clause.
    pub fn set_offset_and_limit(&mut self, offset: u64, limit: u64) -> &mut Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Returns the statement type.
    pub const fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// Returns whether DISTINCT is set.
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Returns the selected (or assigned) columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &ClauseItem> {
        self.columns.iter().map(|(_, item)| item)
    }

    /// Returns whether any column has been selected.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Returns the FROM entries in insertion order.
    pub fn from_entries(&self) -> impl Iterator<Item = &ClauseItem> {
        self.from.iter().map(|(_, item)| item)
    }

    /// Returns whether a FROM entry exists.
    pub fn has_from(&self) -> bool {
        !self.from.is_empty()
    }

    /// Returns the primary FROM entry.
    pub fn primary_from(&self) -> Option<&ClauseItem> {
        self.primary_from
            .and_then(|index| self.from.get(index))
            .map(|(_, item)| item)
    }

    /// Returns the insert target set through [`Query::set_insert_into`].
    pub fn insert_into(&self) -> Option<&str> {
        self.insert_into.as_deref()
    }

    /// Returns the where conditions in insertion order.
    pub fn where_conditions(&self) -> &[Condition] {
        &self.where_conditions
    }

    /// Returns the registered where groups.
    pub fn where_groups(&self) -> &[GroupDirective] {
        &self.where_groups
    }

    /// Returns the having conditions in insertion order.
    pub fn having_conditions(&self) -> &[Condition] {
        &self.having_conditions
    }

    /// Returns the GROUP BY items.
    pub fn group_by_items(&self) -> &[ClauseItem] {
        &self.group_by
    }

    /// Returns the ORDER BY items.
    pub fn order_by_items(&self) -> &[ClauseItem] {
        &self.order_by
    }

    /// Returns the paging offset.
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the paging limit.
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    fn build_condition(
        &self,
        method: &'static str,
        left: (&str, Scalar),
        condition: &str,
        right: (&str, Scalar),
        connector: &str,
        group: Option<&str>,
    ) -> Result<Condition> {
        if condition.trim().is_empty() {
            return Err(QueryError::required(method, "condition"));
        }
        let left_field = field_name(&left, &right, "left");
        let right_field = field_name(&right, &left, "right");
        let left = self.build_side(method, "left", &left_field, left, condition)?;
        let right = self.build_side(method, "right", &right_field, right, condition)?;
        Condition::new(
            group.unwrap_or(""),
            left,
            condition,
            right,
            Connector::parse(connector),
        )
    }

    fn build_side(
        &self,
        method: &'static str,
        parameter: &'static str,
        field: &str,
        (filter, value): (&str, Scalar),
        condition: &str,
    ) -> Result<ClauseItem> {
        let data_type = DataType::parse(filter);
        if data_type == DataType::Column {
            let name = value.as_text();
            if value.is_null() || name.trim().is_empty() {
                return Err(QueryError::required(method, parameter));
            }
            return ClauseItem::new(&name, DataType::Column, None, None, condition, None);
        }
        if is_in_list(condition) && value.as_text().split(',').all(|p| p.trim().is_empty()) {
            return Err(QueryError::required(method, parameter));
        }
        ClauseItem::new(
            field,
            data_type,
            Some(value),
            None,
            condition,
            Some(self.fieldhandler.as_ref()),
        )
    }
}

/// Names a literal side after the column it is compared with, so sanitizer
/// errors point at that column.
fn field_name(side: &(&str, Scalar), other: &(&str, Scalar), parameter: &str) -> String {
    let column = |(filter, value): &(&str, Scalar)| {
        (DataType::parse(filter) == DataType::Column && !value.is_empty())
            .then(|| value.as_text().trim().to_string())
    };
    column(side)
        .or_else(|| column(other))
        .unwrap_or_else(|| parameter.to_string())
}

fn is_in_list(condition: &str) -> bool {
    let operator = condition.trim().to_ascii_uppercase();
    operator == "IN" || operator == "NOT IN"
}

fn register_group(
    groups: &mut Vec<GroupDirective>,
    method: &'static str,
    group: &str,
    connector: &str,
) -> Result<()> {
    let group = group.trim();
    if group.is_empty() {
        return Err(QueryError::required(method, "group"));
    }
    let connector = Connector::parse(connector);
    match groups.iter_mut().find(|g| g.group == group) {
        Some(existing) => existing.connector = connector,
        None => groups.push(GroupDirective {
            group: group.to_string(),
            connector,
        }),
    }
    Ok(())
}
