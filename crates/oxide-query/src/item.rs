//! Clause items and conditions.
//!
//! A [`ClauseItem`] is one column, literal or verbatim SQL fragment inside a
//! clause; a [`Condition`] joins two of them with an operator and records
//! which where/having group it belongs to.

use std::fmt;

use crate::error::{QueryError, Result};
use crate::fieldhandler::Fieldhandler;
use crate::value::Scalar;

/// Declared type of a clause item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataType {
    /// A column reference, rendered as a quoted identifier.
    #[default]
    Column,
    /// A verbatim SQL fragment (e.g. `COUNT(*)`), never quoted or split.
    Special,
    /// An untyped field value, rendered as quoted text.
    Field,
    /// Text.
    String,
    /// Integer.
    Integer,
    /// Boolean, rendered as `1`/`0`.
    Boolean,
    /// Floating point or decimal.
    Float,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
    /// Date and time (`YYYY-MM-DD HH:MM:SS`).
    Datetime,
    /// E-mail address.
    Email,
    /// Absolute URL.
    Url,
    /// Letters only.
    Alpha,
    /// Letters and digits only.
    Alphanumeric,
    /// Any other type name; rendered as quoted text.
    Other(String),
}

impl DataType {
    /// Parses a type name case-insensitively. An empty name means a column.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "column" => Self::Column,
            "special" => Self::Special,
            "field" => Self::Field,
            "string" | "text" | "char" | "varchar" => Self::String,
            "integer" | "int" | "bigint" | "smallint" | "tinyint" => Self::Integer,
            "boolean" | "bool" => Self::Boolean,
            "float" | "double" | "decimal" | "real" | "numeric" => Self::Float,
            "date" => Self::Date,
            "datetime" | "timestamp" => Self::Datetime,
            "email" => Self::Email,
            "url" => Self::Url,
            "alpha" => Self::Alpha,
            "alphanumeric" => Self::Alphanumeric,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the canonical type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Column => "column",
            Self::Special => "special",
            Self::Field => "field",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Email => "email",
            Self::Url => "url",
            Self::Alpha => "alpha",
            Self::Alphanumeric => "alphanumeric",
            Self::Other(name) => name,
        }
    }

    /// Returns whether values of this type render without quotes.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Boolean | Self::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DataType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// Sort direction for ORDER BY items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl SortDirection {
    /// Parses a direction. Only `ASC` (any case) is ascending; everything
    /// else, including an empty string, sorts descending.
    #[must_use]
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("ASC") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Boolean connector placed in front of a condition or a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    /// AND
    #[default]
    And,
    /// OR
    Or,
}

impl Connector {
    /// Parses a connector case-insensitively; anything but `OR` is `AND`.
    #[must_use]
    pub fn parse(connector: &str) -> Self {
        if connector.trim().eq_ignore_ascii_case("OR") {
            Self::Or
        } else {
            Self::And
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One column, literal or verbatim fragment inside a clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseItem {
    /// Column, table or expression name.
    pub name: String,
    /// Table alias qualifying `name`, or empty.
    pub prefix: String,
    /// Declared type, which decides how the item is rendered.
    pub data_type: DataType,
    /// Literal value; always `None` for columns.
    pub value: Option<Scalar>,
    /// Output alias.
    pub alias: Option<String>,
    /// Sort direction, set for ORDER BY items only.
    pub direction: Option<SortDirection>,
}

impl ClauseItem {
    /// Creates a clause item.
    ///
    /// An empty `name` is rejected unless the type is `Field` or `Special`,
    /// in which case the name becomes `"value"`. Names of non-special items
    /// are split on the first `.` into prefix and name. When a field handler
    /// is given the value is sanitized through it; for `IN` and `NOT IN`
    /// conditions every non-blank comma-separated piece is sanitized on its own.
    pub fn new(
        name: &str,
        data_type: DataType,
        value: Option<Scalar>,
        alias: Option<&str>,
        condition: &str,
        fieldhandler: Option<&dyn Fieldhandler>,
    ) -> Result<Self> {
        let mut name = name.trim().to_string();
        if name.is_empty() {
            if matches!(data_type, DataType::Field | DataType::Special) {
                name = String::from("value");
            } else {
                return Err(QueryError::required("clause_item", "name"));
            }
        }

        if data_type == DataType::Column && value.is_some() {
            return Err(QueryError::Validation(format!(
                "column item {name} cannot carry a literal value"
            )));
        }

        let mut prefix = String::new();
        if data_type != DataType::Special {
            if let Some((head, tail)) = name.split_once('.') {
                prefix = head.to_string();
                name = tail.to_string();
            }
        }

        let value = match (value, fieldhandler) {
            (Some(value), Some(handler)) => Some(Self::filter_value(
                handler, &name, value, &data_type, condition,
            )?),
            (value, _) => value,
        };

        Ok(Self {
            name,
            prefix,
            data_type,
            value,
            alias: normalize_alias(alias),
            direction: None,
        })
    }

    /// Creates a column reference, splitting an optional `prefix.` off the name.
    pub fn column(name: &str) -> Result<Self> {
        Self::new(name, DataType::Column, None, None, "", None)
    }

    /// Creates a table reference for the FROM list. Table names are not split.
    #[must_use]
    pub fn table(name: &str, alias: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            prefix: String::new(),
            data_type: DataType::Column,
            value: None,
            alias: normalize_alias(Some(alias)),
            direction: None,
        }
    }

    /// Returns the `prefix.name` form used as a deduplication key.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.prefix, self.name)
        }
    }

    fn filter_value(
        handler: &dyn Fieldhandler,
        name: &str,
        value: Scalar,
        data_type: &DataType,
        condition: &str,
    ) -> Result<Scalar> {
        let operator = condition.trim().to_ascii_uppercase();
        if operator != "IN" && operator != "NOT IN" {
            return handler.sanitize(name, value, data_type);
        }

        let mut pieces = Vec::new();
        for piece in value.as_text().split(',').map(str::trim) {
            if piece.is_empty() {
                continue;
            }
            let piece = Scalar::Text(piece.to_string());
            pieces.push(handler.sanitize(name, piece, data_type)?.as_text());
        }
        Ok(Scalar::Text(pieces.join(",")))
    }
}

fn normalize_alias(alias: Option<&str>) -> Option<String> {
    alias
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

/// One where/having predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Group label; empty for the default group.
    pub group: String,
    /// Left-hand side.
    pub left: ClauseItem,
    /// Comparison operator, upper-cased (`=`, `<>`, `IN`, `LIKE`, ...).
    pub operator: String,
    /// Right-hand side.
    pub right: ClauseItem,
    /// Connector placed before this condition inside its group.
    pub connector: Connector,
}

impl Condition {
    /// Creates a condition, rejecting an empty operator or left-hand name.
    pub fn new(
        group: &str,
        left: ClauseItem,
        operator: &str,
        right: ClauseItem,
        connector: Connector,
    ) -> Result<Self> {
        let operator = operator.trim();
        if operator.is_empty() {
            return Err(QueryError::required("condition", "condition"));
        }
        if left.name.is_empty() {
            return Err(QueryError::required("condition", "left"));
        }
        Ok(Self {
            group: group.trim().to_string(),
            left,
            operator: operator.to_ascii_uppercase(),
            right,
            connector,
        })
    }

    /// Returns whether this is an `IN` list comparison.
    #[must_use]
    pub fn is_in_list(&self) -> bool {
        self.operator == "IN" || self.operator == "NOT IN"
    }
}
