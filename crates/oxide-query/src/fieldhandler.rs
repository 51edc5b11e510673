//! Field value sanitization.
//!
//! Values that end up in generated SQL go through a [`Fieldhandler`] first,
//! which coerces them to their declared type or rejects them.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{QueryError, Result};
use crate::item::DataType;
use crate::value::Scalar;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url pattern")
});

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Trait for field value sanitizers.
pub trait Fieldhandler: Send + Sync {
    /// Coerces `value` to `data_type`, or fails with
    /// [`QueryError::Sanitization`].
    fn sanitize(&self, field_name: &str, value: Scalar, data_type: &DataType) -> Result<Scalar>;
}

/// The default field handler.
///
/// NULL always passes. Columns, special fragments, untyped fields and
/// unknown types pass through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFieldhandler;

impl StandardFieldhandler {
    /// Creates a new StandardFieldhandler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Fieldhandler for StandardFieldhandler {
    fn sanitize(&self, field_name: &str, value: Scalar, data_type: &DataType) -> Result<Scalar> {
        if value.is_null() {
            return Ok(Scalar::Null);
        }

        let fail = |message: &str| QueryError::Sanitization {
            field: field_name.to_string(),
            data_type: data_type.to_string(),
            message: message.to_string(),
        };

        match data_type {
            DataType::Column | DataType::Special | DataType::Field | DataType::Other(_) => {
                Ok(value)
            }
            DataType::Integer => to_integer(&value).ok_or_else(|| fail("not an integer")),
            DataType::Float => to_float(&value).ok_or_else(|| fail("not a number")),
            DataType::Boolean => to_boolean(&value).ok_or_else(|| fail("not a boolean")),
            DataType::String => Ok(Scalar::Text(value.as_text().replace('\0', ""))),
            DataType::Date => to_date(&value.as_text()).ok_or_else(|| fail("not a date")),
            DataType::Datetime => {
                to_datetime(&value.as_text()).ok_or_else(|| fail("not a date and time"))
            }
            DataType::Email => {
                let text = value.as_text().trim().to_string();
                if EMAIL.is_match(&text) {
                    Ok(Scalar::Text(text))
                } else {
                    Err(fail("not a valid email address"))
                }
            }
            DataType::Url => {
                let text = value.as_text().trim().to_string();
                if URL.is_match(&text) {
                    Ok(Scalar::Text(text))
                } else {
                    Err(fail("not a valid URL"))
                }
            }
            DataType::Alpha => {
                let text = value.as_text();
                if !text.is_empty() && text.chars().all(char::is_alphabetic) {
                    Ok(Scalar::Text(text))
                } else {
                    Err(fail("letters only"))
                }
            }
            DataType::Alphanumeric => {
                let text = value.as_text();
                if !text.is_empty() && text.chars().all(char::is_alphanumeric) {
                    Ok(Scalar::Text(text))
                } else {
                    Err(fail("letters and digits only"))
                }
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_integer(value: &Scalar) -> Option<Scalar> {
    match value {
        Scalar::Int(n) => Some(Scalar::Int(*n)),
        Scalar::Bool(b) => Some(Scalar::Int(i64::from(*b))),
        Scalar::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(Scalar::Int(*f as i64)),
        Scalar::Text(s) => s.trim().parse().ok().map(Scalar::Int),
        Scalar::Float(_) | Scalar::Null => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_float(value: &Scalar) -> Option<Scalar> {
    match value {
        Scalar::Float(f) => Some(Scalar::Float(*f)),
        Scalar::Int(n) => Some(Scalar::Float(*n as f64)),
        Scalar::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Scalar::Float),
        Scalar::Bool(_) | Scalar::Null => None,
    }
}

fn to_boolean(value: &Scalar) -> Option<Scalar> {
    match value {
        Scalar::Bool(b) => Some(Scalar::Bool(*b)),
        Scalar::Int(0) => Some(Scalar::Bool(false)),
        Scalar::Int(1) => Some(Scalar::Bool(true)),
        Scalar::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(Scalar::Bool(true)),
            "0" | "false" | "no" | "off" => Some(Scalar::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn to_date(text: &str) -> Option<Scalar> {
    let text = text.trim();
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| parse_datetime(text).map(|dt| dt.date()))?;
    Some(Scalar::Text(date.format(DATE_FORMAT).to_string()))
}

fn to_datetime(text: &str) -> Option<Scalar> {
    let text = text.trim();
    let datetime = parse_datetime(text).or_else(|| {
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })?;
    Some(Scalar::Text(datetime.format(DATETIME_FORMAT).to_string()))
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
