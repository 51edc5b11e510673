//! Scalar values carried by clause items and returned by adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar value.
///
/// Values reach the statement either already sanitized by a
/// [`Fieldhandler`](crate::Fieldhandler) or as trusted literals; rendering
/// decides between quoting and bare output from the item's data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl Scalar {
    /// Returns the textual form used when the value is placed into SQL.
    ///
    /// Booleans become `1`/`0` so they work on engines without a boolean type.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Returns true for NULL and for text that is empty after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns the value as an integer when it has an exact integer form.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Float(_) | Self::Null => None,
        }
    }

    /// Returns true for the NULL value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Trait for types that can be converted to scalars.
pub trait ToScalar {
    /// Converts the value to a `Scalar`.
    fn to_scalar(self) -> Scalar;
}

impl ToScalar for Scalar {
    fn to_scalar(self) -> Scalar {
        self
    }
}

impl ToScalar for &Scalar {
    fn to_scalar(self) -> Scalar {
        self.clone()
    }
}

impl ToScalar for bool {
    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }
}

impl ToScalar for i64 {
    fn to_scalar(self) -> Scalar {
        Scalar::Int(self)
    }
}

impl ToScalar for i32 {
    fn to_scalar(self) -> Scalar {
        Scalar::Int(i64::from(self))
    }
}

impl ToScalar for u32 {
    fn to_scalar(self) -> Scalar {
        Scalar::Int(i64::from(self))
    }
}

impl ToScalar for f64 {
    fn to_scalar(self) -> Scalar {
        Scalar::Float(self)
    }
}

impl ToScalar for String {
    fn to_scalar(self) -> Scalar {
        Scalar::Text(self)
    }
}

impl ToScalar for &String {
    fn to_scalar(self) -> Scalar {
        Scalar::Text(self.clone())
    }
}

impl ToScalar for &str {
    fn to_scalar(self) -> Scalar {
        Scalar::Text(String::from(self))
    }
}

impl<T: ToScalar> ToScalar for Option<T> {
    fn to_scalar(self) -> Scalar {
        match self {
            Some(v) => v.to_scalar(),
            None => Scalar::Null,
        }
    }
}
