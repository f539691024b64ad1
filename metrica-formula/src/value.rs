//! Scalar values carried by dataset records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single field value in a survey record.
///
/// Values are pre-coerced by whatever parsed the upload: numbers, strings
/// (dates arrive as ISO strings), booleans, or null for missing cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Returns true for null and for numbers that are NaN.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(n) => n.is_nan(),
            Self::Bool(_) | Self::Text(_) => false,
        }
    }

    /// Coerce to a number, returning `None` when the value has no numeric
    /// reading.
    ///
    /// Text is trimmed and parsed; booleans read as 1 and 0.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Null => return None,
            Self::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (!n.is_nan()).then_some(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            // Integral numbers render without a fractional part so that a
            // cell holding 2 compares equal to the literal "2".
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
