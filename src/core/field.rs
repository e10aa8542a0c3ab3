//! Structured key/value fields attached to log records
//!
//! A [`Field`] is an immutable value object: its [`FieldKind`] is fixed by the
//! constructor that built it and exactly one value slot is populated. Backends
//! translate fields into their native representation by matching on the kind.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Key used by [`Field::error`].
pub const ERROR_KEY: &str = "error";

/// Tag describing which value slot of a [`Field`] is populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Num,
    Float,
    Bool,
    Any,
    Error,
}

/// Value carried by a [`Field`]
#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Num(i64),
    Float(f64),
    Bool(bool),
    /// Arbitrary serializable value, captured as JSON at construction
    Any(serde_json::Value),
    Error(Arc<dyn std::error::Error + Send + Sync>),
}

impl FieldValue {
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Num(_) => FieldKind::Num,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Any(_) => FieldKind::Any,
            FieldValue::Error(_) => FieldKind::Error,
        }
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Num(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Any(v) => v.clone(),
            FieldValue::Error(e) => serde_json::Value::String(e.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Num(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Any(serde_json::Value::String(s)) => write!(f, "{}", s),
            FieldValue::Any(v) => write!(f, "{}", v),
            FieldValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Num(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Num(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Any(v)
    }
}

/// One structured key/value pair attached to a log record
///
/// # Example
///
/// ```
/// use unified_logger::{Field, FieldKind};
///
/// let f = Field::num("attempt", 3);
/// assert_eq!(f.key(), "attempt");
/// assert_eq!(f.kind(), FieldKind::Num);
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    key: String,
    value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    pub fn num(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, FieldValue::Num(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, FieldValue::Float(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    /// Capture any serializable value.
    ///
    /// A value that fails to serialize is kept as its error text, construction
    /// itself never fails.
    pub fn any<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| serde_json::Value::String(format!("!serialize: {}", e)));
        Self::new(key, FieldValue::Any(value))
    }

    /// Attach an error under the `"error"` key.
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(ERROR_KEY, FieldValue::Error(Arc::new(err)))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }
}
