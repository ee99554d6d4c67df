//! Core types for procgate

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// A database value that can represent any bindable or fetched SQL value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// DateTime with a fixed UTC offset
    Timestamp(DateTime<FixedOffset>),
    /// Arbitrary JSON (arrays and objects from request bodies)
    Json(serde_json::Value),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a decoded JSON value, keeping integers exact where possible
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => n
                    .as_f64()
                    .map(Value::Float64)
                    .unwrap_or_else(|| Value::Decimal(n.to_string())),
            },
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }

    /// Render the value as plain text, the way a text bind expects it.
    ///
    /// NULL renders as the empty string, which Oracle stores as NULL.
    pub fn render_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Decimal(v) | Value::String(v) => v.clone(),
            Value::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
            Value::Date(v) => v.format("%Y-%m-%d").to_string(),
            Value::DateTime(v) => v.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Value::Timestamp(v) => v.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Json(v) => v.to_string(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            other => write!(f, "{}", other.render_text()),
        }
    }
}

/// JSON rendering used in responses.
///
/// Integral floats are written as integers so that `NUMBER` outputs read
/// naturally (`1042`, not `1042.0`). Bytes are base64 encoded.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float64(v) => {
                if !v.is_finite() {
                    serializer.serialize_unit()
                } else if v.fract() == 0.0 && v.abs() <= MAX_EXACT_F64_INT {
                    serializer.serialize_i64(*v as i64)
                } else {
                    serializer.serialize_f64(*v)
                }
            }
            Value::Decimal(v) | Value::String(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&BASE64.encode(v)),
            Value::Json(v) => v.serialize(serializer),
            temporal => serializer.serialize_str(&temporal.render_text()),
        }
    }
}

/// One fetched row, keyed by column name in fetch order
pub type RowMap = IndexMap<String, Value>;

/// The value recorded for one output parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
    /// No value: absent scalar or unopened cursor
    Null,
    /// A single scalar value
    Scalar(Value),
    /// Rows materialized from a cursor
    Rows(Vec<RowMap>),
}

impl OutputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, OutputValue::Null | OutputValue::Scalar(Value::Null))
    }

    pub fn as_rows(&self) -> Option<&[RowMap]> {
        match self {
            OutputValue::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl From<Option<Value>> for OutputValue {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::Null) | None => OutputValue::Null,
            Some(v) => OutputValue::Scalar(v),
        }
    }
}

/// Output parameters of one invocation, keyed by parameter name in declaration order
pub type InvocationResult = IndexMap<String, OutputValue>;

/// One argument of a stored procedure as recorded in the data dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcedureArgument {
    /// Argument name (empty for a function's return value)
    #[serde(default)]
    pub argument_name: String,
    /// Declared data type (e.g. `NUMBER`, `REF CURSOR`)
    #[serde(default)]
    pub data_type: String,
    /// `IN`, `OUT` or `IN/OUT`
    #[serde(default)]
    pub in_out: String,
    /// Declared position (1-based, 0 for a return value)
    #[serde(default)]
    pub position: i64,
    /// Default value expression, if any
    #[serde(default)]
    pub default_value: String,
}
