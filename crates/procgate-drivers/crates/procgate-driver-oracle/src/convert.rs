//! Conversions between procgate values and Oracle bind/fetch types

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use oracle::SqlValue;
use oracle::sql_type::{OracleType, ToSql};
use procgate_core::{OutDestination, Value};

/// Error code raised when dereferencing a cursor the procedure never opened
const UNOPENED_CURSOR_CODE: &str = "ORA-24338";

/// Oracle type allocated for an output destination
pub fn oracle_type_for(destination: &OutDestination) -> OracleType {
    match destination {
        OutDestination::Number => OracleType::Number(0, 0),
        OutDestination::Text { max_size } => OracleType::Varchar2(*max_size),
        OutDestination::Timestamp => OracleType::TimestampTZ(9),
        OutDestination::Boolean => OracleType::Boolean,
        OutDestination::Binary { max_size } => OracleType::Raw(*max_size),
        OutDestination::Cursor => OracleType::RefCursor,
        OutDestination::Dynamic => OracleType::Varchar2(procgate_core::MAX_OUTPUT_SIZE),
    }
}

/// Bind an input value, optionally forcing the Oracle type of the bind buffer
pub(crate) fn bind_input(
    stmt: &mut oracle::Statement,
    name: &str,
    value: &Value,
    oracle_type: Option<&OracleType>,
) -> oracle::Result<()> {
    match value {
        Value::Null => {
            let null_type = oracle_type
                .cloned()
                .unwrap_or(OracleType::Varchar2(procgate_core::MAX_OUTPUT_SIZE));
            stmt.bind(name, &null_type)
        }
        Value::Bool(v) => bind_typed(stmt, name, v, oracle_type),
        Value::Int64(v) => bind_typed(stmt, name, v, oracle_type),
        Value::Float64(v) => bind_typed(stmt, name, v, oracle_type),
        Value::Decimal(v) | Value::String(v) => bind_typed(stmt, name, v, oracle_type),
        Value::Bytes(v) => bind_typed(stmt, name, v, oracle_type),
        Value::Date(v) => bind_typed(stmt, name, v, oracle_type),
        Value::DateTime(v) => bind_typed(stmt, name, v, oracle_type),
        Value::Timestamp(v) => bind_typed(stmt, name, v, oracle_type),
        Value::Json(v) => bind_typed(stmt, name, &v.to_string(), oracle_type),
    }
}

fn bind_typed<T: ToSql>(
    stmt: &mut oracle::Statement,
    name: &str,
    value: &T,
    oracle_type: Option<&OracleType>,
) -> oracle::Result<()> {
    match oracle_type {
        Some(oracle_type) => stmt.bind(name, &(value, oracle_type)),
        None => stmt.bind(name, value),
    }
}

/// How a fetched column is read back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// NUMBER / FLOAT: integral values become i64, others f64
    Number,
    Integer,
    Float,
    Text,
    /// DATE / TIMESTAMP, read as UTC
    LocalTimestamp,
    /// TIMESTAMP WITH (LOCAL) TIME ZONE
    ZonedTimestamp,
    Binary,
    Boolean,
    /// Anything else, read through its text rendering
    Other,
}

pub fn column_kind(oracle_type: &OracleType) -> ColumnKind {
    match oracle_type {
        OracleType::Number(_, _) | OracleType::Float(_) => ColumnKind::Number,
        OracleType::Int64 | OracleType::UInt64 => ColumnKind::Integer,
        OracleType::BinaryFloat | OracleType::BinaryDouble => ColumnKind::Float,
        OracleType::Varchar2(_)
        | OracleType::NVarchar2(_)
        | OracleType::Char(_)
        | OracleType::NChar(_)
        | OracleType::Long
        | OracleType::CLOB
        | OracleType::NCLOB
        | OracleType::Rowid => ColumnKind::Text,
        OracleType::Date | OracleType::Timestamp(_) => ColumnKind::LocalTimestamp,
        OracleType::TimestampTZ(_) | OracleType::TimestampLTZ(_) => ColumnKind::ZonedTimestamp,
        OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB => ColumnKind::Binary,
        OracleType::Boolean => ColumnKind::Boolean,
        _ => ColumnKind::Other,
    }
}

/// Parse Oracle's text rendering of a NUMBER.
///
/// Integral values that fit in i64 stay exact; others become f64. Text that
/// is neither is kept as a decimal string.
pub fn number_from_text(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Value::Int64(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Float64(v),
        _ => Value::Decimal(trimmed.to_string()),
    }
}

/// Convert one fetched column to a procgate value
pub(crate) fn sql_value_to_value(sql_value: &SqlValue) -> oracle::Result<Value> {
    if sql_value.is_null()? {
        return Ok(Value::Null);
    }

    let value = match column_kind(sql_value.oracle_type()?) {
        ColumnKind::Number => number_from_text(&sql_value.get::<String>()?),
        ColumnKind::Integer => Value::Int64(sql_value.get()?),
        ColumnKind::Float => Value::Float64(sql_value.get()?),
        ColumnKind::Text | ColumnKind::Other => Value::String(sql_value.get()?),
        ColumnKind::LocalTimestamp => Value::DateTime(sql_value.get::<NaiveDateTime>()?),
        ColumnKind::ZonedTimestamp => {
            Value::Timestamp(sql_value.get::<DateTime<FixedOffset>>()?)
        }
        ColumnKind::Binary => Value::Bytes(sql_value.get()?),
        ColumnKind::Boolean => Value::Bool(sql_value.get()?),
    };
    Ok(value)
}

/// Whether an error reports a REF CURSOR that was never opened
pub fn is_unopened_cursor(message: &str) -> bool {
    message.contains(UNOPENED_CURSOR_CODE)
}
