//! Parameter binder: turns parameter descriptors into typed bind arguments

use std::collections::HashSet;

use chrono::DateTime;

use crate::{Direction, ProcedureParameter, ProcgateError, Result, SqlType, Value};

/// Size bound for text and binary output destinations
pub const MAX_OUTPUT_SIZE: u32 = 4000;

/// Shape of the destination an output parameter is read back into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutDestination {
    Number,
    Text { max_size: u32 },
    Timestamp,
    Boolean,
    Binary { max_size: u32 },
    /// Cursor handle, dereferenced into rows after execution
    Cursor,
    /// Fallback for unrecognized declared types
    Dynamic,
}

impl OutDestination {
    pub fn for_type(sql_type: &SqlType) -> Self {
        match sql_type {
            SqlType::Numeric => OutDestination::Number,
            SqlType::Text => OutDestination::Text {
                max_size: MAX_OUTPUT_SIZE,
            },
            SqlType::Temporal => OutDestination::Timestamp,
            SqlType::Boolean => OutDestination::Boolean,
            SqlType::Binary => OutDestination::Binary {
                max_size: MAX_OUTPUT_SIZE,
            },
            SqlType::RefCursor => OutDestination::Cursor,
            SqlType::Unknown(_) => OutDestination::Dynamic,
        }
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self, OutDestination::Cursor)
    }
}

/// A parameter ready to be bound, tagged by direction
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArgument {
    In {
        name: String,
        value: Value,
    },
    Out {
        name: String,
        destination: OutDestination,
    },
    InOut {
        name: String,
        value: Value,
        destination: OutDestination,
    },
}

impl BoundArgument {
    /// Build an `InOut` argument. Cursor destinations are rejected.
    pub fn in_out(name: impl Into<String>, value: Value, destination: OutDestination) -> Result<Self> {
        let name = name.into();
        if destination.is_cursor() {
            return Err(ProcgateError::Configuration(format!(
                "REF CURSOR cannot be used as INOUT parameter: {}",
                name
            )));
        }
        Ok(BoundArgument::InOut {
            name,
            value,
            destination,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            BoundArgument::In { name, .. }
            | BoundArgument::Out { name, .. }
            | BoundArgument::InOut { name, .. } => name,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            BoundArgument::In { .. } => Direction::In,
            BoundArgument::Out { .. } => Direction::Out,
            BoundArgument::InOut { .. } => Direction::InOut,
        }
    }

    /// Output destination, `None` for `In` arguments
    pub fn destination(&self) -> Option<&OutDestination> {
        match self {
            BoundArgument::In { .. } => None,
            BoundArgument::Out { destination, .. } | BoundArgument::InOut { destination, .. } => {
                Some(destination)
            }
        }
    }

    /// Input value, `None` for `Out` arguments
    pub fn input(&self) -> Option<&Value> {
        match self {
            BoundArgument::In { value, .. } | BoundArgument::InOut { value, .. } => Some(value),
            BoundArgument::Out { .. } => None,
        }
    }
}

/// Bind a single parameter according to its direction and declared type
pub fn bind_parameter(param: &ProcedureParameter) -> Result<BoundArgument> {
    let direction = param.parsed_direction()?;
    let sql_type = param.sql_type();

    match direction {
        Direction::In => Ok(BoundArgument::In {
            name: param.name.clone(),
            value: convert_input(&sql_type, &param.value),
        }),
        Direction::Out => Ok(BoundArgument::Out {
            name: param.name.clone(),
            destination: OutDestination::for_type(&sql_type),
        }),
        Direction::InOut => BoundArgument::in_out(
            param.name.clone(),
            convert_input(&sql_type, &param.value),
            OutDestination::for_type(&sql_type),
        ),
    }
}

/// Bind every parameter in order. The first failure aborts the whole batch.
///
/// Bind names must be unique, compared case-insensitively the way Oracle
/// resolves placeholders.
pub fn bind_parameters(params: &[ProcedureParameter]) -> Result<Vec<BoundArgument>> {
    let mut seen = HashSet::with_capacity(params.len());
    let mut bound = Vec::with_capacity(params.len());

    for param in params {
        let argument = bind_parameter(param)?;
        if !seen.insert(param.name.to_ascii_uppercase()) {
            return Err(ProcgateError::Configuration(format!(
                "duplicate parameter name: {}",
                param.name
            )));
        }
        tracing::trace!(
            parameter = %param.name,
            declared_type = %param.declared_type,
            direction = %argument.direction(),
            "bound parameter"
        );
        bound.push(argument);
    }

    Ok(bound)
}

/// Convert an input value to the form its declared type binds as.
///
/// Values that cannot be converted pass through unchanged so the database
/// can decide whether they are acceptable.
pub fn convert_input(sql_type: &SqlType, value: &Value) -> Value {
    match sql_type {
        SqlType::Numeric => to_number(value),
        SqlType::Text => Value::String(value.render_text()),
        SqlType::Temporal => to_timestamp(value),
        SqlType::Boolean => Value::Bool(to_bool(value)),
        SqlType::Binary => to_bytes(value),
        SqlType::RefCursor | SqlType::Unknown(_) => value.clone(),
    }
}

fn to_number(value: &Value) -> Value {
    match value {
        Value::Float64(_) => value.clone(),
        Value::Int64(v) => Value::Float64(*v as f64),
        Value::String(s) | Value::Decimal(s) => match s.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Value::Float64(parsed),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

fn to_timestamp(value: &Value) -> Value {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(Value::Timestamp)
            .unwrap_or_else(|_| value.clone()),
        _ => value.clone(),
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        Value::Int64(v) => *v != 0,
        Value::Float64(v) => *v != 0.0,
        Value::Decimal(s) => s.parse::<f64>().is_ok_and(|v| v != 0.0),
        _ => false,
    }
}

fn to_bytes(value: &Value) -> Value {
    match value {
        Value::Bytes(_) => value.clone(),
        Value::String(s) => Value::Bytes(s.as_bytes().to_vec()),
        Value::Json(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Value::Bytes)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}
