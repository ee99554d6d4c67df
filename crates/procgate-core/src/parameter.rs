//! Procedure parameter descriptors

use crate::{ProcgateError, Result, Value};

/// Direction of a procedure parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    /// Parse a direction string, ignoring case.
    ///
    /// `IN/OUT` and `IN OUT` (the data dictionary spellings) are accepted as `INOUT`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            "INOUT" | "IN/OUT" | "IN OUT" => Ok(Direction::InOut),
            _ => Err(ProcgateError::Configuration(format!(
                "unsupported parameter direction: {}",
                raw
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
            Direction::InOut => "INOUT",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared SQL type of a parameter, grouped by how it is bound
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// NUMBER, INTEGER, INT, FLOAT, DOUBLE
    Numeric,
    /// VARCHAR2, VARCHAR, CHAR, CLOB, NVARCHAR2, NCHAR, NCLOB
    Text,
    /// DATE and the TIMESTAMP variants
    Temporal,
    /// BOOLEAN
    Boolean,
    /// RAW, BLOB
    Binary,
    /// REF CURSOR / SYS_REFCURSOR
    RefCursor,
    /// Anything else, normalized to upper case
    Unknown(String),
}

impl SqlType {
    /// Classify a declared type string. Case and repeated whitespace are ignored.
    pub fn classify(declared: &str) -> Self {
        let normalized = declared
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "NUMBER" | "INTEGER" | "INT" | "FLOAT" | "DOUBLE" => SqlType::Numeric,
            "VARCHAR2" | "VARCHAR" | "CHAR" | "CLOB" | "NVARCHAR2" | "NCHAR" | "NCLOB" => {
                SqlType::Text
            }
            "DATE"
            | "TIMESTAMP"
            | "TIMESTAMP WITH TIME ZONE"
            | "TIMESTAMP WITH LOCAL TIME ZONE" => SqlType::Temporal,
            "BOOLEAN" => SqlType::Boolean,
            "RAW" | "BLOB" => SqlType::Binary,
            "REF CURSOR" | "REF_CURSOR" | "SYS_REFCURSOR" => SqlType::RefCursor,
            _ => SqlType::Unknown(normalized),
        }
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self, SqlType::RefCursor)
    }
}

impl From<&str> for SqlType {
    fn from(declared: &str) -> Self {
        SqlType::classify(declared)
    }
}

/// A caller-supplied description of one procedure argument
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureParameter {
    /// Bind name, also used as the result key
    pub name: String,
    /// Declared SQL type string (e.g. `NUMBER`, `VARCHAR2`, `SYS_REFCURSOR`)
    pub declared_type: String,
    /// Direction string: `IN`, `OUT` or `INOUT` in any case
    pub direction: String,
    /// Input value; ignored for `OUT` parameters
    pub value: Value,
}

impl ProcedureParameter {
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        direction: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            direction: direction.into(),
            value,
        }
    }

    /// An `IN` parameter
    pub fn input(name: impl Into<String>, declared_type: impl Into<String>, value: Value) -> Self {
        Self::new(name, declared_type, "IN", value)
    }

    /// An `OUT` parameter
    pub fn output(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self::new(name, declared_type, "OUT", Value::Null)
    }

    /// An `INOUT` parameter
    pub fn in_out(name: impl Into<String>, declared_type: impl Into<String>, value: Value) -> Self {
        Self::new(name, declared_type, "INOUT", value)
    }

    pub fn sql_type(&self) -> SqlType {
        SqlType::classify(&self.declared_type)
    }

    pub fn parsed_direction(&self) -> Result<Direction> {
        Direction::parse(&self.direction)
    }
}
