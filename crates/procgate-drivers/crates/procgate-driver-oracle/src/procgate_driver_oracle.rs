//! Oracle driver for procgate
//!
//! This crate implements the procgate connection traits on top of the
//! `oracle` crate (ODPI-C), binding procedure arguments by name and reading
//! scalar and REF CURSOR outputs back after execution.

mod connection;
mod convert;
mod statement;

#[cfg(test)]
mod connection_tests;
#[cfg(test)]
mod convert_tests;

pub use connection::{OracleCancelHandle, OracleConnection, OracleConnectionError};
pub use convert::{ColumnKind, column_kind, is_unopened_cursor, number_from_text, oracle_type_for};
pub use statement::{OracleRowSet, OracleStatement};
