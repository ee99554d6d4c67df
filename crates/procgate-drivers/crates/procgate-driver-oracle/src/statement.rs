//! Prepared anonymous blocks and REF CURSOR row sets

use chrono::{DateTime, FixedOffset};
use oracle::sql_type::RefCursor;
use oracle::{ResultSet, Row};
use procgate_core::{
    BoundArgument, CallableStatement, OutDestination, OutputSlot, ProcgateError, Result,
    RowConsumer, RowMap, RowSet, Value,
};

use crate::connection::OracleConnectionError;
use crate::convert::{bind_input, is_unopened_cursor, oracle_type_for, sql_value_to_value};

/// A prepared `BEGIN ... END;` block
pub struct OracleStatement {
    stmt: oracle::Statement,
}

impl OracleStatement {
    pub(crate) fn new(stmt: oracle::Statement) -> Self {
        Self { stmt }
    }
}

impl CallableStatement for OracleStatement {
    fn bind(&mut self, argument: &BoundArgument) -> Result<()> {
        let result = match argument {
            BoundArgument::In { name, value } => bind_input(&mut self.stmt, name, value, None),
            BoundArgument::Out { name, destination } => self
                .stmt
                .bind(name.as_str(), &oracle_type_for(destination)),
            BoundArgument::InOut {
                name,
                value,
                destination,
            } => {
                let oracle_type = oracle_type_for(destination);
                bind_input(&mut self.stmt, name, value, Some(&oracle_type))
            }
        };
        result.map_err(|e| {
            ProcgateError::Driver(format!("failed to bind :{}: {}", argument.name(), e))
        })
    }

    fn execute(&mut self) -> Result<()> {
        self.stmt
            .execute(&[])
            .map_err(OracleConnectionError::from)?;
        Ok(())
    }

    fn read_output(&self, name: &str, destination: &OutDestination) -> Result<OutputSlot> {
        let slot = match destination {
            OutDestination::Number => OutputSlot::Number(self.value::<Option<f64>>(name)?),
            OutDestination::Text { .. } => OutputSlot::Text(self.value::<Option<String>>(name)?),
            OutDestination::Timestamp => {
                OutputSlot::Timestamp(self.value::<Option<DateTime<FixedOffset>>>(name)?)
            }
            OutDestination::Boolean => {
                OutputSlot::Boolean(self.value::<Option<bool>>(name)?.unwrap_or(false))
            }
            OutDestination::Binary { .. } => {
                OutputSlot::Binary(self.value::<Option<Vec<u8>>>(name)?.unwrap_or_default())
            }
            OutDestination::Dynamic => OutputSlot::Dynamic(
                self.value::<Option<String>>(name)?
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            ),
            OutDestination::Cursor => {
                return Err(ProcgateError::NotSupported(format!(
                    "cursor output :{} read as a scalar",
                    name
                )));
            }
        };
        Ok(slot)
    }

    fn read_cursor(
        &self,
        name: &str,
        consume: &mut RowConsumer<'_>,
    ) -> Result<Option<Vec<RowMap>>> {
        let cursor = match self.stmt.bind_value::<_, Option<RefCursor>>(name) {
            Ok(cursor) => cursor,
            Err(e) if is_unopened_cursor(&e.to_string()) => None,
            Err(e) => {
                return Err(ProcgateError::Driver(format!(
                    "failed to wrap REF CURSOR: {}",
                    e
                )));
            }
        };
        let Some(mut cursor) = cursor else {
            tracing::debug!(parameter = %name, "cursor was not opened");
            return Ok(None);
        };

        let rows = match cursor.query() {
            Ok(rows) => rows,
            Err(e) if is_unopened_cursor(&e.to_string()) => {
                tracing::debug!(parameter = %name, "cursor was not opened");
                return Ok(None);
            }
            Err(e) => {
                return Err(ProcgateError::Driver(format!(
                    "failed to open REF CURSOR: {}",
                    e
                )));
            }
        };

        let mut row_set = OracleRowSet::new(rows);
        consume(&mut row_set).map(Some)
    }
}

impl OracleStatement {
    fn value<T: oracle::sql_type::FromSql>(&self, name: &str) -> Result<T> {
        self.stmt
            .bind_value(name)
            .map_err(|e| OracleConnectionError::from(e).into())
    }
}

/// Rows of a dereferenced REF CURSOR
pub struct OracleRowSet<'a> {
    rows: Option<ResultSet<'a, Row>>,
}

impl<'a> OracleRowSet<'a> {
    pub fn new(rows: ResultSet<'a, Row>) -> Self {
        Self { rows: Some(rows) }
    }
}

impl RowSet for OracleRowSet<'_> {
    fn column_names(&self) -> Result<Vec<String>> {
        let rows = self
            .rows
            .as_ref()
            .ok_or_else(|| ProcgateError::Driver("cursor is closed".to_string()))?;
        Ok(rows
            .column_info()
            .iter()
            .map(|column| column.name().to_string())
            .collect())
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        let row = match self.rows.as_mut()?.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(ProcgateError::Driver(format!("scan failed: {}", e)))),
        };
        let values = row
            .sql_values()
            .iter()
            .map(sql_value_to_value)
            .collect::<oracle::Result<Vec<_>>>()
            .map_err(|e| ProcgateError::Driver(format!("scan failed: {}", e)));
        Some(values)
    }

    fn close(&mut self) -> Result<()> {
        self.rows.take();
        Ok(())
    }
}
