//! In-memory connection used by the unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    BoundArgument, CallableStatement, OutDestination, OutputSlot, ProcedureArgument,
    ProcedureConnection, ProcgateError, Result, RowConsumer, RowMap, RowSet, Value,
};

/// Everything the fake connection observed
#[derive(Debug, Default)]
pub struct Recorded {
    pub prepared: Vec<String>,
    pub binds: Vec<BoundArgument>,
    pub executions: usize,
    pub cursors_closed: usize,
}

/// Rows a cursor output yields. `fail_at` makes the fetch of that row fail.
#[derive(Debug, Clone, Default)]
pub struct FakeCursor {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub fail_at: Option<usize>,
}

impl FakeCursor {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

#[derive(Default)]
pub struct FakeConnection {
    pub recorded: Arc<Mutex<Recorded>>,
    outputs: HashMap<String, OutputSlot>,
    cursors: HashMap<String, FakeCursor>,
    execute_error: Option<String>,
    arguments: Vec<ProcedureArgument>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, name: &str, slot: OutputSlot) -> Self {
        self.outputs.insert(name.to_string(), slot);
        self
    }

    pub fn with_cursor(mut self, name: &str, cursor: FakeCursor) -> Self {
        self.cursors.insert(name.to_string(), cursor);
        self
    }

    pub fn with_execute_error(mut self, message: &str) -> Self {
        self.execute_error = Some(message.to_string());
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<ProcedureArgument>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn touched(&self) -> bool {
        let recorded = self.recorded.lock();
        !recorded.prepared.is_empty() || !recorded.binds.is_empty() || recorded.executions > 0
    }
}

impl ProcedureConnection for FakeConnection {
    fn driver_name(&self) -> &str {
        "fake"
    }

    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn CallableStatement + 'c>> {
        self.recorded.lock().prepared.push(sql.to_string());
        Ok(Box::new(FakeStatement { conn: self }))
    }

    fn procedure_arguments(&self, _procedure: &str) -> Result<Vec<ProcedureArgument>> {
        Ok(self.arguments.clone())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

struct FakeStatement<'c> {
    conn: &'c FakeConnection,
}

impl CallableStatement for FakeStatement<'_> {
    fn bind(&mut self, argument: &BoundArgument) -> Result<()> {
        self.conn.recorded.lock().binds.push(argument.clone());
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        self.conn.recorded.lock().executions += 1;
        match &self.conn.execute_error {
            Some(message) => Err(ProcgateError::Driver(message.clone())),
            None => Ok(()),
        }
    }

    fn read_output(&self, name: &str, destination: &OutDestination) -> Result<OutputSlot> {
        if let Some(slot) = self.conn.outputs.get(name) {
            return Ok(slot.clone());
        }
        Ok(match destination {
            OutDestination::Number => OutputSlot::Number(None),
            OutDestination::Text { .. } => OutputSlot::Text(None),
            OutDestination::Timestamp => OutputSlot::Timestamp(None),
            OutDestination::Boolean => OutputSlot::Boolean(false),
            OutDestination::Binary { .. } => OutputSlot::Binary(Vec::new()),
            OutDestination::Dynamic => OutputSlot::Dynamic(Value::Null),
            OutDestination::Cursor => {
                return Err(ProcgateError::Driver("cursor read as scalar".to_string()));
            }
        })
    }

    fn read_cursor(
        &self,
        name: &str,
        consume: &mut RowConsumer<'_>,
    ) -> Result<Option<Vec<RowMap>>> {
        let Some(cursor) = self.conn.cursors.get(name) else {
            return Ok(None);
        };
        let mut rows = FakeRowSet {
            columns: cursor.columns.clone(),
            rows: cursor.rows.clone().into(),
            fail_at: cursor.fail_at,
            fetched: 0,
            recorded: self.conn.recorded.clone(),
        };
        consume(&mut rows).map(Some)
    }
}

struct FakeRowSet {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    fail_at: Option<usize>,
    fetched: usize,
    recorded: Arc<Mutex<Recorded>>,
}

impl RowSet for FakeRowSet {
    fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        if self.fail_at == Some(self.fetched) {
            self.fetched += 1;
            return Some(Err(ProcgateError::Driver("fetch failed".to_string())));
        }
        let row = self.rows.pop_front()?;
        self.fetched += 1;
        Some(Ok(row))
    }

    fn close(&mut self) -> Result<()> {
        self.recorded.lock().cursors_closed += 1;
        Ok(())
    }
}
