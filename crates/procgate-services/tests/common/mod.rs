//! Common test utilities and mocks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use procgate_core::{
    BoundArgument, CallContext, CallableStatement, OutDestination, OutputSlot, ProcedureArgument,
    ProcedureConnection, ProcgateError, QueryCancelHandle, Result, RowConsumer, RowMap, RowSet,
    Value,
};

/// Mock connection for testing service-layer logic without a real database.
///
/// Records every prepared block and bind, answers outputs from configured
/// slots and cursors, and can simulate slow or failing executions. A slow
/// execution returns early once the cancel handle fires, the way a broken
/// Oracle call does.
pub struct MockConnection {
    pub should_fail: Option<String>,
    pub execute_delay: Option<Duration>,
    /// Cancelled once an execution finishes, racing the worker's return
    pub cancel_on_execute: Option<CallContext>,
    pub outputs: HashMap<String, OutputSlot>,
    pub cursors: HashMap<String, (Vec<String>, Vec<Vec<Value>>)>,
    pub arguments: Vec<ProcedureArgument>,
    /// Log of all SQL prepared, for assertion in tests
    pub sql_log: Arc<parking_lot::Mutex<Vec<String>>>,
    pub bind_log: Arc<parking_lot::Mutex<Vec<BoundArgument>>>,
    pub cursors_closed: Arc<AtomicUsize>,
    pub cancel_count: Arc<AtomicUsize>,
    interrupted: Arc<AtomicBool>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            should_fail: None,
            execute_delay: None,
            cancel_on_execute: None,
            outputs: HashMap::new(),
            cursors: HashMap::new(),
            arguments: Vec::new(),
            sql_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
            bind_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
            cursors_closed: Arc::new(AtomicUsize::new(0)),
            cancel_count: Arc::new(AtomicUsize::new(0)),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.should_fail = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.execute_delay = Some(delay);
        self
    }

    pub fn with_cancel_on_execute(mut self, ctx: CallContext) -> Self {
        self.cancel_on_execute = Some(ctx);
        self
    }

    pub fn with_output(mut self, name: &str, slot: OutputSlot) -> Self {
        self.outputs.insert(name.to_string(), slot);
        self
    }

    pub fn with_cursor(mut self, name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.cursors.insert(
            name.to_string(),
            (columns.iter().map(|c| c.to_string()).collect(), rows),
        );
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<ProcedureArgument>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.sql_log.lock().clone()
    }

    pub fn bind_log(&self) -> Vec<BoundArgument> {
        self.bind_log.lock().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    pub fn cursors_closed(&self) -> usize {
        self.cursors_closed.load(Ordering::SeqCst)
    }
}

impl ProcedureConnection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn CallableStatement + 'c>> {
        self.sql_log.lock().push(sql.to_string());
        self.interrupted.store(false, Ordering::SeqCst);
        Ok(Box::new(MockStatement { conn: self }))
    }

    fn procedure_arguments(&self, _procedure: &str) -> Result<Vec<ProcedureArgument>> {
        if let Some(message) = &self.should_fail {
            return Err(ProcgateError::Query(message.clone()));
        }
        Ok(self.arguments.clone())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn cancel_handle(&self) -> Option<Arc<dyn QueryCancelHandle>> {
        Some(Arc::new(MockCancelHandle {
            interrupted: self.interrupted.clone(),
            cancel_count: self.cancel_count.clone(),
        }))
    }
}

struct MockCancelHandle {
    interrupted: Arc<AtomicBool>,
    cancel_count: Arc<AtomicUsize>,
}

impl QueryCancelHandle for MockCancelHandle {
    fn cancel(&self) {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
        self.interrupted.store(true, Ordering::SeqCst);
    }
}

struct MockStatement<'c> {
    conn: &'c MockConnection,
}

impl CallableStatement for MockStatement<'_> {
    fn bind(&mut self, argument: &BoundArgument) -> Result<()> {
        self.conn.bind_log.lock().push(argument.clone());
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        if let Some(delay) = self.conn.execute_delay {
            let started = Instant::now();
            while started.elapsed() < delay {
                if self.conn.interrupted.load(Ordering::SeqCst) {
                    return Err(ProcgateError::Driver(
                        "ORA-01013: user requested cancel of current operation".to_string(),
                    ));
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        if let Some(ctx) = &self.conn.cancel_on_execute {
            ctx.cancel();
        }
        match &self.conn.should_fail {
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
            OutDestination::Boolean => OutputSlot::Boolean(false),
            OutDestination::Binary { .. } => OutputSlot::Binary(Vec::new()),
            OutDestination::Timestamp => OutputSlot::Timestamp(None),
            _ => OutputSlot::Text(None),
        })
    }

    fn read_cursor(
        &self,
        name: &str,
        consume: &mut RowConsumer<'_>,
    ) -> Result<Option<Vec<RowMap>>> {
        let Some((columns, rows)) = self.conn.cursors.get(name) else {
            return Ok(None);
        };
        let mut row_set = MockRowSet {
            columns: columns.clone(),
            rows: rows.clone().into_iter(),
            closed: self.conn.cursors_closed.clone(),
        };
        consume(&mut row_set).map(Some)
    }
}

struct MockRowSet {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
    closed: Arc<AtomicUsize>,
}

impl RowSet for MockRowSet {
    fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Option<Result<Vec<Value>>> {
        self.rows.next().map(Ok)
    }

    fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
