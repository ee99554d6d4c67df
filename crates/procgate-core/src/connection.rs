//! Connection and statement traits implemented by database drivers

use crate::{BoundArgument, OutDestination, OutputSlot, ProcedureArgument, Result, RowMap, Value};
use std::sync::Arc;

/// Handle for cancelling a running call from any thread.
///
/// The handle is safe to call from any thread and can be called multiple
/// times (subsequent calls are no-ops). If nothing is running, cancelling
/// does nothing.
pub trait QueryCancelHandle: Send + Sync {
    /// Interrupt the call currently running on the associated connection.
    fn cancel(&self);
}

/// Forward-only view over the rows of an open cursor
pub trait RowSet {
    /// Column names in select-list order
    fn column_names(&self) -> Result<Vec<String>>;

    /// Fetch the next row. `None` once the row set is exhausted.
    fn next_row(&mut self) -> Option<Result<Vec<Value>>>;

    /// Release the underlying cursor. Called exactly once by the normalizer.
    fn close(&mut self) -> Result<()>;
}

/// Callback that drains a [`RowSet`] into row mappings
pub type RowConsumer<'a> = dyn FnMut(&mut dyn RowSet) -> Result<Vec<RowMap>> + 'a;

/// A prepared anonymous block with its bind variables
pub trait CallableStatement {
    /// Bind one argument by name. Output destinations are allocated here.
    fn bind(&mut self, argument: &BoundArgument) -> Result<()>;

    /// Run the block
    fn execute(&mut self) -> Result<()>;

    /// Read the value left in a scalar output destination after execution
    fn read_output(&self, name: &str, destination: &OutDestination) -> Result<OutputSlot>;

    /// Dereference a cursor output and hand its rows to `consume`.
    ///
    /// Returns `Ok(None)` when the procedure left the cursor unopened.
    fn read_cursor(&self, name: &str, consume: &mut RowConsumer<'_>)
    -> Result<Option<Vec<RowMap>>>;
}

/// A live database session able to run procedure calls
pub trait ProcedureConnection: Send + Sync {
    /// Get the driver name (e.g., "oracle")
    fn driver_name(&self) -> &str;

    /// Prepare an anonymous block for binding and execution
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn CallableStatement + 'c>>;

    /// Look up the declared arguments of a procedure owned by the connected schema
    fn procedure_arguments(&self, procedure: &str) -> Result<Vec<ProcedureArgument>>;

    /// Close the connection
    fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;

    /// Get a handle that can interrupt the call currently running on this connection.
    ///
    /// Returns `None` if the driver does not support cancellation.
    fn cancel_handle(&self) -> Option<Arc<dyn QueryCancelHandle>> {
        None
    }
}

/// Settings needed to open a connection
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    /// Host address
    pub host: String,
    /// Listener port
    pub port: u16,
    /// Service name or SID
    pub service_name: String,
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        service_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            service_name: service_name.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// EZConnect string, `//host:port/service`
    pub fn connect_string(&self) -> String {
        format!("//{}:{}/{}", self.host, self.port, self.service_name)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service_name", &self.service_name)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
