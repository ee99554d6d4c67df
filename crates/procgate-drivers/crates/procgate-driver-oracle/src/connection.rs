//! Oracle connection implementation using the `oracle` crate

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use procgate_core::{
    CallableStatement, ConnectionConfig, ProcedureArgument, ProcedureConnection, ProcgateError,
    QueryCancelHandle, Result,
};

use crate::statement::OracleStatement;

/// Argument lookup for procedures owned by the connected schema
const PROCEDURE_ARGUMENTS_SQL: &str = "SELECT ARGUMENT_NAME, DATA_TYPE, IN_OUT, POSITION, DEFAULT_VALUE \
     FROM ALL_ARGUMENTS \
     WHERE OBJECT_NAME = UPPER(:1) AND OWNER = USER \
     ORDER BY POSITION";

/// Oracle connection errors
#[derive(Debug, thiserror::Error)]
pub enum OracleConnectionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("{0}")]
    Oracle(#[from] oracle::Error),
}

impl From<OracleConnectionError> for ProcgateError {
    fn from(err: OracleConnectionError) -> Self {
        match err {
            OracleConnectionError::ConnectionFailed(_) | OracleConnectionError::ConnectionClosed => {
                ProcgateError::Connection(err.to_string())
            }
            other => ProcgateError::Driver(other.to_string()),
        }
    }
}

/// Cancel handle for Oracle calls.
///
/// Wraps `Connection::break_execution`, which makes the running call on
/// the same session fail with ORA-01013.
pub struct OracleCancelHandle {
    conn: Arc<oracle::Connection>,
}

impl QueryCancelHandle for OracleCancelHandle {
    fn cancel(&self) {
        tracing::debug!("breaking Oracle execution");
        if let Err(e) = self.conn.break_execution() {
            tracing::warn!(error = %e, "failed to break Oracle execution");
        }
    }
}

/// A single Oracle session
pub struct OracleConnection {
    conn: Arc<oracle::Connection>,
    closed: AtomicBool,
    connect_string: String,
}

impl OracleConnection {
    /// Open an autocommit session and verify it with a round trip
    #[tracing::instrument(skip(config), fields(connect_string = %config.connect_string(), user = %config.username))]
    pub fn connect(config: &ConnectionConfig) -> std::result::Result<Self, OracleConnectionError> {
        let connect_string = config.connect_string();
        tracing::debug!("connecting to Oracle");

        let mut conn =
            oracle::Connection::connect(&config.username, &config.password, &connect_string)
                .map_err(|e| OracleConnectionError::ConnectionFailed(e.to_string()))?;
        // Each executed block commits on its own; nothing spans requests.
        conn.set_autocommit(true);
        conn.ping()
            .map_err(|e| OracleConnectionError::ConnectionFailed(e.to_string()))?;

        tracing::info!(connect_string = %connect_string, "Oracle connection established");
        Ok(Self {
            conn: Arc::new(conn),
            closed: AtomicBool::new(false),
            connect_string,
        })
    }

    fn ensure_not_closed(&self) -> std::result::Result<(), OracleConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(OracleConnectionError::ConnectionClosed);
        }
        Ok(())
    }
}

impl ProcedureConnection for OracleConnection {
    fn driver_name(&self) -> &str {
        "oracle"
    }

    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn CallableStatement + 'c>> {
        self.ensure_not_closed()?;
        tracing::trace!(sql = %sql, "preparing statement");
        let stmt = self
            .conn
            .statement(sql)
            .build()
            .map_err(OracleConnectionError::from)?;
        Ok(Box::new(OracleStatement::new(stmt)))
    }

    fn procedure_arguments(&self, procedure: &str) -> Result<Vec<ProcedureArgument>> {
        self.ensure_not_closed()?;
        let object_name = procedure.to_string();

        let rows = self
            .conn
            .query_as::<(
                Option<String>,
                Option<String>,
                Option<String>,
                Option<i64>,
                Option<String>,
            )>(PROCEDURE_ARGUMENTS_SQL, &[&object_name])
            .map_err(|e| {
                ProcgateError::Query(format!("failed to query procedure info: {}", e))
            })?;

        let mut arguments = Vec::new();
        for row in rows {
            let (argument_name, data_type, in_out, position, default_value) = row
                .map_err(|e| ProcgateError::Query(format!("failed to scan procedure info: {}", e)))?;
            arguments.push(ProcedureArgument {
                argument_name: argument_name.unwrap_or_default(),
                data_type: data_type.unwrap_or_default(),
                in_out: in_out.unwrap_or_default(),
                position: position.unwrap_or_default(),
                default_value: default_value.unwrap_or_default(),
            });
        }

        tracing::debug!(procedure = %procedure, arguments = arguments.len(), "loaded procedure arguments");
        Ok(arguments)
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.conn.close().map_err(OracleConnectionError::from)?;
        tracing::info!(connect_string = %self.connect_string, "Oracle connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn cancel_handle(&self) -> Option<Arc<dyn QueryCancelHandle>> {
        Some(Arc::new(OracleCancelHandle {
            conn: self.conn.clone(),
        }))
    }
}

impl std::fmt::Debug for OracleConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConnection")
            .field("connect_string", &self.connect_string)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
