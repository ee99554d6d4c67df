//! Error types for procgate

use thiserror::Error;

/// Core error type for procedure invocation
#[derive(Error, Debug)]
pub enum ProcgateError {
    /// Rejected before any database interaction (bad direction, cursor INOUT, bad identifier)
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("execution failed for procedure '{procedure}': {message}")]
    Execution { procedure: String, message: String },

    #[error("failed to process output parameter '{parameter}': {message}")]
    ResultProcessing { parameter: String, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ProcgateError {
    /// Whether the error came from the caller's context firing rather than the database
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ProcgateError::Cancelled | ProcgateError::Timeout(_))
    }

    /// Attach the procedure name to an error raised while executing it.
    ///
    /// Interruptions pass through untouched so callers can still tell them apart.
    pub fn during_execution(self, procedure: &str) -> Self {
        if self.is_interrupted() {
            return self;
        }
        ProcgateError::Execution {
            procedure: procedure.to_string(),
            message: self.to_string(),
        }
    }

    /// Attach the parameter name to an error raised while reading an output back.
    pub fn while_reading(self, parameter: &str) -> Self {
        if self.is_interrupted() {
            return self;
        }
        ProcgateError::ResultProcessing {
            parameter: parameter.to_string(),
            message: self.to_string(),
        }
    }
}

/// Result type alias for procgate operations
pub type Result<T> = std::result::Result<T, ProcgateError>;
