use procgate_core::ProcgateError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-facing messages
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected before reaching the database
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    CallFailed(String),

    #[error("{0}")]
    DescribeFailed(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub(crate) fn from_call(err: ProcgateError) -> Self {
        Self::classify(err, ServiceError::CallFailed)
    }

    pub(crate) fn from_describe(err: ProcgateError) -> Self {
        Self::classify(err, ServiceError::DescribeFailed)
    }

    fn classify(err: ProcgateError, failed: fn(String) -> ServiceError) -> Self {
        match err {
            ProcgateError::Configuration(message) => ServiceError::InvalidRequest(message),
            ProcgateError::Cancelled => ServiceError::Cancelled,
            ProcgateError::Timeout(message) => ServiceError::Timeout(message),
            other => failed(other.to_string()),
        }
    }

    /// Whether the caller can fix the request and try again
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::InvalidRequest(_))
    }
}
