//! Cancellation and deadline context for one invocation

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::{ProcgateError, Result};

/// Caller-supplied cancellation token plus an optional deadline.
///
/// Blocking points in the core call [`CallContext::check`] so that a fired
/// context stops the invocation before more work is done.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that never expires and is only cancelled explicitly
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Tighten the deadline. A later deadline than the current one is ignored.
    pub fn limit(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    /// A context cancelled whenever this one is, sharing the deadline
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fail with `Cancelled` or `Timeout` if the context has fired
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ProcgateError::Cancelled);
        }
        if self.is_expired() {
            return Err(ProcgateError::Timeout(
                "deadline exceeded before the call completed".to_string(),
            ));
        }
        Ok(())
    }
}
