//! Procedure call service
//!
//! Runs the blocking bind/execute/normalize sequence on tokio's blocking
//! pool and races it against the caller's cancellation token and deadline.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use procgate_core::{
    CallContext, InvocationResult, ProcedureArgument, ProcedureConnection, ProcedureParameter,
    ProcgateError, describe_procedure, invoke_procedure,
};
use tokio::sync::Mutex;

use crate::error::{ServiceError, ServiceResult};

/// Applied to every call unless the caller's context has a tighter deadline
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Async entry points used by the HTTP layer
#[async_trait]
pub trait ProcedureGateway: Send + Sync {
    /// Invoke a procedure and return its output parameters
    async fn call_procedure(
        &self,
        procedure: String,
        params: Vec<ProcedureParameter>,
        ctx: CallContext,
    ) -> ServiceResult<InvocationResult>;

    /// List the declared arguments of a procedure
    async fn procedure_info(
        &self,
        procedure: String,
        ctx: CallContext,
    ) -> ServiceResult<Vec<ProcedureArgument>>;
}

/// Service for procedure calls over one shared connection
///
/// Calls are serialized on the session so that an interrupt only ever hits
/// the call that asked for it.
pub struct ProcedureService {
    connection: Arc<dyn ProcedureConnection>,
    session: Arc<Mutex<()>>,
    /// Id of the worker running on the session; an interrupt only breaks its own worker
    in_flight: Arc<parking_lot::Mutex<Option<u64>>>,
    next_worker: AtomicU64,
    call_timeout: Duration,
}

impl ProcedureService {
    /// Create a new procedure service
    ///
    /// # Arguments
    ///
    /// * `connection` - Live database session shared by all calls
    /// * `call_timeout` - Upper bound for a single call, including time spent queued
    pub fn new(connection: Arc<dyn ProcedureConnection>, call_timeout: Duration) -> Self {
        Self {
            connection,
            session: Arc::new(Mutex::new(())),
            in_flight: Arc::new(parking_lot::Mutex::new(None)),
            next_worker: AtomicU64::new(0),
            call_timeout,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn connection(&self) -> &Arc<dyn ProcedureConnection> {
        &self.connection
    }

    /// Run `work` on the blocking pool under the session lock.
    ///
    /// If the context fires first, the worker's context is cancelled so row
    /// fetching stops, and a worker still running is broken through the
    /// driver's cancel handle. The session lock is held until the worker
    /// actually returns, so a break never reaches the next queued call.
    async fn run_blocking<T, F>(&self, ctx: CallContext, work: F) -> procgate_core::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ProcedureConnection, &CallContext) -> procgate_core::Result<T>
            + Send
            + 'static,
    {
        let ctx = ctx.limit(self.call_timeout);
        let guard = race(&ctx, self.session.clone().lock_owned()).await?;

        let worker_ctx = ctx.child();
        let task_ctx = worker_ctx.clone();
        let connection = self.connection.clone();
        let in_flight = self.in_flight.clone();
        let worker_id = self.next_worker.fetch_add(1, Ordering::Relaxed);
        let mut task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            // Dropped before the session guard, so the marker clears first
            let _marker = InFlight::enter(in_flight, worker_id);
            work(connection.as_ref(), &task_ctx)
        });

        match race(&ctx, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ProcgateError::Other(format!(
                "procedure worker failed: {}",
                join_error
            ))),
            Err(interrupted) => {
                tracing::warn!(reason = %interrupted, "interrupting in-flight call");
                worker_ctx.cancel();
                self.break_if_in_flight(worker_id);
                Err(interrupted)
            }
        }
    }

    /// Break worker `worker_id`, unless it has already returned.
    ///
    /// Holding the marker keeps the worker from releasing the session until
    /// the break is issued.
    fn break_if_in_flight(&self, worker_id: u64) {
        let in_flight = self.in_flight.lock();
        if *in_flight != Some(worker_id) {
            tracing::debug!(worker_id, "worker already finished, skipping break");
            return;
        }
        if let Some(handle) = self.connection.cancel_handle() {
            handle.cancel();
        }
    }
}

/// Marks the session as owned by one worker for its lifetime
struct InFlight(Arc<parking_lot::Mutex<Option<u64>>>);

impl InFlight {
    fn enter(slot: Arc<parking_lot::Mutex<Option<u64>>>, worker_id: u64) -> Self {
        *slot.lock() = Some(worker_id);
        Self(slot)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

/// Await `future` unless the context is cancelled or its deadline passes first
async fn race<F: Future>(ctx: &CallContext, future: F) -> procgate_core::Result<F::Output> {
    let deadline = ctx.deadline();
    let expired = async move {
        match deadline {
            Some(deadline) => {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = ctx.cancellation_token().cancelled() => Err(ProcgateError::Cancelled),
        _ = expired => Err(ProcgateError::Timeout("deadline exceeded".to_string())),
        output = future => Ok(output),
    }
}

#[async_trait]
impl ProcedureGateway for ProcedureService {
    #[tracing::instrument(skip(self, params, ctx), fields(param_count = params.len()))]
    async fn call_procedure(
        &self,
        procedure: String,
        params: Vec<ProcedureParameter>,
        ctx: CallContext,
    ) -> ServiceResult<InvocationResult> {
        let start = std::time::Instant::now();
        let name = procedure.clone();

        let result = self
            .run_blocking(ctx, move |conn, ctx| {
                invoke_procedure(conn, &procedure, &params, ctx)
            })
            .await;

        match result {
            Ok(outputs) => {
                tracing::debug!(
                    procedure = %name,
                    outputs = outputs.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "call completed"
                );
                Ok(outputs)
            }
            Err(e) => {
                tracing::error!(procedure = %name, error = %e, "call failed");
                Err(ServiceError::from_call(e))
            }
        }
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn procedure_info(
        &self,
        procedure: String,
        ctx: CallContext,
    ) -> ServiceResult<Vec<ProcedureArgument>> {
        let name = procedure.clone();

        self.run_blocking(ctx, move |conn, ctx| describe_procedure(conn, &procedure, ctx))
            .await
            .map_err(|e| {
                tracing::error!(procedure = %name, error = %e, "procedure lookup failed");
                ServiceError::from_describe(e)
            })
    }
}
