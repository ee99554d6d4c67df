//! Route table and server lifecycle

use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/procedures/call", post(handlers::call_procedure))
        .route("/api/v1/procedures/info", get(handlers::procedure_info))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` until `shutdown` fires, then give in-flight requests up to
/// `grace` to finish.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
    grace: Duration,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "procgate listening");

    let signal = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await
    });

    tokio::select! {
        result = &mut server => return Ok(result??),
        _ = shutdown.cancelled() => {
            tracing::info!(grace_secs = grace.as_secs(), "shutdown requested, draining connections");
        }
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => {
            result??;
            tracing::info!("server stopped");
        }
        Err(_) => {
            tracing::warn!("grace period elapsed with requests still in flight");
        }
    }

    Ok(())
}
