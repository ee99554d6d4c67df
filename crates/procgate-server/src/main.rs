use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use procgate_core::ProcedureConnection;
use procgate_driver_oracle::OracleConnection;
use procgate_server::{AppState, ServerConfig, build_router, logging, serve};
use procgate_services::ProcedureService;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let _log_guard = logging::init(logging::LoggingConfig::from_server_config(&config))
        .context("failed to initialize logging")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting procgate");

    let connection_config = config.connection_config();
    let connection = tokio::task::spawn_blocking(move || OracleConnection::connect(&connection_config))
        .await?
        .context("failed to connect to Oracle")?;
    let connection: Arc<dyn ProcedureConnection> = Arc::new(connection);

    let service = ProcedureService::new(connection.clone(), config.call_timeout());
    let router = build_router(AppState::new(Arc::new(service)));

    let listener = tokio::net::TcpListener::bind(config.listen_addr()?)
        .await
        .context("failed to bind listen address")?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    serve(listener, router, shutdown, config.shutdown_grace()).await?;

    if let Err(e) = connection.close() {
        tracing::warn!(error = %e, "failed to close Oracle connection");
    }
    tracing::info!("procgate stopped");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    token.cancel();
}
