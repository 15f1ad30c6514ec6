//! HTTP trigger server.

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use fleetload_extract::{EnvSecretStore, Extractor, build_extractor, execute};
use fleetload_fetch::RecordSource;
use fleetload_warehouse::Warehouse;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use super::load_settings;

/// Execute the serve command.
pub(crate) async fn serve(warehouse_dir: Option<PathBuf>, host: &str, port: u16) -> Result<()> {
    let settings = load_settings(warehouse_dir)?;
    let extractor = build_extractor(&settings, &EnvSecretStore::from_env())
        .context("Failed to set up extraction")?;
    let app = router(Arc::new(extractor));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Routes: `/` runs one cycle (GET or POST), `/health` answers `ok`.
fn router<S, W>(extractor: Arc<Extractor<S, W>>) -> Router
where
    S: RecordSource + 'static,
    W: Warehouse + 'static,
{
    Router::new()
        .route("/", get(trigger::<S, W>).post(trigger::<S, W>))
        .route("/health", get(|| async { "ok" }))
        .with_state(extractor)
}

async fn trigger<S, W>(State(extractor): State<Arc<Extractor<S, W>>>) -> (StatusCode, String)
where
    S: RecordSource + 'static,
    W: Warehouse + 'static,
{
    let invocation = execute(&extractor).await;
    let status =
        StatusCode::from_u16(invocation.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, invocation.message)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
