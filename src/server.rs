use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::handler::{analyze_document, AppState};
use crate::providers::ModelProvider;

pub const ANALYZE_DOCUMENT_PATH: &str = "/api/analyze-document";

pub fn router<P: ModelProvider + 'static>(state: Arc<AppState<P>>) -> Router {
    Router::new()
        .route(ANALYZE_DOCUMENT_PATH, post(analyze_document::<P>))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

/// Serves until the listener fails or Ctrl-C is received.
pub async fn serve<P: ModelProvider + 'static>(
    listener: TcpListener,
    state: Arc<AppState<P>>,
) -> anyhow::Result<()> {
    let local = listener.local_addr().context("listener has no local address")?;
    info!(addr = %local, model = %state.model, "listening on {ANALYZE_DOCUMENT_PATH}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}
