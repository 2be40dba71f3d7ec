//! HTTP server
//!
//! Thin axum layer over the query interface. Handlers only read the cache;
//! no request ever waits on the upstream quote provider.

mod handlers;

pub use handlers::{HealthResponse, AS_OF_HEADER, STALE_HEADER};

use crate::query::QueryService;
use crate::refresher::RefreshState;
use axum::{routing::get, Router};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub query: QueryService,
    pub refresher_state: watch::Receiver<RefreshState>,
    /// Hint for clients polling before the first snapshot
    pub retry_after: Duration,
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/market-indices", get(handlers::market_indices))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "HTTP server listening");
    tracing::info!("  GET /market-indices");
    tracing::info!("  GET /health");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
