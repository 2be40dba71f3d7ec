//! Serve command implementation

use crate::cache::QuoteCache;
use crate::config::{Config, Provider};
use crate::query::QueryService;
use crate::refresher::{Refresher, StopOutcome};
use crate::server::{self, AppState};
use crate::source::YahooSource;
use crate::telemetry::{spawn_cycle_reporter, SNAPSHOT_AGE_PERIOD};
use clap::Args;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the configured listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let source = match config.source.provider {
            Provider::Yahoo => Arc::new(YahooSource::with_config(config.source.to_yahoo_config())?),
        };
        let cache = Arc::new(QuoteCache::new());

        let refresher = Refresher::new(
            source,
            cache.clone(),
            config.indices.clone(),
            config.refresh.to_refresh_config(),
        );
        let (handle, reports) = refresher.spawn();
        let reporter = spawn_cycle_reporter(reports, cache.clone(), SNAPSHOT_AGE_PERIOD);

        let state = AppState {
            query: QueryService::new(cache, config.refresh.max_age()),
            refresher_state: handle.state_receiver(),
            retry_after: config.refresh.interval(),
        };

        let listener = TcpListener::bind(config.bind_addr()).await?;
        let served = server::serve(listener, state, shutdown_signal()).await;

        tracing::info!("Stopping refresher");
        match handle.stop(config.refresh.stop_timeout()).await {
            StopOutcome::Completed => tracing::info!("Refresher stopped cleanly"),
            StopOutcome::Abandoned => tracing::warn!("In-flight refresh abandoned"),
            StopOutcome::Crashed => tracing::error!("Refresher had already died"),
        }
        let _ = reporter.await;

        served?;
        Ok(())
    }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
