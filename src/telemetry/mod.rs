//! Telemetry module
//!
//! Logging, metrics, and reporting of refresh cycles

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{
    increment, install_exporter, record_cycle, record_latency, record_snapshot_age, set_gauge,
    CounterMetric, GaugeMetric, LatencyMetric,
};

use crate::cache::QuoteCache;
use crate::config::TelemetryConfig;
use crate::refresher::CycleReport;
use chrono::Utc;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How often the snapshot age gauge is refreshed between cycles
pub const SNAPSHOT_AGE_PERIOD: Duration = Duration::from_secs(5);

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        install_exporter(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
    }

    Ok(())
}

/// Consume refresh reports, logging each cycle and recording its metrics
///
/// Also keeps the snapshot age gauge current every `age_period`. The task
/// ends when the refresher drops its report sender.
pub fn spawn_cycle_reporter(
    mut reports: broadcast::Receiver<CycleReport>,
    cache: Arc<QuoteCache>,
    age_period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut consecutive_failures = 0u32;
        let mut ticker = tokio::time::interval(age_period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = reports.recv() => match received {
                    Ok(report) => {
                        if report.is_published() {
                            consecutive_failures = 0;
                        } else {
                            consecutive_failures = consecutive_failures.saturating_add(1);
                        }
                        record_cycle(&report, consecutive_failures);
                        record_snapshot_age(&cache, Utc::now());
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Cycle reporter lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = ticker.tick() => {
                    record_snapshot_age(&cache, Utc::now());
                }
            }
        }
    })
}
