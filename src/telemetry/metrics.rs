//! Prometheus metrics

use crate::cache::QuoteCache;
use crate::refresher::{CycleOutcome, CycleReport};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full refresh cycle, fetch included
    RefreshCycle,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Indices with a fresh quote in the latest snapshot
    AvailableIndices,
    /// Indices degraded to unavailable in the latest snapshot
    UnavailableIndices,
    /// Consecutive whole-cycle failures
    ConsecutiveFailures,
    /// Seconds since the published snapshot was captured
    SnapshotAgeSeconds,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Cycles that published a snapshot
    CyclesPublished,
    /// Cycles that failed wholesale
    CyclesFailed,
}

fn latency_name(metric: LatencyMetric) -> &'static str {
    match metric {
        LatencyMetric::RefreshCycle => "market_indices_refresh_cycle_seconds",
    }
}

fn gauge_name(metric: GaugeMetric) -> &'static str {
    match metric {
        GaugeMetric::AvailableIndices => "market_indices_available",
        GaugeMetric::UnavailableIndices => "market_indices_unavailable",
        GaugeMetric::ConsecutiveFailures => "market_indices_consecutive_failures",
        GaugeMetric::SnapshotAgeSeconds => "market_indices_snapshot_age_seconds",
    }
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::CyclesPublished => "market_indices_cycles_published_total",
        CounterMetric::CyclesFailed => "market_indices_cycles_failed_total",
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    metrics::histogram!(latency_name(metric)).record(duration.as_secs_f64());
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(gauge_name(metric)).set(value);
}

/// Increment a counter
pub fn increment(metric: CounterMetric) {
    metrics::counter!(counter_name(metric)).increment(1);
}

/// Install the Prometheus exporter listening on `addr`
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Set the snapshot age gauge from the cache
///
/// Returns the age that was recorded; nothing is set before the first publish.
pub fn record_snapshot_age(cache: &QuoteCache, now: DateTime<Utc>) -> Option<Duration> {
    let age = cache.get_latest()?.age_at(now);
    set_gauge(GaugeMetric::SnapshotAgeSeconds, age.as_secs_f64());
    Some(age)
}

/// Log a cycle report and record its metrics
///
/// `consecutive_failures` is tracked by the caller across reports.
pub fn record_cycle(report: &CycleReport, consecutive_failures: u32) {
    record_latency(LatencyMetric::RefreshCycle, report.elapsed);
    set_gauge(GaugeMetric::ConsecutiveFailures, consecutive_failures as f64);

    match &report.outcome {
        CycleOutcome::Published { fresh, unavailable } => {
            increment(CounterMetric::CyclesPublished);
            set_gauge(GaugeMetric::AvailableIndices, *fresh as f64);
            set_gauge(GaugeMetric::UnavailableIndices, unavailable.len() as f64);

            if unavailable.is_empty() {
                tracing::info!(
                    cycle = report.cycle,
                    fresh,
                    elapsed_secs = report.elapsed.as_secs_f64(),
                    "Published snapshot"
                );
            } else {
                let symbols: Vec<&str> = unavailable.iter().map(|s| s.as_str()).collect();
                tracing::warn!(
                    cycle = report.cycle,
                    fresh,
                    unavailable = ?symbols,
                    elapsed_secs = report.elapsed.as_secs_f64(),
                    "Published partial snapshot"
                );
            }
        }
        CycleOutcome::Failed { error } => {
            increment(CounterMetric::CyclesFailed);
            tracing::error!(
                cycle = report.cycle,
                error = %error,
                consecutive_failures,
                elapsed_secs = report.elapsed.as_secs_f64(),
                "Refresh cycle failed, keeping previous snapshot"
            );
        }
    }
}
