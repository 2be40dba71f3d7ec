//! market-indices: market index quotes served from an in-memory cache
//!
//! This library provides the core components for:
//! - Fetching index quotes from Yahoo Finance
//! - Background refresh cycles with timeout, backoff and graceful stop
//! - Atomic snapshot cache readable without touching the network
//! - Wire rendering of the latest snapshot
//! - HTTP server exposing `/market-indices`
//! - Logging and Prometheus metrics

pub mod cache;
pub mod cli;
pub mod config;
pub mod query;
pub mod quote;
pub mod refresher;
pub mod server;
pub mod source;
pub mod telemetry;
