//! CLI interface for market-indices
//!
//! Provides subcommands for:
//! - `serve`: Run the background refresher and the HTTP server
//! - `fetch`: Run a single refresh cycle and print the result
//! - `config`: Show the effective configuration

mod fetch;
mod serve;

pub use fetch::FetchArgs;
pub use serve::ServeArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "market-indices")]
#[command(about = "Market index quotes served from a background-refreshed cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresher and serve quotes over HTTP
    Serve(ServeArgs),
    /// Fetch quotes once and print them
    Fetch(FetchArgs),
    /// Show the effective configuration
    Config,
}
