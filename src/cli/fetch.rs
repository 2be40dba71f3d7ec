//! Fetch command implementation

use crate::cache::QuoteCache;
use crate::config::{Config, Provider};
use crate::query::to_wire;
use crate::refresher::{CycleOutcome, Refresher};
use crate::source::YahooSource;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Print JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

impl FetchArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let source = match config.source.provider {
            Provider::Yahoo => Arc::new(YahooSource::with_config(config.source.to_yahoo_config())?),
        };
        let cache = Arc::new(QuoteCache::new());

        let mut refresher = Refresher::new(
            source,
            cache.clone(),
            config.indices.clone(),
            config.refresh.to_refresh_config(),
        );

        let report = refresher.run_cycle().await;
        if let CycleOutcome::Failed { error } = report.outcome {
            anyhow::bail!("Fetch failed: {}", error);
        }

        let snapshot = cache
            .get_latest()
            .ok_or_else(|| anyhow::anyhow!("No snapshot published"))?;
        let quotes = to_wire(&snapshot);

        let json = if self.compact {
            serde_json::to_string(&quotes)?
        } else {
            serde_json::to_string_pretty(&quotes)?
        };
        println!("{}", json);

        Ok(())
    }
}
