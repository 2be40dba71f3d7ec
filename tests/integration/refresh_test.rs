//! Refresh cycles observed through the query interface

use crate::common::tracked;
use async_trait::async_trait;
use market_indices::cache::QuoteCache;
use market_indices::query::{MarketIndicesView, QueryService, WireQuote};
use market_indices::quote::{SourceQuote, Symbol};
use market_indices::refresher::{CycleOutcome, RefreshConfig, Refresher};
use market_indices::source::{FetchResults, QuoteSource, SourceError, SymbolError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers each fetch with the next scripted price; `None` fails the fetch
struct SequenceSource {
    prices: Mutex<VecDeque<Option<Decimal>>>,
}

impl SequenceSource {
    fn new(prices: Vec<Option<Decimal>>) -> Arc<Self> {
        Arc::new(Self {
            prices: Mutex::new(prices.into()),
        })
    }
}

#[async_trait]
impl QuoteSource for SequenceSource {
    async fn fetch(&self, symbols: &[Symbol]) -> Result<FetchResults, SourceError> {
        let next = self.prices.lock().unwrap().pop_front().flatten();
        match next {
            Some(price) => Ok(symbols
                .iter()
                .map(|s| {
                    (
                        s.clone(),
                        Ok(SourceQuote {
                            current_price: price,
                            previous_close: dec!(100),
                            open: None,
                        }),
                    )
                })
                .collect()),
            None => Err(SourceError::Upstream {
                failed: symbols.len(),
                last: SymbolError::Request("connection refused".to_string()),
            }),
        }
    }
}

fn nasdaq_price(view: &MarketIndicesView) -> Option<Decimal> {
    match view {
        MarketIndicesView::Available { quotes, .. } => match quotes.get("NASDAQ") {
            Some(WireQuote::Quoted { current_price, .. }) => Some(*current_price),
            _ => None,
        },
        MarketIndicesView::NotYetAvailable => None,
    }
}

#[tokio::test]
async fn test_failed_cycle_keeps_serving_last_snapshot() {
    let source = SequenceSource::new(vec![None, Some(dec!(101)), None, Some(dec!(99.5))]);
    let cache = Arc::new(QuoteCache::new());
    let query = QueryService::new(cache.clone(), Duration::from_secs(600));
    let mut refresher = Refresher::new(
        source,
        cache,
        tracked(&[("NASDAQ", "^IXIC")]),
        RefreshConfig::new(Duration::from_secs(60)),
    );

    // Failure before any publish: still nothing to serve
    let report = refresher.run_cycle().await;
    assert!(matches!(report.outcome, CycleOutcome::Failed { .. }));
    assert_eq!(
        query.get_latest_snapshot_as_wire_format(),
        MarketIndicesView::NotYetAvailable
    );

    refresher.run_cycle().await;
    let first = query.get_latest_snapshot_as_wire_format();
    assert_eq!(nasdaq_price(&first), Some(dec!(101)));

    // Failure after a publish leaves the previous view intact
    let report = refresher.run_cycle().await;
    assert!(!report.is_published());
    assert_eq!(query.get_latest_snapshot_as_wire_format(), first);

    refresher.run_cycle().await;
    let latest = query.get_latest_snapshot_as_wire_format();
    assert_eq!(nasdaq_price(&latest), Some(dec!(99.5)));
    match latest {
        MarketIndicesView::Available { quotes, stale, .. } => {
            assert!(!stale);
            assert_eq!(
                quotes["NASDAQ"],
                WireQuote::Quoted {
                    current_price: dec!(99.5),
                    percent_change: dec!(-0.5),
                    previous_close: dec!(100),
                }
            );
        }
        other => panic!("unexpected view: {:?}", other),
    }
}

#[tokio::test]
async fn test_snapshot_flagged_stale_past_max_age() {
    let source = SequenceSource::new(vec![Some(dec!(100))]);
    let cache = Arc::new(QuoteCache::new());
    let query = QueryService::new(cache.clone(), Duration::from_millis(20));
    let mut refresher = Refresher::new(
        source,
        cache,
        tracked(&[("NASDAQ", "^IXIC")]),
        RefreshConfig::new(Duration::from_secs(60)),
    );

    refresher.run_cycle().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    match query.get_latest_snapshot_as_wire_format() {
        MarketIndicesView::Available { stale, quotes, .. } => {
            assert!(stale);
            assert_eq!(quotes.len(), 1);
        }
        other => panic!("unexpected view: {:?}", other),
    }
}
