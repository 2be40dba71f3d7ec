//! End-to-end integration tests

use crate::common::TestServer;
use market_indices::cache::QuoteCache;
use market_indices::config::Config;
use market_indices::query::QueryService;
use market_indices::quote::TrackedIndex;
use market_indices::refresher::{Refresher, StopOutcome};
use market_indices::server::AppState;
use market_indices::source::{YahooConfig, YahooSource};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_config_example_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    config.validate().unwrap();

    assert_eq!(config.server.port, 5000);
    assert_eq!(config.refresh.interval(), Duration::from_secs(120));
    assert_eq!(config.indices.len(), 6);
    assert_eq!(config.indices, Config::default().indices);
}

fn chart(price: f64, previous_close: f64) -> String {
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": price,
                    "chartPreviousClose": previous_close
                },
                "indicators": { "quote": [{ "open": [previous_close], "close": [price] }] }
            }],
            "error": null
        }
    })
    .to_string()
}

#[test_log::test(tokio::test)]
async fn test_yahoo_to_http_pipeline() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NSEI"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chart(23501.1, 23398.9)))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NSEBANK"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let mut config = Config::default();
    config.source.base_url = upstream.uri();
    config.refresh.interval_secs = 3600;
    config.indices = vec![
        TrackedIndex::new("NIFTY 50", "NSEI"),
        TrackedIndex::new("BANK NIFTY", "NSEBANK"),
    ];
    config.validate().unwrap();

    let source = YahooSource::with_config(YahooConfig {
        timeout: Duration::from_secs(2),
        ..config.source.to_yahoo_config()
    })
    .unwrap();
    let cache = Arc::new(QuoteCache::new());
    let refresher = Refresher::new(
        Arc::new(source),
        cache.clone(),
        config.indices.clone(),
        config.refresh.to_refresh_config(),
    );
    let (handle, mut reports) = refresher.spawn();

    let server = TestServer::start(AppState {
        query: QueryService::new(cache, config.refresh.max_age()),
        refresher_state: handle.state_receiver(),
        retry_after: config.refresh.interval(),
    })
    .await;

    let report = tokio::time::timeout(Duration::from_secs(5), reports.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(report.is_published());

    let body: serde_json::Value = reqwest::get(server.url("/market-indices"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "BANK NIFTY": { "current_price": "N/A", "percent_change": "N/A" },
            "NIFTY 50": {
                "current_price": 23501.1,
                "percent_change": 0.44,
                "previous_close": 23398.9
            }
        })
    );

    server.shutdown().await;
    assert_eq!(handle.stop(Duration::from_secs(1)).await, StopOutcome::Completed);
}
