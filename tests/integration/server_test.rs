//! HTTP server integration tests over a real socket

use crate::common::{tracked, TableSource, TestServer};
use market_indices::cache::QuoteCache;
use market_indices::query::QueryService;
use market_indices::refresher::{RefreshConfig, RefreshState, Refresher, StopOutcome};
use market_indices::server::{AppState, AS_OF_HEADER, STALE_HEADER};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn idle_state(cache: Arc<QuoteCache>) -> AppState {
    let (_tx, rx) = watch::channel(RefreshState::Idle);
    AppState {
        query: QueryService::new(cache, Duration::from_secs(600)),
        refresher_state: rx,
        retry_after: Duration::from_secs(120),
    }
}

#[tokio::test]
async fn test_home_route() {
    let server = TestServer::start(idle_state(Arc::new(QuoteCache::new()))).await;

    let body = reqwest::get(server.url("/")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "Market Indices API is Running!");

    server.shutdown().await;
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = TestServer::start(idle_state(Arc::new(QuoteCache::new()))).await;

    let response = reqwest::Client::new()
        .get(server.url("/market-indices"))
        .header("origin", "https://dashboard.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    server.shutdown().await;
}

#[tokio::test]
async fn test_not_available_before_first_refresh() {
    let server = TestServer::start(idle_state(Arc::new(QuoteCache::new()))).await;

    let response = reqwest::get(server.url("/market-indices")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "120");

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "market data not available yet");

    server.shutdown().await;
}

#[test_log::test(tokio::test)]
async fn test_serves_refreshed_snapshot() {
    let source = Arc::new(TableSource::new(vec![
        ("^DJI", dec!(39150.333), dec!(38834.86)),
        ("^GSPC", dec!(5473.17), dec!(5487.03)),
    ]));
    let cache = Arc::new(QuoteCache::new());
    let indices = tracked(&[
        ("Dow Jones", "^DJI"),
        ("S&P 500", "^GSPC"),
        ("SENSEX", "^BSESN"),
    ]);

    let refresher = Refresher::new(
        source.clone(),
        cache.clone(),
        indices,
        RefreshConfig::new(Duration::from_secs(3600)),
    );
    let (handle, mut reports) = refresher.spawn();

    let server = TestServer::start(AppState {
        query: QueryService::new(cache, Duration::from_secs(600)),
        refresher_state: handle.state_receiver(),
        retry_after: Duration::from_secs(3600),
    })
    .await;

    let first = tokio::time::timeout(Duration::from_secs(5), reports.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(first.is_published());

    let response = reqwest::get(server.url("/market-indices")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()[STALE_HEADER.as_str()], "false");
    assert!(response.headers().contains_key(AS_OF_HEADER.as_str()));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "Dow Jones": {
                "current_price": 39150.33,
                "percent_change": 0.81,
                "previous_close": 38834.86
            },
            "S&P 500": {
                "current_price": 5473.17,
                "percent_change": -0.25,
                "previous_close": 5487.03
            },
            "SENSEX": {
                "current_price": "N/A",
                "percent_change": "N/A"
            }
        })
    );

    // Reads come from the cache only
    for _ in 0..5 {
        reqwest::get(server.url("/market-indices")).await.unwrap();
    }
    assert_eq!(source.calls(), 1);

    let health: serde_json::Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["snapshot_available"], true);
    assert_eq!(health["stale"], false);

    server.shutdown().await;
    assert_eq!(handle.stop(Duration::from_secs(1)).await, StopOutcome::Completed);
}

#[test_log::test(tokio::test)]
async fn test_failing_source_keeps_serving_unavailable() {
    let source = Arc::new(TableSource::failing());
    let cache = Arc::new(QuoteCache::new());

    let refresher = Refresher::new(
        source,
        cache.clone(),
        tracked(&[("NIFTY 50", "^NSEI")]),
        RefreshConfig::new(Duration::from_secs(3600)),
    );
    let (handle, mut reports) = refresher.spawn();

    let server = TestServer::start(AppState {
        query: QueryService::new(cache, Duration::from_secs(600)),
        refresher_state: handle.state_receiver(),
        retry_after: Duration::from_secs(3600),
    })
    .await;

    let first = tokio::time::timeout(Duration::from_secs(5), reports.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(!first.is_published());

    let response = reqwest::get(server.url("/market-indices")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    server.shutdown().await;
    handle.stop(Duration::from_secs(1)).await;
}
