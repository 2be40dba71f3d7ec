//! Yahoo Finance chart API quote source
//!
//! Fetches one-day charts for each symbol concurrently and extracts the
//! regular market price, previous close and session open.

use super::{FetchResults, QuoteSource, SourceError, SymbolError};
use crate::quote::{SourceQuote, Symbol};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance API base URL
pub const YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";

/// Configuration for the Yahoo source
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Base URL for the chart API
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: YAHOO_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("market-indices/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Quote source backed by the Yahoo Finance chart endpoint
pub struct YahooSource {
    config: YahooConfig,
    client: Client,
}

impl YahooSource {
    /// Create a new source with default configuration
    pub fn new() -> Result<Self, SourceError> {
        Self::with_config(YahooConfig::default())
    }

    /// Create a new source with custom configuration
    pub fn with_config(config: YahooConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    /// Chart URL for a symbol; index symbols carry a leading caret
    fn chart_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.config.base_url.trim_end_matches('/'),
            symbol.as_str().replace('^', "%5E")
        )
    }

    /// Fetch a single symbol
    async fn fetch_symbol(&self, symbol: &Symbol) -> Result<SourceQuote, SymbolError> {
        let url = self.chart_url(symbol);

        tracing::debug!(symbol = %symbol, url = %url, "Requesting chart");

        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await
            .map_err(|e| SymbolError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SymbolError::NoData(format!("{} not found", symbol)));
        }
        if !status.is_success() {
            return Err(SymbolError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SymbolError::Request(e.to_string()))?;

        parse_chart(symbol, &body)
    }
}

#[async_trait]
impl QuoteSource for YahooSource {
    async fn fetch(&self, symbols: &[Symbol]) -> Result<FetchResults, SourceError> {
        let results = join_all(symbols.iter().map(|symbol| async move {
            (symbol.clone(), self.fetch_symbol(symbol).await)
        }))
        .await;

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        let all_transport = results
            .iter()
            .all(|(_, r)| matches!(r, Err(e) if e.is_transport()));

        if !results.is_empty() && all_transport {
            let last = results
                .iter()
                .rev()
                .find_map(|(_, r)| r.as_ref().err().cloned())
                .unwrap_or_else(|| SymbolError::Request("no response".to_string()));
            return Err(SourceError::Upstream { failed, last });
        }

        tracing::debug!(
            requested = symbols.len(),
            failed,
            "Yahoo fetch finished"
        );

        Ok(results.into_iter().collect())
    }
}

/// Chart response from the Yahoo API
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[allow(dead_code)]
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    open: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
}

/// Parse a chart response body into raw prices
fn parse_chart(symbol: &Symbol, body: &str) -> Result<SourceQuote, SymbolError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| SymbolError::Parse(e.to_string()))?;

    let item = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(item) => item,
        None => {
            let detail = response
                .chart
                .error
                .and_then(|e| e.description)
                .unwrap_or_else(|| format!("empty chart for {}", symbol));
            return Err(SymbolError::NoData(detail));
        }
    };

    let bars = item.indicators.and_then(|i| i.quote.into_iter().next());
    let last_open = bars.as_ref().and_then(|b| last_value(b.open.as_deref()));
    let last_close = bars.as_ref().and_then(|b| last_value(b.close.as_deref()));

    let current = item
        .meta
        .regular_market_price
        .or(last_close)
        .ok_or(SymbolError::MissingField("regularMarketPrice"))?;
    let previous_close = item
        .meta
        .chart_previous_close
        .or(item.meta.previous_close)
        .ok_or(SymbolError::MissingField("previousClose"))?;

    Ok(SourceQuote {
        current_price: to_decimal(current, "regularMarketPrice")?,
        previous_close: to_decimal(previous_close, "previousClose")?,
        open: last_open.map(|o| to_decimal(o, "open")).transpose()?,
    })
}

/// Last non-null value of an indicator series
fn last_value(series: Option<&[Option<f64>]>) -> Option<f64> {
    series?.iter().rev().find_map(|v| *v)
}

fn to_decimal(value: f64, field: &str) -> Result<Decimal, SymbolError> {
    Decimal::from_f64(value).ok_or_else(|| SymbolError::Parse(format!("{} is not finite", field)))
}
