//! Request handlers

use super::AppState;
use crate::query::MarketIndicesView;
use crate::refresher::{observed_state, RefreshState};
use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Response header flagging a snapshot older than the max age
pub const STALE_HEADER: HeaderName = HeaderName::from_static("x-data-stale");
/// Response header carrying the snapshot capture time
pub const AS_OF_HEADER: HeaderName = HeaderName::from_static("x-data-as-of");

/// Body of `/health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub snapshot_available: bool,
    pub stale: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub refresher: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

pub async fn home() -> &'static str {
    "Market Indices API is Running!"
}

pub async fn market_indices(State(state): State<AppState>) -> Response {
    match state.query.get_latest_snapshot_as_wire_format() {
        MarketIndicesView::NotYetAvailable => {
            let retry_after = state.retry_after.as_secs().max(1).to_string();
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, retry_after)],
                Json(ErrorBody {
                    error: "market data not available yet",
                }),
            )
                .into_response()
        }
        MarketIndicesView::Available {
            quotes,
            stale,
            as_of,
        } => {
            let mut response = Json(quotes).into_response();
            let headers = response.headers_mut();
            headers.insert(STALE_HEADER, HeaderValue::from_static(if stale { "true" } else { "false" }));
            if let Ok(value) = HeaderValue::from_str(&as_of.to_rfc3339_opts(SecondsFormat::Secs, true)) {
                headers.insert(AS_OF_HEADER, value);
            }
            response
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.query.cache();
    let refresher = observed_state(&state.refresher_state);
    let status = if refresher == RefreshState::Crashed {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status,
        snapshot_available: cache.get_latest().is_some(),
        stale: state.query.is_stale(),
        last_updated: cache.last_updated(),
        refresher: refresher.as_str(),
    })
}
