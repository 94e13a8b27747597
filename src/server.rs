//! Same-origin audio proxy.
//!
//! Browsers cannot range-read the restricted bucket directly, so the client
//! asks `GET /audio-proxy?url=...` and this handler fetches the object
//! server-side and returns it with permissive CORS headers.

use crate::config::AppConfig;
use crate::fetch::{PROXY_PATH, ProxyRule};
use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use log::{debug, error, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared state of the proxy handler
#[derive(Debug, Clone)]
pub struct ProxyState {
    client: Client,
    rule: ProxyRule,
    cache_max_age: u64,
}

impl ProxyState {
    /// Create state from explicit parts
    pub fn new(client: Client, rule: ProxyRule, cache_max_age: u64) -> Self {
        ProxyState {
            client,
            rule,
            cache_max_age,
        }
    }

    /// Create state from the process configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Client::new(), config.proxy_rule(), config.cache_max_age)
    }
}

#[derive(Debug, Deserialize)]
struct ProxyQuery {
    url: Option<String>,
}

/// Router exposing the proxy endpoint
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(PROXY_PATH, get(audio_proxy))
        .with_state(Arc::new(state))
}

async fn audio_proxy(
    State(state): State<Arc<ProxyState>>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    let Some(url) = query.url.filter(|url| !url.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "URL parameter is required");
    };

    if !state.rule.is_allowed(&url) {
        warn!("Rejected proxy request for {}", url);
        return error_response(StatusCode::BAD_REQUEST, "Invalid URL");
    }

    let upstream = match state.client.get(&url).send().await {
        Ok(response) => response,
        Err(err) => {
            error!("Audio proxy fetch failed for {}: {}", url, err);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        warn!("Upstream answered {} for {}", status, url);
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_response(status, "Failed to fetch audio");
    }

    let body = match upstream.bytes().await {
        Ok(body) => body,
        Err(err) => {
            error!("Audio proxy body read failed for {}: {}", url, err);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };
    debug!("Proxied {} bytes from {}", body.len(), url);

    (
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            ),
        ],
        body,
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
