//! HTTP boundary: one POST endpoint taking `{imdbId, type, season?, episode?}`
//! and answering `{streams: [...]}`.

use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{MethodRouter, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::finder::{LookupRequest, StreamFinder};
use crate::queries::{Episode, MediaKind};
use crate::sktonline::Stream;

#[derive(Clone)]
pub struct AppState {
    pub finder: StreamFinder,
}

/// Rejections of the incoming request itself. Upstream trouble never ends up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    MethodNotAllowed,
    InvalidJson,
    MissingParameters,
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::InvalidJson | RequestError::MissingParameters => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RequestError::MethodNotAllowed => "Method not allowed. Use POST.",
            RequestError::InvalidJson => "Invalid JSON in request body.",
            RequestError::MissingParameters => "Missing parameters: imdbId or type.",
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamsResponse {
    pub streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapePayload {
    imdb_id: Option<Value>,
    #[serde(rename = "type")]
    media_type: Option<Value>,
    season: Option<Value>,
    episode: Option<Value>,
}

/// Parses and validates a request body.
pub fn parse_request(body: &[u8]) -> Result<LookupRequest, RequestError> {
    let payload: ScrapePayload = serde_json::from_slice(body).map_err(|e| {
        warn!("invalid JSON payload: {}", e);
        RequestError::InvalidJson
    })?;

    let imdb_id = payload.imdb_id.as_ref().and_then(non_empty_text);
    let media_type = payload.media_type.as_ref().and_then(non_empty_text);
    let (Some(imdb_id), Some(media_type)) = (imdb_id, media_type) else {
        return Err(RequestError::MissingParameters);
    };

    let season = payload.season.as_ref().and_then(integer_like);
    let episode = payload.episode.as_ref().and_then(integer_like);

    Ok(LookupRequest {
        imdb_id,
        kind: MediaKind::from_type(&media_type),
        episode: Episode::from_parts(season, episode),
    })
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts `3`, `3.0` and `"3"`; anything else counts as absent.
fn integer_like(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).or_else(|| {
            // Números inteiros enviados como float (1.0) também valem.
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u32)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

async fn scrape(State(state): State<AppState>, body: Bytes) -> Result<Json<StreamsResponse>, RequestError> {
    let request = parse_request(&body)?;
    let episode = request
        .episode
        .map(|ep| format!(":{}:{}", ep.season, ep.episode))
        .unwrap_or_default();
    info!("====== Request: type='{:?}', id='{}{}' ======", request.kind, request.imdb_id, episode);

    let streams = state.finder.find_streams(&request).await;
    Ok(Json(StreamsResponse { streams }))
}

async fn method_not_allowed() -> RequestError {
    RequestError::MethodNotAllowed
}

pub fn router(finder: StreamFinder) -> Router {
    let endpoint: MethodRouter<AppState> = post(scrape).fallback(method_not_allowed);
    Router::new()
        .route("/", endpoint.clone())
        .route("/scrape", endpoint)
        .with_state(AppState { finder })
}

/// Serves the scrape endpoint until the process is stopped.
pub async fn serve(addr: SocketAddr, finder: StreamFinder) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(finder)).await
}
