use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::store::ReadingLog;
use crate::types::{DistanceReading, Reading, SensorReading};

pub struct AppState {
    pub sensor: ReadingLog<SensorReading>,
    pub distance: ReadingLog<DistanceReading>,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message }))
}

fn storage_error<E: std::fmt::Display>(err: E, message: String) -> ApiError {
    tracing::error!(error = %err, "storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message }),
    )
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET: full stored history for one stream, oldest first.
pub async fn list_readings<R: Reading>(
    State(state): State<SharedState>,
) -> Result<Json<Vec<R>>, ApiError> {
    let entries = R::log(&state)
        .list()
        .await
        .map_err(|e| storage_error(e, format!("Failed to read {} data", R::STREAM)))?;
    Ok(Json(entries))
}

/// POST: validate the payload, append a timestamped reading, echo it back.
///
/// The body is parsed here rather than through the JSON extractor: a
/// malformed body becomes an empty payload, which then fails required-field
/// validation as an ordinary 400 instead of a parse-error response.
pub async fn record_reading<R: Reading>(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let request_id = request_id(&headers);
    let payload: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));

    let reading = R::from_payload(&payload, now_iso8601()).map_err(|message| {
        tracing::warn!(%request_id, stream = R::STREAM, %message, "rejected reading");
        bad_request(message)
    })?;

    R::log(&state)
        .append(reading.clone())
        .await
        .map_err(|e| storage_error(e, format!("Failed to save {} data", R::STREAM)))?;

    tracing::info!(%request_id, stream = R::STREAM, "reading recorded");
    Ok((StatusCode::CREATED, Json(reading)))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Bare OPTIONS (no browser preflight headers) still answers 200 empty;
/// actual CORS preflights are short-circuited by the `CorsLayer`.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
