use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod store;
pub mod types;
pub mod validate;

use handlers::{health, list_readings, preflight, record_reading, SharedState};
use types::{DistanceReading, SensorReading};

/// Stream routes, mounted both bare and under `/api` so either client base
/// path keeps working.
fn stream_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/sensor",
            get(list_readings::<SensorReading>)
                .post(record_reading::<SensorReading>)
                .options(preflight),
        )
        .route(
            "/distance",
            get(list_readings::<DistanceReading>)
                .post(record_reading::<DistanceReading>)
                .options(preflight),
        )
}

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(stream_routes())
        .nest("/api", stream_routes().route("/health", get(health)))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http",
                    %request_id,
                    method = %req.method(),
                    uri = %req.uri(),
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
