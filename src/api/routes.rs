use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::AppState;
use crate::api::models::ConversionPayload;
use crate::api::page::INDEX_HTML;
use crate::api::response;
use crate::error::AppError;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/process", post(process_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn process_handler(
    State(state): State<AppState>,
    ConversionPayload(req): ConversionPayload,
) -> Response {
    let start_time = Instant::now();
    let limit = state.config.request_timeout;

    // Dropping this future (client gone, timeout) cancels the in-flight stage
    let result = tokio::time::timeout(limit, state.pipeline.convert(&req))
        .await
        .unwrap_or_else(|_| Err(AppError::Timeout(limit)));

    let elapsed = start_time.elapsed();
    match result {
        Ok(conversion) => {
            info!(
                ?elapsed,
                bytes = conversion.document.len(),
                "conversion completed"
            );
            response::attachment(conversion.document)
        }
        Err(err) => {
            match &err {
                AppError::ValidationError => warn!(?elapsed, "rejected request without input"),
                other => error!(?elapsed, error = %other, "conversion failed"),
            }
            response::error(&err, state.config.expose_error_details)
        }
    }
}
