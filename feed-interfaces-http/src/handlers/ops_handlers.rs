use axum::extract::State;
use axum::http::HeaderMap;

use feed_application::AppState;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn health_live() -> &'static str {
    "ok"
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<String, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(state.metrics.render_prometheus())
}
