//! Access gate for `/secure` routes
//!
//! Requests must carry `x-api-key` equal to the configured secret. The check
//! runs before the handler, so a rejected request never touches the store.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use school_common::api::{validate_api_key, ApiAuthError, API_KEY_HEADER};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Returns 401 Unauthorized if the header is missing or wrong.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // A non-UTF-8 header value counts as a wrong key, not a missing one
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| value.to_str().unwrap_or(""));

    if let Err(e) = validate_api_key(provided, &state.api_key) {
        warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        let message = match e {
            ApiAuthError::MissingKey => "Missing API key",
            _ => "Invalid API key",
        };
        return Err(ApiError::Unauthorized(message.to_string()));
    }

    Ok(next.run(request).await)
}
