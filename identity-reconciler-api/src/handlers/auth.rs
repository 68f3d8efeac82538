use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Skip auth for health check
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let Some(expected_api_key) = &state.config.api_key else {
        return Ok(next.run(request).await);
    };

    let api_key = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok());

    match api_key {
        Some(api_key) if keys_match(api_key, expected_api_key) => Ok(next.run(request).await),
        _ => Err(AppError::Unauthorized),
    }
}

/// Constant-time comparison of the presented key with the configured one
fn keys_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
