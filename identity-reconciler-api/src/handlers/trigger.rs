use crate::{
    error::{AppError, AppResult},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use identity_reconciler_domain::domain::entities::AuthenticationEvent;
use tracing::{info, instrument};

/// Pre-token-generation trigger.
///
/// Runs reconciliation for the login and hands the event back byte for byte,
/// so the identity provider issues the token unchanged apart from the
/// attributes written through the admin API.
#[instrument(skip(state, body))]
pub async fn pre_token_generation(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let event: AuthenticationEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed authentication event: {e}")))?;

    let outcome = state.reconciler.handle_event(&event).await?;
    info!(
        external_id = %outcome.user.external_id(),
        created = outcome.created,
        conflict_retries = outcome.conflict_retries,
        "Login reconciled"
    );

    Ok(([(CONTENT_TYPE, "application/json")], body))
}
