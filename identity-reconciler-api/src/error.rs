use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use identity_reconciler_domain::domain::errors::DomainError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Domain(e) => {
                let status = match e {
                    DomainError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                    DomainError::Conflict { .. } => StatusCode::CONFLICT,
                    DomainError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
                    DomainError::PublishFailed { .. } => StatusCode::BAD_GATEWAY,
                    DomainError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                    DomainError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
