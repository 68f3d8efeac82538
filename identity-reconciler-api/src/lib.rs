pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// HTTP surface: the trigger endpoint and a liveness check
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/triggers/pre-token-generation",
            post(handlers::trigger::pre_token_generation),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
