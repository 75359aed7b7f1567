pub mod auth;
pub mod middleware;
pub mod participant_task;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the WebSocket handler and the guard so the router below (and the
// binary) can reach them directly.
pub use middleware::require_auth;
pub use ws_handler::ws_handler;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use interview_core::ServiceError;
use state::AppState;
use std::sync::Arc;
use tracing::{error, warn};

/// Builds every API route over `state`. Layers such as CORS and tracing are
/// added by the caller.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/health", get(rest::health_handler))
        .route("/interview/{id}", get(rest::participant_view_handler))
        .route("/interview/{id}/ws", get(ws_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/interviews",
            get(rest::list_interviews_handler).post(rest::create_interview_handler),
        )
        .route(
            "/interviews/{id}",
            get(rest::get_interview_handler)
                .patch(rest::update_interview_handler)
                .delete(rest::delete_interview_handler),
        )
        .route("/interviews/{id}/cancel", post(rest::cancel_interview_handler))
        .route("/interviews/{id}/results", get(rest::results_handler))
        .route("/dashboard", get(rest::dashboard_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Maps a service failure onto the status code and message returned to the
/// dashboard.
pub fn service_error_response(e: ServiceError) -> (StatusCode, String) {
    let status = match &e {
        ServiceError::DuplicateAccount(_) => StatusCode::CONFLICT,
        ServiceError::AccountNotFound => StatusCode::UNAUTHORIZED,
        ServiceError::InterviewNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::PermissionDenied => StatusCode::FORBIDDEN,
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::InvalidTransition { .. } | ServiceError::InvalidSessionState { .. } => {
            StatusCode::CONFLICT
        }
        ServiceError::VoiceSession(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (status, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::domain::InterviewStatus;
    use interview_core::PortError;
    use uuid::Uuid;

    #[test]
    fn test_service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::DuplicateAccount("a@b.co".into()), StatusCode::CONFLICT),
            (ServiceError::AccountNotFound, StatusCode::UNAUTHORIZED),
            (ServiceError::InterviewNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (ServiceError::Validation("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                ServiceError::InvalidTransition {
                    from: InterviewStatus::Completed,
                    action: "cancel",
                },
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Storage(PortError::Unexpected("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(service_error_response(error).0, expected);
        }
    }
}
