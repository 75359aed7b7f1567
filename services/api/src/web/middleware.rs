//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::state::AppState;

/// Middleware that admits the request only while an account is signed in.
///
/// If one is, inserts the `Account` into request extensions for handlers to use.
/// Otherwise returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Release the lock before running the handler; sign-out needs the write side.
    let account = state.session.read().await.current().cloned();

    let Some(account) = account else {
        debug!("Rejected {} {}: nobody signed in", req.method(), req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    };

    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}
