//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for recruiter signup, login, logout and the
//! current-identity probe. All of them go through the shared `SessionManager`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use interview_core::domain::Account;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{service_error_response, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            company: account.company,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    /// Confirmation shown to the recruiter.
    pub message: String,
    pub account: AccountResponse,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    /// `true` while the stored identity is still being restored.
    pub loading: bool,
    pub account: Option<AccountResponse>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account and sign in as it
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AuthResponse),
        (status = 409, description = "An account with this email already exists"),
        (status = 422, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let account = state
        .session
        .write()
        .await
        .sign_up(&req.email, &req.password, &req.name, req.company)
        .await
        .map_err(service_error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Account created successfully".to_string(),
            account: account.into(),
        }),
    ))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let account = state
        .session
        .write()
        .await
        .sign_in(&req.email, &req.password)
        .await
        .map_err(service_error_response)?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            message: "Logged in successfully".to_string(),
            account: account.into(),
        }),
    ))
}

/// POST /auth/logout - Clear the signed-in identity
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logout successful"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .session
        .write()
        .await
        .sign_out()
        .await
        .map_err(service_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Report who is signed in, if anyone
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current identity", body = MeResponse)
    )
)]
pub async fn me_handler(State(state): State<Arc<AppState>>) -> Json<MeResponse> {
    let session = state.session.read().await;
    Json(MeResponse {
        loading: session.is_loading(),
        account: session.current().cloned().map(AccountResponse::from),
    })
}
