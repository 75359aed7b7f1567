//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the recruiter REST API, the public candidate
//! view, and the master definition for the OpenAPI specification.

use crate::stores::INTERVIEWS_KEY;
use crate::web::{
    auth::{self, AccountResponse, AuthResponse, LoginRequest, MeResponse, SignupRequest},
    service_error_response,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use interview_core::domain::{
    Account, DashboardStats, Interview, InterviewDraft, InterviewPatch, InterviewQuery,
    InterviewStatus, Language, DEFAULT_DURATION, DEFAULT_QUESTIONS,
};
use interview_core::ServiceError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        health_handler,
        list_interviews_handler,
        create_interview_handler,
        get_interview_handler,
        update_interview_handler,
        delete_interview_handler,
        cancel_interview_handler,
        results_handler,
        dashboard_handler,
        participant_view_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AccountResponse,
            AuthResponse,
            MeResponse,
            HealthResponse,
            CreateInterviewRequest,
            UpdateInterviewRequest,
            InterviewResponse,
            ResultsResponse,
            DashboardResponse,
            ParticipantViewResponse,
        )
    ),
    tags(
        (name = "Interview Dashboard API", description = "Recruiter dashboard and candidate entry points for AI voice interviews.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResponse {
    pub id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_role: String,
    pub questions: Vec<String>,
    pub max_duration: u32,
    pub language: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub candidate_queries: Option<Vec<String>>,
    pub interview_link: String,
    pub user_id: Uuid,
}

impl From<Interview> for InterviewResponse {
    fn from(interview: Interview) -> Self {
        Self {
            id: interview.id,
            candidate_name: interview.candidate_name,
            candidate_email: interview.candidate_email,
            job_role: interview.job_role,
            questions: interview.questions,
            max_duration: interview.max_duration,
            language: interview.language.code().to_string(),
            status: interview.status.as_str().to_string(),
            created_at: interview.created_at,
            scheduled_for: interview.scheduled_for,
            transcript: interview.transcript,
            summary: interview.summary,
            candidate_queries: interview.candidate_queries,
            interview_link: interview.interview_link,
            user_id: interview.user_id,
        }
    }
}

/// Payload for scheduling a new interview. Omitted questions, duration and
/// language fall back to the defaults.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_role: String,
    #[serde(default)]
    pub questions: Option<Vec<String>>,
    #[serde(default)]
    pub max_duration: Option<u32>,
    /// Short language code such as `en` or `fr`.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// A partial update. Status, identity, link and owner are not accepted.
#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateInterviewRequest {
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub job_role: Option<String>,
    pub questions: Option<Vec<String>>,
    pub max_duration: Option<u32>,
    pub language: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub candidate_queries: Option<Vec<String>>,
}

impl UpdateInterviewRequest {
    fn into_patch(self) -> Result<InterviewPatch, ServiceError> {
        let language = self.language.as_deref().map(parse_language).transpose()?;
        Ok(InterviewPatch {
            candidate_name: self.candidate_name,
            candidate_email: self.candidate_email,
            job_role: self.job_role,
            questions: self.questions,
            max_duration: self.max_duration,
            language,
            scheduled_for: self.scheduled_for,
            transcript: self.transcript,
            summary: self.summary,
            candidate_queries: self.candidate_queries,
        })
    }
}

#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// One of `scheduled`, `completed`, `cancelled`.
    pub status: Option<String>,
    /// Case-insensitive match on candidate name or job role.
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub interview_id: Uuid,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub candidate_queries: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub total: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub recent: Vec<InterviewResponse>,
}

impl From<DashboardStats> for DashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total: stats.total,
            scheduled: stats.scheduled,
            completed: stats.completed,
            cancelled: stats.cancelled,
            recent: stats.recent.into_iter().map(InterviewResponse::from).collect(),
        }
    }
}

/// What a candidate sees before joining: no results, no owner.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantViewResponse {
    pub id: Uuid,
    pub candidate_name: String,
    pub job_role: String,
    pub status: String,
    pub max_duration: u32,
    pub language: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn parse_language(code: &str) -> Result<Language, ServiceError> {
    Language::from_code(code)
        .ok_or_else(|| ServiceError::Validation(format!("unsupported language '{}'", code)))
}

fn parse_status(value: &str) -> Result<InterviewStatus, ServiceError> {
    InterviewStatus::parse(value)
        .ok_or_else(|| ServiceError::Validation(format!("unknown status '{}'", value)))
}

/// Looks up an interview owned by `account`. Someone else's interview is
/// reported exactly like a missing one.
async fn owned_interview(
    state: &AppState,
    account: &Account,
    id: Uuid,
) -> Result<Interview, (StatusCode, String)> {
    match state.interviews.get(id).await {
        Some(interview) if interview.user_id == account.id => Ok(interview),
        _ => Err(service_error_response(ServiceError::InterviewNotFound(id))),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Report service and store health.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "The store cannot be read", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.get(INTERVIEWS_KEY).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                store: "ok".to_string(),
            }),
        ),
        Err(e) => {
            error!("Health check failed to read the store: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    store: e.to_string(),
                }),
            )
        }
    }
}

/// List the signed-in recruiter's interviews, newest first.
#[utoipa::path(
    get,
    path = "/interviews",
    params(ListParams),
    responses(
        (status = 200, description = "Matching interviews", body = [InterviewResponse]),
        (status = 401, description = "Not signed in"),
        (status = 422, description = "Unknown status filter")
    )
)]
pub async fn list_interviews_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<InterviewResponse>>, (StatusCode, String)> {
    let status = params
        .status
        .as_deref()
        .map(parse_status)
        .transpose()
        .map_err(service_error_response)?;
    let query = InterviewQuery {
        status,
        search: params.search,
    };
    let interviews = state.interviews.search(account.id, &query).await;
    Ok(Json(interviews.into_iter().map(InterviewResponse::from).collect()))
}

/// Schedule a new interview and register its voice agent.
#[utoipa::path(
    post,
    path = "/interviews",
    request_body = CreateInterviewRequest,
    responses(
        (status = 201, description = "Interview scheduled", body = InterviewResponse),
        (status = 401, description = "Not signed in"),
        (status = 422, description = "Invalid interview definition"),
        (status = 502, description = "The voice provider rejected the agent")
    )
)]
pub async fn create_interview_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Json(req): Json<CreateInterviewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let language = match req.language.as_deref() {
        Some(code) => parse_language(code).map_err(service_error_response)?,
        None => Language::default(),
    };
    let draft = InterviewDraft {
        candidate_name: req.candidate_name,
        candidate_email: req.candidate_email,
        job_role: req.job_role,
        questions: req
            .questions
            .unwrap_or_else(|| DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect()),
        max_duration: req.max_duration.unwrap_or(DEFAULT_DURATION),
        language,
        scheduled_for: req.scheduled_for,
        user_id: account.id,
    };
    draft.validate().map_err(service_error_response)?;

    let agent = state
        .voice
        .create_agent(&draft.job_role, &draft.questions, draft.language)
        .await
        .map_err(|e| service_error_response(ServiceError::VoiceSession(e.to_string())))?;
    info!("Voice agent {} registered for {}", agent.agent_id, draft.job_role);

    let interview = state
        .interviews
        .create(draft)
        .await
        .map_err(service_error_response)?;
    Ok((StatusCode::CREATED, Json(InterviewResponse::from(interview))))
}

#[utoipa::path(
    get,
    path = "/interviews/{id}",
    params(("id" = Uuid, Path, description = "Interview identifier")),
    responses(
        (status = 200, description = "The interview", body = InterviewResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such interview")
    )
)]
pub async fn get_interview_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewResponse>, (StatusCode, String)> {
    let interview = owned_interview(&state, &account, id).await?;
    Ok(Json(interview.into()))
}

/// Merge the given fields into an interview.
#[utoipa::path(
    patch,
    path = "/interviews/{id}",
    params(("id" = Uuid, Path, description = "Interview identifier")),
    request_body = UpdateInterviewRequest,
    responses(
        (status = 200, description = "The updated interview", body = InterviewResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such interview"),
        (status = 422, description = "Invalid update")
    )
)]
pub async fn update_interview_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInterviewRequest>,
) -> Result<Json<InterviewResponse>, (StatusCode, String)> {
    owned_interview(&state, &account, id).await?;
    let patch = req.into_patch().map_err(service_error_response)?;
    let updated = state
        .interviews
        .update(id, patch)
        .await
        .map_err(service_error_response)?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/interviews/{id}",
    params(("id" = Uuid, Path, description = "Interview identifier")),
    responses(
        (status = 204, description = "Deleted, or already absent"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn delete_interview_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    // Someone else's interview is left alone, but the caller sees the same
    // outcome as deleting a missing id.
    if let Some(interview) = state.interviews.get(id).await {
        if interview.user_id == account.id {
            state
                .interviews
                .delete(id)
                .await
                .map_err(service_error_response)?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/interviews/{id}/cancel",
    params(("id" = Uuid, Path, description = "Interview identifier")),
    responses(
        (status = 200, description = "The cancelled interview", body = InterviewResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such interview"),
        (status = 409, description = "The interview is no longer scheduled")
    )
)]
pub async fn cancel_interview_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewResponse>, (StatusCode, String)> {
    owned_interview(&state, &account, id).await?;
    let cancelled = state
        .interviews
        .cancel(id)
        .await
        .map_err(service_error_response)?;
    Ok(Json(cancelled.into()))
}

/// Transcript, summary and candidate questions of a completed interview.
#[utoipa::path(
    get,
    path = "/interviews/{id}/results",
    params(("id" = Uuid, Path, description = "Interview identifier")),
    responses(
        (status = 200, description = "Interview results", body = ResultsResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such interview"),
        (status = 409, description = "The interview has not been completed")
    )
)]
pub async fn results_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, (StatusCode, String)> {
    let interview = owned_interview(&state, &account, id).await?;
    if interview.status != InterviewStatus::Completed {
        return Err(service_error_response(ServiceError::InvalidTransition {
            from: interview.status,
            action: "view results of",
        }));
    }
    Ok(Json(ResultsResponse {
        interview_id: interview.id,
        transcript: interview.transcript,
        summary: interview.summary,
        candidate_queries: interview.candidate_queries.unwrap_or_default(),
    }))
}

/// Counts per status plus the most recent interviews.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
) -> Json<DashboardResponse> {
    Json(state.interviews.stats(account.id).await.into())
}

/// The candidate entry view behind a shareable link.
#[utoipa::path(
    get,
    path = "/interview/{id}",
    params(("id" = Uuid, Path, description = "Interview identifier")),
    responses(
        (status = 200, description = "Interview overview", body = ParticipantViewResponse),
        (status = 404, description = "No such interview")
    )
)]
pub async fn participant_view_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParticipantViewResponse>, (StatusCode, String)> {
    let interview = state
        .interviews
        .get(id)
        .await
        .ok_or_else(|| service_error_response(ServiceError::InterviewNotFound(id)))?;
    Ok(Json(ParticipantViewResponse {
        id: interview.id,
        candidate_name: interview.candidate_name,
        job_role: interview.job_role,
        status: interview.status.as_str().to_string(),
        max_duration: interview.max_duration,
        language: interview.language.code().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_rejects_status() {
        let body = r#"{"status":"completed"}"#;
        assert!(serde_json::from_str::<UpdateInterviewRequest>(body).is_err());
    }

    #[test]
    fn test_update_request_converts_language() {
        let req: UpdateInterviewRequest =
            serde_json::from_str(r#"{"language":"fr","maxDuration":45}"#).unwrap();
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.language, Some(Language::Fr));
        assert_eq!(patch.max_duration, Some(45));

        let bad = UpdateInterviewRequest {
            language: Some("xx".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad.into_patch(), Err(ServiceError::Validation(_))));
    }
}
