//! Wizard session API routes

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::dto::{JumpRequestDto, OpenSessionRequestDto, WizardViewModel};
use crate::application::services::WizardError;
use crate::domain::aggregates::{ChildRecord, ChildRef, StepValue};
use crate::domain::entities::SuggestionScope;
use crate::domain::errors::WorkflowError;
use crate::domain::services::DraftDecision;
use crate::domain::value_objects::{
    AssetDraftId, BrainContentId, GenerationRequest, OfferId, ProblemId, SessionId, SolutionId,
};
use crate::infrastructure::state::AppState;

pub type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<WizardViewModel>, ApiError>;

/// Map a service error to its HTTP status and a JSON body
pub fn error_response(err: WizardError) -> ApiError {
    let status = match &err {
        WizardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        WizardError::Workflow(WorkflowError::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::Workflow(WorkflowError::IllegalTransition(_))
        | WizardError::Workflow(WorkflowError::IntegrityViolation(_)) => StatusCode::CONFLICT,
        WizardError::Workflow(WorkflowError::ExternalService(_)) => StatusCode::BAD_GATEWAY,
    };
    let body = match &err {
        WizardError::Workflow(WorkflowError::Validation { step, violations }) => json!({
            "error": err.to_string(),
            "step": step,
            "violations": violations,
        }),
        _ => json!({ "error": err.to_string() }),
    };
    if status.is_server_error() {
        tracing::warn!(%status, error = %err, "Request failed");
    }
    (status, Json(body))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}

/// Unparsable session ids are reported the same way as unknown ones
fn parse_session_id(id: &str) -> Result<SessionId, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(SessionId::from_uuid)
        .map_err(|_| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Session {} not found", id) })),
            )
        })
}

fn parse_child_ref(kind: &str, id: i64) -> Option<ChildRef> {
    match kind {
        "brain_content" => Some(ChildRef::BrainContent(BrainContentId::new(id))),
        "problem" => Some(ChildRef::Problem(ProblemId::new(id))),
        "solution" => Some(ChildRef::Solution(SolutionId::new(id))),
        "offer" => Some(ChildRef::Offer(OfferId::new(id))),
        "asset_draft" => Some(ChildRef::AssetDraft(AssetDraftId::new(id))),
        _ => None,
    }
}

fn parse_draft_decision(action: &str) -> Option<DraftDecision> {
    match action {
        "approve-outline" => Some(DraftDecision::ApproveOutline),
        "approve-content" => Some(DraftDecision::ApproveContent),
        "reject" => Some(DraftDecision::Reject),
        "publish" => Some(DraftDecision::Publish),
        _ => None,
    }
}

/// Open a new wizard session.
pub async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OpenSessionRequestDto>,
) -> Result<(StatusCode, Json<WizardViewModel>), ApiError> {
    let view = state
        .wizard_service
        .open_session(body)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .view(session_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .close_session(session_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn advance(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .advance(session_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn retreat(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .retreat(session_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn jump(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<JumpRequestDto>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .jump_to(session_id, body.step)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Replace one scalar step-scoped value.
pub async fn set_step_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(value): Json<StepValue>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .set_step_data(session_id, value)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn append_child(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(record): Json<ChildRecord>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .append_child(session_id, record)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Remove a child and everything that depends on it.
pub async fn remove_child(
    State(state): State<Arc<AppState>>,
    Path((id, kind, child_id)): Path<(String, String, i64)>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    let child = parse_child_ref(&kind, child_id)
        .ok_or_else(|| bad_request(format!("Unknown child kind: {}", kind)))?;
    state
        .wizard_service
        .remove_child(session_id, child)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct MoveProblemRequest {
    pub position: usize,
}

pub async fn move_problem(
    State(state): State<Arc<AppState>>,
    Path((id, problem_id)): Path<(String, i64)>,
    Json(body): Json<MoveProblemRequest>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .wizard_service
        .move_problem(session_id, ProblemId::new(problem_id), body.position)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct ConfirmSuggestionQuery {
    /// Confirm a solution title suggested for this problem
    pub problem_id: Option<ProblemId>,
}

pub async fn confirm_suggestion(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, usize)>,
    Query(query): Query<ConfirmSuggestionQuery>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    let scope = match query.problem_id {
        Some(problem_id) => SuggestionScope::SolutionTitles(problem_id),
        None => SuggestionScope::ProblemTitles,
    };
    state
        .wizard_service
        .confirm_suggestion(session_id, scope, index)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Run a generation and wait for its result.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<GenerationRequest>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .generation_service
        .generate(session_id, request)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn cancel_generation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    state
        .generation_service
        .cancel(session_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn review_draft(
    State(state): State<Arc<AppState>>,
    Path((id, draft_id, action)): Path<(String, i64, String)>,
) -> ApiResult {
    let session_id = parse_session_id(&id)?;
    let decision = parse_draft_decision(&action)
        .ok_or_else(|| bad_request(format!("Unknown draft action: {}", action)))?;
    state
        .wizard_service
        .review_draft(session_id, AssetDraftId::new(draft_id), decision)
        .await
        .map(Json)
        .map_err(error_response)
}
