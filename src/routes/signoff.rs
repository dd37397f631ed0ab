use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::SignoffRequest;
use crate::notifications;
use crate::response::{ApiResponse, ok};
use crate::signoff::status::{self, SignoffStatus};
use crate::signoff::{Review, store};
use crate::state::SharedState;

const MAX_NOTES_LEN: usize = 2000;

#[derive(Deserialize)]
pub struct RequestSignoff {
    pub notes: Option<String>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ApproveSignoff {
    pub approved: bool,
    pub notes: Option<String>,
    #[serde(default)]
    pub unprotect_data: bool,
}

#[derive(Deserialize)]
pub struct PendingQuery {
    pub organization_id: Option<Uuid>,
}

pub async fn request(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<RequestSignoff>,
) -> Result<Json<ApiResponse<SignoffStatus>>, AppError> {
    let notes = optional_text(req.notes.as_deref(), "Notes")?;
    let reason = optional_text(req.reason.as_deref(), "Reason")?;

    let status = store::request_signoff(&state.pool, auth.user_id, project_id, notes, reason).await?;

    audit::log_event(
        &state.pool,
        Some(status.organization_id),
        auth.user_id,
        "signoff.requested",
        "project",
        Some(project_id),
        reason.map(|r| serde_json::json!({ "reason": r })),
    )
    .await;

    notifications::signoff_requested(&state, &status, auth.user_id);

    Ok(ok(status))
}

pub async fn approve(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ApproveSignoff>,
) -> Result<Json<ApiResponse<SignoffStatus>>, AppError> {
    let notes = optional_text(req.notes.as_deref(), "Notes")?;
    let review = Review::from_request(req.approved, req.unprotect_data);

    let outcome =
        store::review_signoff(&state.pool, auth.user_id, project_id, review, notes).await?;

    audit::log_event(
        &state.pool,
        Some(outcome.status.organization_id),
        auth.user_id,
        if req.approved {
            "signoff.approved"
        } else {
            "signoff.rejected"
        },
        "project",
        Some(project_id),
        Some(serde_json::json!({
            "data_protected": outcome.status.data_protected,
        })),
    )
    .await;

    notifications::signoff_reviewed(
        &state,
        &outcome.status,
        outcome.requested_by,
        req.approved,
        notes.map(str::to_string),
    );

    Ok(ok(outcome.status))
}

pub async fn get_status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<SignoffStatus>>, AppError> {
    let status = status::get_status(&state.pool, auth.user_id, project_id).await?;
    Ok(ok(status))
}

pub async fn history(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SignoffRequest>>>, AppError> {
    let requests = status::history(&state.pool, auth.user_id, project_id).await?;
    Ok(ok(requests))
}

pub async fn pending(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<ApiResponse<Vec<SignoffStatus>>>, AppError> {
    let pending = status::list_pending(&state.pool, auth.user_id, query.organization_id).await?;
    Ok(ok(pending))
}

/// Trimmed text, `None` when blank.
fn optional_text<'a>(value: Option<&'a str>, field: &str) -> Result<Option<&'a str>, AppError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > MAX_NOTES_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_NOTES_LEN} characters"
        )));
    }
    Ok(Some(value))
}
