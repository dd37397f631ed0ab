use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Board;
use crate::response::{ApiResponse, Message, message, ok};
use crate::routes::organizations::required;
use crate::routes::projects;
use crate::signoff::gate::{self, ProtectedEntity};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct BoardRequest {
    pub name: String,
    pub description: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Board>>>, AppError> {
    projects::visible(&state, auth.user_id, project_id).await?;
    let boards = db::boards::list_by_project(&state.pool, project_id).await?;
    Ok(ok(boards))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<BoardRequest>,
) -> Result<Json<ApiResponse<Board>>, AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let role =
        access::member_role(&state.pool, auth.user_id, project.organization_id, "Project").await?;
    access::require_editor(role)?;
    let name = required(&req.name, "Name")?;

    let board = db::boards::create(
        &state.pool,
        project_id,
        name,
        req.description.as_deref(),
        auth.user_id,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(project.organization_id),
        auth.user_id,
        "board.created",
        "board",
        Some(board.id),
        None,
    )
    .await;

    Ok(ok(board))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Board>>, AppError> {
    scope(&state, auth.user_id, id).await?;
    let board = db::boards::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;
    Ok(ok(board))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<BoardRequest>,
) -> Result<Json<ApiResponse<Board>>, AppError> {
    let (organization_id, role) = scope(&state, auth.user_id, id).await?;
    access::require_editor(role)?;
    let name = required(&req.name, "Name")?;

    let board = db::boards::update(&state.pool, id, name, req.description.as_deref()).await?;

    audit::log_event(
        &state.pool,
        Some(organization_id),
        auth.user_id,
        "board.updated",
        "board",
        Some(id),
        None,
    )
    .await;

    Ok(ok(board))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let mut tx = state.pool.begin().await?;
    let ownership =
        gate::authorize_delete(&mut *tx, auth.user_id, ProtectedEntity::Board(id)).await?;
    db::boards::delete(&mut *tx, id).await?;
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(ownership.organization_id),
        auth.user_id,
        "board.deleted",
        "board",
        Some(id),
        None,
    )
    .await;

    Ok(message("Deleted"))
}

/// Organization of board `id` and the caller's role in it.
async fn scope(
    state: &SharedState,
    user_id: Uuid,
    id: Uuid,
) -> Result<(Uuid, crate::models::Role), AppError> {
    let (_, organization_id) = db::hierarchy::board_scope(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;
    let role = access::member_role(&state.pool, user_id, organization_id, "Board").await?;
    Ok((organization_id, role))
}
