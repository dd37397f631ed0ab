use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::BoardColumn;
use crate::response::{ApiResponse, Message, message, ok};
use crate::routes::organizations::required;
use crate::signoff::gate::{self, ProtectedEntity};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ColumnRequest {
    pub name: String,
    pub position: Option<i32>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(board_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<BoardColumn>>>, AppError> {
    board_organization(&state, auth.user_id, board_id).await?;
    let columns = db::columns::list_by_board(&state.pool, board_id).await?;
    Ok(ok(columns))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<ColumnRequest>,
) -> Result<Json<ApiResponse<BoardColumn>>, AppError> {
    let organization_id = board_organization(&state, auth.user_id, board_id).await?;
    let role = access::member_role(&state.pool, auth.user_id, organization_id, "Board").await?;
    access::require_editor(role)?;
    let name = required(&req.name, "Name")?;
    check_position(req.position)?;

    let column =
        db::columns::create(&state.pool, board_id, name, req.position, auth.user_id).await?;

    audit::log_event(
        &state.pool,
        Some(organization_id),
        auth.user_id,
        "column.created",
        "column",
        Some(column.id),
        None,
    )
    .await;

    Ok(ok(column))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ColumnRequest>,
) -> Result<Json<ApiResponse<BoardColumn>>, AppError> {
    let (_, _, organization_id) = db::hierarchy::column_scope(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Column not found".to_string()))?;
    let role = access::member_role(&state.pool, auth.user_id, organization_id, "Column").await?;
    access::require_editor(role)?;
    let name = required(&req.name, "Name")?;
    check_position(req.position)?;

    let column = db::columns::update(&state.pool, id, name, req.position).await?;

    audit::log_event(
        &state.pool,
        Some(organization_id),
        auth.user_id,
        "column.updated",
        "column",
        Some(id),
        None,
    )
    .await;

    Ok(ok(column))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let mut tx = state.pool.begin().await?;
    let ownership =
        gate::authorize_delete(&mut *tx, auth.user_id, ProtectedEntity::Column(id)).await?;
    db::columns::delete(&mut *tx, id).await?;
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(ownership.organization_id),
        auth.user_id,
        "column.deleted",
        "column",
        Some(id),
        None,
    )
    .await;

    Ok(message("Deleted"))
}

async fn board_organization(
    state: &SharedState,
    user_id: Uuid,
    board_id: Uuid,
) -> Result<Uuid, AppError> {
    let (_, organization_id) = db::hierarchy::board_scope(&state.pool, board_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;
    access::member_role(&state.pool, user_id, organization_id, "Board").await?;
    Ok(organization_id)
}

pub(crate) fn check_position(position: Option<i32>) -> Result<(), AppError> {
    match position {
        Some(p) if p < 0 => Err(AppError::BadRequest(
            "Position must not be negative".to_string(),
        )),
        _ => Ok(()),
    }
}
