use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::cards::CardFields;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Card, Priority, Role};
use crate::response::{ApiResponse, Message, message, ok};
use crate::routes::columns::check_position;
use crate::routes::organizations::required;
use crate::signoff::gate::{self, ProtectedEntity};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateCard {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub position: Option<i32>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update. Absent fields keep their value; `null` clears the
/// nullable ones.
#[derive(Deserialize)]
pub struct UpdateCard {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub position: Option<i32>,
    pub column_id: Option<Uuid>,
    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(column_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Card>>>, AppError> {
    column_scope(&state, auth.user_id, column_id).await?;
    let cards = db::cards::list_by_column(&state.pool, column_id).await?;
    Ok(ok(cards))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(column_id): Path<Uuid>,
    Json(req): Json<CreateCard>,
) -> Result<Json<ApiResponse<Card>>, AppError> {
    let scope = column_scope(&state, auth.user_id, column_id).await?;
    access::require_editor(scope.role)?;
    let title = required(&req.title, "Title")?;
    check_position(req.position)?;
    if let Some(assignee) = req.assigned_to {
        check_assignee(&state, scope.organization_id, assignee).await?;
    }

    let fields = CardFields {
        title,
        description: req.description.as_deref(),
        priority: req.priority,
        position: req.position,
        assigned_to: req.assigned_to,
        due_date: req.due_date,
    };
    let card = db::cards::create(&state.pool, column_id, &fields, auth.user_id).await?;

    audit::log_event(
        &state.pool,
        Some(scope.organization_id),
        auth.user_id,
        "card.created",
        "card",
        Some(card.id),
        None,
    )
    .await;

    Ok(ok(card))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Card>>, AppError> {
    let card = find(&state, id).await?;
    column_scope(&state, auth.user_id, card.column_id)
        .await
        .map_err(|_| AppError::NotFound("Card not found".to_string()))?;
    Ok(ok(card))
}

/// Edit a card, optionally moving it to another column of the same board.
pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCard>,
) -> Result<Json<ApiResponse<Card>>, AppError> {
    let card = find(&state, id).await?;
    let scope = column_scope(&state, auth.user_id, card.column_id)
        .await
        .map_err(|_| AppError::NotFound("Card not found".to_string()))?;
    access::require_editor(scope.role)?;
    check_position(req.position)?;

    let column_id = match req.column_id {
        Some(target) if target != card.column_id => {
            let (board_id, _, _) = db::hierarchy::column_scope(&state.pool, target)
                .await?
                .ok_or_else(|| AppError::NotFound("Column not found".to_string()))?;
            if board_id != scope.board_id {
                return Err(AppError::BadRequest(
                    "Cards can only move between columns of the same board".to_string(),
                ));
            }
            target
        }
        _ => card.column_id,
    };

    let title = match req.title.as_deref() {
        Some(title) => required(title, "Title")?,
        None => card.title.as_str(),
    };
    let priority = match req.priority {
        Some(priority) => priority,
        None => card.priority.parse().unwrap_or_default(),
    };
    let assigned_to = req.assigned_to.unwrap_or(card.assigned_to);
    if let Some(assignee) = assigned_to.filter(|a| Some(*a) != card.assigned_to) {
        check_assignee(&state, scope.organization_id, assignee).await?;
    }
    let description = match &req.description {
        Some(description) => description.as_deref(),
        None => card.description.as_deref(),
    };

    let fields = CardFields {
        title,
        description,
        priority,
        position: req.position,
        assigned_to,
        due_date: req.due_date.unwrap_or(card.due_date),
    };
    let updated = db::cards::update(&state.pool, id, column_id, &fields).await?;

    let details = (column_id != card.column_id)
        .then(|| serde_json::json!({ "from_column": card.column_id, "to_column": column_id }));
    audit::log_event(
        &state.pool,
        Some(scope.organization_id),
        auth.user_id,
        if details.is_some() { "card.moved" } else { "card.updated" },
        "card",
        Some(id),
        details,
    )
    .await;

    Ok(ok(updated))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let mut tx = state.pool.begin().await?;
    let ownership =
        gate::authorize_delete(&mut *tx, auth.user_id, ProtectedEntity::Card(id)).await?;
    db::cards::delete(&mut *tx, id).await?;
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(ownership.organization_id),
        auth.user_id,
        "card.deleted",
        "card",
        Some(id),
        None,
    )
    .await;

    Ok(message("Deleted"))
}

struct ColumnScope {
    board_id: Uuid,
    organization_id: Uuid,
    role: Role,
}

async fn column_scope(
    state: &SharedState,
    user_id: Uuid,
    column_id: Uuid,
) -> Result<ColumnScope, AppError> {
    let (board_id, _, organization_id) = db::hierarchy::column_scope(&state.pool, column_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Column not found".to_string()))?;
    let role = access::member_role(&state.pool, user_id, organization_id, "Column").await?;
    Ok(ColumnScope {
        board_id,
        organization_id,
        role,
    })
}

async fn find(state: &SharedState, id: Uuid) -> Result<Card, AppError> {
    db::cards::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))
}

async fn check_assignee(
    state: &SharedState,
    organization_id: Uuid,
    assignee: Uuid,
) -> Result<(), AppError> {
    if db::memberships::find(&state.pool, organization_id, assignee)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(
            "Assignee must be a member of the organization".to_string(),
        ));
    }
    Ok(())
}
