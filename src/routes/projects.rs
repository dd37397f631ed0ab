use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::{GeneratedProject, GenerationRequest};
use crate::auth::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::cards::CardFields;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Board, BoardColumn, Card, Project};
use crate::response::{ApiResponse, Message, message, ok};
use crate::routes::organizations::required;
use crate::signoff::gate::{self, ProtectedEntity};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateProject {
    pub name: String,
    pub description: String,
    pub team_size: Option<u32>,
    pub duration_weeks: Option<u32>,
}

#[derive(Serialize)]
pub struct GeneratedColumnView {
    #[serde(flatten)]
    pub column: BoardColumn,
    pub cards: Vec<Card>,
}

#[derive(Serialize)]
pub struct GeneratedBoardView {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<GeneratedColumnView>,
}

#[derive(Serialize)]
pub struct GeneratedProjectView {
    pub project: Project,
    pub boards: Vec<GeneratedBoardView>,
    pub generator: String,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Project>>>, AppError> {
    access::member_role(&state.pool, auth.user_id, organization_id, "Organization").await?;
    let projects = db::projects::list(&state.pool, organization_id).await?;
    Ok(ok(projects))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(organization_id): Path<Uuid>,
    Json(req): Json<CreateProject>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let role =
        access::member_role(&state.pool, auth.user_id, organization_id, "Organization").await?;
    access::require_editor(role)?;
    let name = required(&req.name, "Name")?;

    let project = db::projects::create(
        &state.pool,
        organization_id,
        name,
        req.description.as_deref(),
        auth.user_id,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(organization_id),
        auth.user_id,
        "project.created",
        "project",
        Some(project.id),
        None,
    )
    .await;

    Ok(ok(project))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let project = visible(&state, auth.user_id, id).await?;
    Ok(ok(project))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let project = find(&state, id).await?;
    let role =
        access::member_role(&state.pool, auth.user_id, project.organization_id, "Project").await?;
    access::require_editor(role)?;
    let name = required(&req.name, "Name")?;

    let project = db::projects::update(&state.pool, id, name, req.description.as_deref()).await?;

    audit::log_event(
        &state.pool,
        Some(project.organization_id),
        auth.user_id,
        "project.updated",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(ok(project))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let mut tx = state.pool.begin().await?;
    let ownership = gate::authorize_delete(&mut *tx, auth.user_id, ProtectedEntity::Project(id))
        .await?;
    db::projects::delete(&mut *tx, id).await?;
    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(ownership.organization_id),
        auth.user_id,
        "project.deleted",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(message("Deleted"))
}

/// Ask the configured generator for a project outline and save all of it.
pub async fn generate(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(organization_id): Path<Uuid>,
    Json(req): Json<GenerateProject>,
) -> Result<Json<ApiResponse<GeneratedProjectView>>, AppError> {
    let role =
        access::member_role(&state.pool, auth.user_id, organization_id, "Organization").await?;
    access::require_editor(role)?;
    let name = required(&req.name, "Name")?;
    if req.description.trim().is_empty() {
        return Err(AppError::BadRequest("Description is required".to_string()));
    }

    if let Err(retry_after) = state.generation_limiter.check(auth.user_id) {
        return Err(AppError::RateLimited(format!(
            "Too many generation requests. Try again in {retry_after} seconds."
        )));
    }

    let organization = db::organizations::find_by_id(&state.pool, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let request = GenerationRequest {
        name: name.to_string(),
        description: req.description.trim().to_string(),
        organization_name: organization.name,
        team_size: req.team_size,
        duration_weeks: req.duration_weeks,
    };

    let generated = state
        .generator
        .generate(&request)
        .await
        .and_then(|project| project.sanitize(name))
        .map_err(|e| {
            tracing::warn!(
                generator = state.generator.id(),
                kind = ?e.kind,
                "Project generation failed: {e}"
            );
            AppError::from(e)
        })?;

    let view = persist_generated(&state, organization_id, auth.user_id, generated).await?;

    tracing::info!(
        project_id = %view.project.id,
        generator = state.generator.id(),
        boards = view.boards.len(),
        "Generated project saved"
    );

    audit::log_event(
        &state.pool,
        Some(organization_id),
        auth.user_id,
        "project.generated",
        "project",
        Some(view.project.id),
        Some(serde_json::json!({ "generator": view.generator })),
    )
    .await;

    Ok(ok(view))
}

async fn persist_generated(
    state: &SharedState,
    organization_id: Uuid,
    user_id: Uuid,
    generated: GeneratedProject,
) -> Result<GeneratedProjectView, AppError> {
    let mut tx = state.pool.begin().await?;

    let project = db::projects::create(
        &mut *tx,
        organization_id,
        generated.name.trim(),
        generated.description.as_deref(),
        user_id,
    )
    .await?;

    let mut boards = Vec::with_capacity(generated.boards.len());
    for gen_board in &generated.boards {
        let board = db::boards::create(
            &mut *tx,
            project.id,
            gen_board.name.trim(),
            gen_board.description.as_deref(),
            user_id,
        )
        .await?;

        let mut columns = Vec::with_capacity(gen_board.columns.len());
        for (position, gen_column) in gen_board.columns.iter().enumerate() {
            let column = db::columns::create(
                &mut *tx,
                board.id,
                gen_column.name.trim(),
                Some(position as i32),
                user_id,
            )
            .await?;

            let mut cards = Vec::with_capacity(gen_column.cards.len());
            for (position, gen_card) in gen_column.cards.iter().enumerate() {
                let fields = CardFields {
                    title: gen_card.title.trim(),
                    description: gen_card.description.as_deref(),
                    priority: gen_card.priority,
                    position: Some(position as i32),
                    assigned_to: None,
                    due_date: None,
                };
                cards.push(db::cards::create(&mut *tx, column.id, &fields, user_id).await?);
            }
            columns.push(GeneratedColumnView { column, cards });
        }
        boards.push(GeneratedBoardView { board, columns });
    }

    tx.commit().await?;

    Ok(GeneratedProjectView {
        project,
        boards,
        generator: state.generator.id().to_string(),
    })
}

async fn find(state: &SharedState, id: Uuid) -> Result<Project, AppError> {
    db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

/// Project `id` if the caller belongs to its organization. Non-members see 404.
pub(crate) async fn visible(
    state: &SharedState,
    user_id: Uuid,
    id: Uuid,
) -> Result<Project, AppError> {
    let project = find(state, id).await?;
    access::member_role(&state.pool, user_id, project.organization_id, "Project").await?;
    Ok(project)
}
