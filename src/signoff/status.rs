use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::SignoffState;
use crate::auth::access;
use crate::db;
use crate::error::AppError;
use crate::models::{Project, SignoffRequest};

/// Read-side view of a project's sign-off columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignoffStatus {
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub project_name: String,
    pub state: SignoffState,
    pub sign_off_requested: bool,
    pub sign_off_approved: bool,
    pub data_protected: bool,
    pub requested_by: Option<Uuid>,
    pub requested_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub approval_notes: Option<String>,
}

impl From<&Project> for SignoffStatus {
    fn from(project: &Project) -> Self {
        Self {
            project_id: project.id,
            organization_id: project.organization_id,
            project_name: project.name.clone(),
            state: project.signoff_flags().state(),
            sign_off_requested: project.sign_off_requested,
            sign_off_approved: project.sign_off_approved,
            data_protected: project.data_protected,
            requested_by: project.sign_off_requested_by,
            requested_at: project.sign_off_requested_at,
            approved_by: project.sign_off_approved_by,
            approved_at: project.sign_off_approved_at,
            notes: project.sign_off_notes.clone(),
            reason: project.sign_off_reason.clone(),
            approval_notes: project.sign_off_approval_notes.clone(),
        }
    }
}

/// Current status of a project. Any member of its organization may read it.
pub async fn get_status(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<SignoffStatus, AppError> {
    let project = visible_project(pool, user_id, project_id).await?;
    Ok(SignoffStatus::from(&project))
}

/// Projects awaiting review in every organization where the caller is an
/// owner or admin, optionally narrowed to one organization.
pub async fn list_pending(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Option<Uuid>,
) -> Result<Vec<SignoffStatus>, AppError> {
    let projects = db::signoff::list_pending_for_reviewer(pool, user_id, organization_id).await?;
    Ok(projects.iter().map(SignoffStatus::from).collect())
}

/// Every request made on the project, newest first.
pub async fn history(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Vec<SignoffRequest>, AppError> {
    visible_project(pool, user_id, project_id).await?;
    Ok(db::signoff::list_requests(pool, project_id).await?)
}

async fn visible_project(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Project, AppError> {
    let project = db::projects::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    access::member_role(pool, user_id, project.organization_id, "Project").await?;
    Ok(project)
}
