//! Sign-off columns of `projects` and the `project_signoff_requests` archive.
//!
//! These functions write whatever they are told; the transition rules live in
//! [`crate::signoff`] and callers hold the project row lock.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Project, SignoffRequest, SignoffRequestStatus};

pub async fn mark_requested<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    requested_by: Uuid,
    notes: Option<&str>,
    reason: Option<&str>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET
             sign_off_requested = true,
             sign_off_requested_by = $2,
             sign_off_requested_at = now(),
             sign_off_notes = $3,
             sign_off_reason = $4,
             sign_off_approved = false,
             sign_off_approved_by = NULL,
             sign_off_approved_at = NULL,
             sign_off_approval_notes = NULL,
             data_protected = true,
             updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(project_id)
    .bind(requested_by)
    .bind(notes)
    .bind(reason)
    .fetch_one(executor)
    .await
}

pub async fn mark_approved<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    approved_by: Uuid,
    notes: Option<&str>,
    data_protected: bool,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET
             sign_off_approved = true,
             sign_off_approved_by = $2,
             sign_off_approved_at = now(),
             sign_off_approval_notes = $3,
             data_protected = $4,
             updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(project_id)
    .bind(approved_by)
    .bind(notes)
    .bind(data_protected)
    .fetch_one(executor)
    .await
}

/// Clears the request entirely; the archive keeps the record of it.
pub async fn mark_rejected<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET
             sign_off_requested = false,
             sign_off_requested_by = NULL,
             sign_off_requested_at = NULL,
             sign_off_notes = NULL,
             sign_off_reason = NULL,
             sign_off_approved = false,
             sign_off_approved_by = NULL,
             sign_off_approved_at = NULL,
             sign_off_approval_notes = NULL,
             data_protected = false,
             updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(project_id)
    .fetch_one(executor)
    .await
}

pub async fn insert_request<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    requested_by: Uuid,
    notes: Option<&str>,
    reason: Option<&str>,
) -> Result<SignoffRequest, sqlx::Error> {
    sqlx::query_as::<_, SignoffRequest>(
        "INSERT INTO project_signoff_requests (project_id, requested_by, notes, reason)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(project_id)
    .bind(requested_by)
    .bind(notes)
    .bind(reason)
    .fetch_one(executor)
    .await
}

pub async fn close_pending_request<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    status: SignoffRequestStatus,
    reviewed_by: Uuid,
    review_notes: Option<&str>,
) -> Result<Option<SignoffRequest>, sqlx::Error> {
    sqlx::query_as::<_, SignoffRequest>(
        "UPDATE project_signoff_requests SET
             status = $2, reviewed_by = $3, reviewed_at = now(), review_notes = $4
         WHERE project_id = $1 AND status = 'pending'
         RETURNING *",
    )
    .bind(project_id)
    .bind(status.as_str())
    .bind(reviewed_by)
    .bind(review_notes)
    .fetch_optional(executor)
    .await
}

pub async fn list_requests(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<SignoffRequest>, sqlx::Error> {
    sqlx::query_as::<_, SignoffRequest>(
        "SELECT * FROM project_signoff_requests WHERE project_id = $1
         ORDER BY requested_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Pending projects in organizations where `user_id` is an owner or admin.
pub async fn list_pending_for_reviewer(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Option<Uuid>,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT p.* FROM projects p
         JOIN organization_members m ON m.organization_id = p.organization_id
         WHERE m.user_id = $1
           AND m.role IN ('owner', 'admin')
           AND p.sign_off_requested AND NOT p.sign_off_approved
           AND ($2::uuid IS NULL OR p.organization_id = $2)
         ORDER BY p.sign_off_requested_at ASC",
    )
    .bind(user_id)
    .bind(organization_id)
    .fetch_all(pool)
    .await
}
