//! Writes to the sign-off state. Each operation runs in one transaction that
//! holds the project row `FOR UPDATE`, so concurrent requests and reviews on
//! the same project are serialized and a failed check leaves nothing behind.

use sqlx::PgPool;
use uuid::Uuid;

use super::status::SignoffStatus;
use super::{Review, plan_request, plan_review};
use crate::auth::access;
use crate::db;
use crate::error::AppError;
use crate::models::SignoffRequestStatus;

pub async fn request_signoff(
    pool: &PgPool,
    requester: Uuid,
    project_id: Uuid,
    notes: Option<&str>,
    reason: Option<&str>,
) -> Result<SignoffStatus, AppError> {
    let mut tx = pool.begin().await?;

    let project = db::projects::find_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let role = access::member_role(&mut *tx, requester, project.organization_id, "Project").await?;

    plan_request(project.signoff_flags(), role)?;

    let updated =
        db::signoff::mark_requested(&mut *tx, project_id, requester, notes, reason).await?;
    db::signoff::insert_request(&mut *tx, project_id, requester, notes, reason).await?;

    tx.commit().await?;

    tracing::info!(
        project_id = %project_id,
        requested_by = %requester,
        "Sign-off requested; project data protected"
    );

    Ok(SignoffStatus::from(&updated))
}

/// Result of a review: the new status plus who asked for it, since a
/// rejection clears the requester from the project row.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub status: SignoffStatus,
    pub requested_by: Option<Uuid>,
}

pub async fn review_signoff(
    pool: &PgPool,
    reviewer: Uuid,
    project_id: Uuid,
    review: Review,
    notes: Option<&str>,
) -> Result<ReviewOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let project = db::projects::find_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let role = access::member_role(&mut *tx, reviewer, project.organization_id, "Project").await?;

    let next = plan_review(project.signoff_flags(), role, review)?;

    let (updated, archived_as) = match review {
        Review::Approve { .. } => (
            db::signoff::mark_approved(&mut *tx, project_id, reviewer, notes, next.protected)
                .await?,
            SignoffRequestStatus::Approved,
        ),
        Review::Reject => (
            db::signoff::mark_rejected(&mut *tx, project_id).await?,
            SignoffRequestStatus::Rejected,
        ),
    };
    db::signoff::close_pending_request(&mut *tx, project_id, archived_as, reviewer, notes).await?;

    tx.commit().await?;

    tracing::info!(
        project_id = %project_id,
        reviewed_by = %reviewer,
        outcome = archived_as.as_str(),
        data_protected = updated.data_protected,
        "Sign-off reviewed"
    );

    Ok(ReviewOutcome {
        status: SignoffStatus::from(&updated),
        requested_by: project.sign_off_requested_by,
    })
}
