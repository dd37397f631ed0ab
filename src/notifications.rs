//! Sign-off emails. Sent from background tasks so a slow or missing SMTP
//! server never delays or fails the request that triggered them.

use uuid::Uuid;

use crate::db;
use crate::models::Role;
use crate::signoff::status::SignoffStatus;
use crate::state::SharedState;

fn project_url(base_url: &str, project_id: Uuid) -> String {
    format!("{base_url}/projects/{project_id}")
}

/// Tell the organization's owners and admins that a review is waiting.
pub fn signoff_requested(state: &SharedState, status: &SignoffStatus, requester: Uuid) {
    let state = state.clone();
    let status = status.clone();

    tokio::spawn(async move {
        let Some(mailer) = state.system_mailer.clone() else {
            tracing::info!(project_id = %status.project_id, "Sign-off requested (SMTP not configured, no email sent)");
            return;
        };

        let requester_name = match db::users::find_by_id(&state.pool, requester).await {
            Ok(Some(user)) => user.name,
            _ => "A team member".to_string(),
        };

        let reviewers = match db::memberships::list_with_roles(
            &state.pool,
            status.organization_id,
            &[Role::Owner, Role::Admin],
        )
        .await
        {
            Ok(reviewers) => reviewers,
            Err(e) => {
                tracing::error!("Failed to load sign-off reviewers: {e}");
                return;
            }
        };

        let url = project_url(&state.config.base_url, status.project_id);
        for reviewer in reviewers {
            if let Err(e) = mailer
                .send_signoff_requested(
                    &reviewer.email,
                    &status.project_name,
                    &requester_name,
                    status.notes.as_deref(),
                    &url,
                )
                .await
            {
                tracing::error!("Failed to send sign-off request email: {e}");
            }
        }
    });
}

/// Tell the requester how their request was decided.
pub fn signoff_reviewed(
    state: &SharedState,
    status: &SignoffStatus,
    requester: Option<Uuid>,
    approved: bool,
    notes: Option<String>,
) {
    let Some(requester) = requester else {
        return;
    };
    let state = state.clone();
    let status = status.clone();

    tokio::spawn(async move {
        let Some(mailer) = state.system_mailer.clone() else {
            tracing::info!(project_id = %status.project_id, approved, "Sign-off reviewed (SMTP not configured, no email sent)");
            return;
        };

        let user = match db::users::find_by_id(&state.pool, requester).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Failed to load sign-off requester: {e}");
                return;
            }
        };

        let url = project_url(&state.config.base_url, status.project_id);
        if let Err(e) = mailer
            .send_signoff_reviewed(&user.email, &status.project_name, approved, notes.as_deref(), &url)
            .await
        {
            tracing::error!("Failed to send sign-off review email: {e}");
        }
    });
}
