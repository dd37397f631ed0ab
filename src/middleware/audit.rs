use sqlx::PgPool;
use uuid::Uuid;

/// Record an activity-feed event after a successful mutation.
///
/// Failures are logged and swallowed; the mutation has already committed.
pub async fn log_event(
    pool: &PgPool,
    organization_id: Option<Uuid>,
    user_id: Uuid,
    action: &str,
    resource_type: &str,
    resource_id: Option<Uuid>,
    details: Option<serde_json::Value>,
) {
    tracing::debug!(action, resource_type, ?resource_id, "audit");
    if let Err(e) = crate::db::audit::log_event(
        pool,
        organization_id,
        Some(user_id),
        action,
        resource_type,
        resource_id,
        details,
    )
    .await
    {
        tracing::error!("Failed to log audit event: {e}");
    }
}
