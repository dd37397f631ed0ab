use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Member, Membership, Role};

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
    role: Role,
) -> Result<Membership, sqlx::Error> {
    sqlx::query_as::<_, Membership>(
        "INSERT INTO organization_members (organization_id, user_id, role)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(organization_id)
    .bind(user_id)
    .bind(role.as_str())
    .fetch_one(executor)
    .await
}

pub async fn find<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Membership>, sqlx::Error> {
    sqlx::query_as::<_, Membership>(
        "SELECT * FROM organization_members WHERE organization_id = $1 AND user_id = $2",
    )
    .bind(organization_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_members(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        "SELECT u.id AS user_id, u.email, u.name, m.role, m.joined_at
         FROM organization_members m
         JOIN users u ON u.id = m.user_id
         WHERE m.organization_id = $1
         ORDER BY m.joined_at ASC",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

/// Members holding one of `roles`, used to address notifications.
pub async fn list_with_roles(
    pool: &PgPool,
    organization_id: Uuid,
    roles: &[Role],
) -> Result<Vec<Member>, sqlx::Error> {
    let roles: Vec<&str> = roles.iter().map(Role::as_str).collect();
    sqlx::query_as::<_, Member>(
        "SELECT u.id AS user_id, u.email, u.name, m.role, m.joined_at
         FROM organization_members m
         JOIN users u ON u.id = m.user_id
         WHERE m.organization_id = $1 AND m.role = ANY($2)",
    )
    .bind(organization_id)
    .bind(roles)
    .fetch_all(pool)
    .await
}

pub async fn count_owners<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM organization_members WHERE organization_id = $1 AND role = 'owner'",
    )
    .bind(organization_id)
    .fetch_one(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM organization_members WHERE organization_id = $1 AND user_id = $2",
    )
    .bind(organization_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
