use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Organization, OrganizationWithRole};

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (name, slug, description) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(slug)
    .bind(description)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn slug_exists<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    slug: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM organizations WHERE slug = $1)")
        .bind(slug)
        .fetch_one(executor)
        .await
}

/// Organizations the user belongs to, with the user's role in each.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<OrganizationWithRole>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationWithRole>(
        "SELECT o.id, o.name, o.slug, o.description, m.role, o.created_at, o.updated_at
         FROM organizations o
         JOIN organization_members m ON m.organization_id = o.id
         WHERE m.user_id = $1
         ORDER BY o.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "UPDATE organizations SET name = $2, description = $3, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

/// Returns false when the row was already gone.
pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
