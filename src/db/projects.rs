use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Project;

pub async fn list(pool: &PgPool, organization_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE organization_id = $1 ORDER BY created_at DESC",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    name: &str,
    description: Option<&str>,
    created_by: Uuid,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (organization_id, name, description, created_by)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(organization_id)
    .bind(name)
    .bind(description)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

/// Unscoped lookup; callers check membership of `organization_id` afterwards.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Lock the project row for the rest of the transaction.
pub async fn find_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET name = $2, description = $3, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

/// Lock every project of the organization for update and report whether any
/// is protected. Rows are locked in id order so concurrent callers queue.
pub async fn lock_and_check_protected<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let flags = sqlx::query_scalar::<_, bool>(
        "SELECT data_protected FROM projects
         WHERE organization_id = $1
         ORDER BY id
         FOR UPDATE",
    )
    .bind(organization_id)
    .fetch_all(executor)
    .await?;
    Ok(flags.into_iter().any(|protected| protected))
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
