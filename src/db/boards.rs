use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Board;

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        "SELECT * FROM boards WHERE project_id = $1 ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    name: &str,
    description: Option<&str>,
    created_by: Uuid,
) -> Result<Board, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        "INSERT INTO boards (project_id, name, description, created_by)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(project_id)
    .bind(name)
    .bind(description)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>("SELECT * FROM boards WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Board, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        "UPDATE boards SET name = $2, description = $3, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM boards WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
