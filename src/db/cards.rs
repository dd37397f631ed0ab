use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Card, Priority};

pub struct CardFields<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: Priority,
    pub position: Option<i32>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

pub async fn list_by_column(pool: &PgPool, column_id: Uuid) -> Result<Vec<Card>, sqlx::Error> {
    sqlx::query_as::<_, Card>(
        "SELECT * FROM cards WHERE column_id = $1 ORDER BY position ASC, created_at ASC",
    )
    .bind(column_id)
    .fetch_all(pool)
    .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    column_id: Uuid,
    fields: &CardFields<'_>,
    created_by: Uuid,
) -> Result<Card, sqlx::Error> {
    sqlx::query_as::<_, Card>(
        "INSERT INTO cards (column_id, title, description, priority, position, assigned_to, due_date, created_by)
         VALUES ($1, $2, $3, $4,
                 COALESCE($5, (SELECT COALESCE(MAX(position) + 1, 0) FROM cards WHERE column_id = $1)),
                 $6, $7, $8)
         RETURNING *",
    )
    .bind(column_id)
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.priority.as_str())
    .bind(fields.position)
    .bind(fields.assigned_to)
    .bind(fields.due_date)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Card>, sqlx::Error> {
    sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Replace the editable fields, moving the card to `column_id`.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    column_id: Uuid,
    fields: &CardFields<'_>,
) -> Result<Card, sqlx::Error> {
    sqlx::query_as::<_, Card>(
        "UPDATE cards SET column_id = $2, title = $3, description = $4, priority = $5,
                position = COALESCE($6, position), assigned_to = $7, due_date = $8,
                updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(column_id)
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.priority.as_str())
    .bind(fields.position)
    .bind(fields.assigned_to)
    .bind(fields.due_date)
    .fetch_one(pool)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cards WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
