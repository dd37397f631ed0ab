use sqlx::PgPool;
use uuid::Uuid;

use crate::models::BoardColumn;

pub async fn list_by_board(pool: &PgPool, board_id: Uuid) -> Result<Vec<BoardColumn>, sqlx::Error> {
    sqlx::query_as::<_, BoardColumn>(
        "SELECT * FROM board_columns WHERE board_id = $1 ORDER BY position ASC, created_at ASC",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await
}

/// Appends after the last column when `position` is not given.
pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    board_id: Uuid,
    name: &str,
    position: Option<i32>,
    created_by: Uuid,
) -> Result<BoardColumn, sqlx::Error> {
    sqlx::query_as::<_, BoardColumn>(
        "INSERT INTO board_columns (board_id, name, position, created_by)
         VALUES ($1, $2,
                 COALESCE($3, (SELECT COALESCE(MAX(position) + 1, 0)
                               FROM board_columns WHERE board_id = $1)),
                 $4)
         RETURNING *",
    )
    .bind(board_id)
    .bind(name)
    .bind(position)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<BoardColumn>, sqlx::Error> {
    sqlx::query_as::<_, BoardColumn>("SELECT * FROM board_columns WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    position: Option<i32>,
) -> Result<BoardColumn, sqlx::Error> {
    sqlx::query_as::<_, BoardColumn>(
        "UPDATE board_columns SET name = $2, position = COALESCE($3, position), updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(position)
    .fetch_one(pool)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM board_columns WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
