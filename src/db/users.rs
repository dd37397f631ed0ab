use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
    password_hash: &str,
    name: &str,
    is_system_admin: bool,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, name, is_system_admin)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(is_system_admin)
    .fetch_one(executor)
    .await
}

/// Emails are matched case-insensitively.
pub async fn find_by_email<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count_all<'e, E: sqlx::PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}
