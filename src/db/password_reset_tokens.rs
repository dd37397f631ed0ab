use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PasswordResetToken;

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<PasswordResetToken, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(
        "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

/// Consume an unexpired, unused token in one statement so it works once.
pub async fn consume(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<PasswordResetToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(
        "UPDATE password_reset_tokens SET used = true
         WHERE token_hash = $1 AND used = false AND expires_at > now()
         RETURNING *",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}
