use rand_core::RngCore;
use sqlx::{FromRow, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::UserId;

/// Database row for sessions table.
#[derive(Debug, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: i64,
    pub created_at: i64,
}

/// Generate a high-entropy session token (64 hex chars = 32 bytes).
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand_core::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create a new session for a user. Returns the session token.
pub async fn create<'e, E>(
    executor: E,
    user_id: &UserId,
    expires_at: OffsetDateTime,
) -> Result<String, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let session_id = generate_token();
    let now = OffsetDateTime::now_utc().unix_timestamp();

    sqlx::query("INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(user_id.as_str())
        .bind(expires_at.unix_timestamp())
        .bind(now)
        .execute(executor)
        .await?;

    Ok(session_id)
}

/// Find a valid (non-expired) session by token.
pub async fn find_valid(
    pool: &sqlx::SqlitePool,
    session_id: &str,
) -> Result<Option<Session>, sqlx::Error> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query_as::<_, Session>(
        "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ? AND expires_at > ?",
    )
    .bind(session_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Delete a session (sign-out). Invalidates the cached identity for that
/// token immediately.
pub async fn delete<'e, E>(executor: E, session_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id)
        .execute(executor)
        .await?;
    Ok(())
}
