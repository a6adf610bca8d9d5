use sqlx::{FromRow, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::{Email, HashedPassword, UserId};

/// Database row for users table.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub is_superadmin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Data structure for inserting a new user.
pub struct NewUser {
    pub id: UserId,
    pub email: Email,
    pub password_hash: HashedPassword,
}

/// Insert a new user. New accounts are never superadmins.
pub async fn insert<'e, E>(executor: E, user: &NewUser) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, is_superadmin, created_at, updated_at) VALUES (?, ?, ?, 0, ?, ?)",
    )
    .bind(user.id.as_str())
    .bind(user.email.as_str())
    .bind(user.password_hash.as_str())
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Find a user by email address.
pub async fn find_by_email(
    pool: &sqlx::SqlitePool,
    email: &Email,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, is_superadmin, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email.as_str())
    .fetch_optional(pool)
    .await
}

/// Find a user by ID.
pub async fn find_by_id<'e, E>(executor: E, user_id: &UserId) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, is_superadmin, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(user_id.as_str())
    .fetch_optional(executor)
    .await
}

/// Global superadmin lookup, independent of any organization context.
/// A missing user is simply not a superadmin.
pub async fn is_superadmin(
    pool: &sqlx::SqlitePool,
    user_id: &UserId,
) -> Result<bool, sqlx::Error> {
    let flag: Option<bool> =
        sqlx::query_scalar("SELECT is_superadmin FROM users WHERE id = ?")
            .bind(user_id.as_str())
            .fetch_optional(pool)
            .await?;
    Ok(flag.unwrap_or(false))
}

/// Grant the global superadmin capability. Used by seeds and tests; there is
/// no HTTP surface for this.
pub async fn grant_superadmin<'e, E>(executor: E, user_id: &UserId) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query("UPDATE users SET is_superadmin = 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(user_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}
