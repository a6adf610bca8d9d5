use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::OrganizationId;
use crate::app::policy::scope::ScopeFilter;

/// Database row for clients table.
#[derive(Debug, FromRow)]
pub struct Client {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: i64,
}

/// Data structure for inserting a new client.
pub struct NewClient {
    pub id: String,
    pub organization_id: OrganizationId,
    pub name: String,
    pub email: Option<String>,
}

/// Insert a new client.
pub async fn insert<'e, E>(executor: E, client: &NewClient) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO clients (id, organization_id, name, email, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&client.id)
    .bind(client.organization_id.as_str())
    .bind(&client.name)
    .bind(&client.email)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// List clients visible under the scope filter.
pub async fn list(pool: &sqlx::SqlitePool, scope: &ScopeFilter) -> Result<Vec<Client>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, name, email, created_at FROM clients WHERE ",
    );
    scope.push_predicate(&mut qb, "organization_id");
    qb.push(" ORDER BY created_at DESC, id DESC");
    qb.build_query_as::<Client>().fetch_all(pool).await
}

/// Find a client by ID within the scope filter.
pub async fn find_by_id(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
    id: &str,
) -> Result<Option<Client>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, name, email, created_at FROM clients WHERE id = ",
    );
    qb.push_bind(id);
    qb.push(" AND ");
    scope.push_predicate(&mut qb, "organization_id");
    qb.build_query_as::<Client>().fetch_optional(pool).await
}

/// Find a client by ID with no scope applied. Guard paths only.
pub async fn find_by_id_any<'e, E>(executor: E, id: &str) -> Result<Option<Client>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Client>(
        "SELECT id, organization_id, name, email, created_at FROM clients WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Update a client's mutable fields.
pub async fn update<'e, E>(
    executor: E,
    id: &str,
    name: &str,
    email: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE clients SET name = ?, email = ? WHERE id = ?")
        .bind(name)
        .bind(email)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete a client.
pub async fn delete<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM clients WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete every client of an organization (cascade path).
pub async fn delete_for_org<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM clients WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}
