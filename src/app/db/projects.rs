use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::OrganizationId;
use crate::app::policy::scope::ScopeFilter;

/// Database row for projects table.
#[derive(Debug, FromRow)]
pub struct Project {
    pub id: String,
    pub organization_id: String,
    pub client_id: Option<String>,
    pub name: String,
    pub created_at: i64,
}

/// Data structure for inserting a new project.
pub struct NewProject {
    pub id: String,
    pub organization_id: OrganizationId,
    pub client_id: Option<String>,
    pub name: String,
}

/// Insert a new project.
pub async fn insert<'e, E>(executor: E, project: &NewProject) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO projects (id, organization_id, client_id, name, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&project.id)
    .bind(project.organization_id.as_str())
    .bind(&project.client_id)
    .bind(&project.name)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// List projects visible under the scope filter.
pub async fn list(pool: &sqlx::SqlitePool, scope: &ScopeFilter) -> Result<Vec<Project>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, client_id, name, created_at FROM projects WHERE ",
    );
    scope.push_predicate(&mut qb, "organization_id");
    qb.push(" ORDER BY created_at DESC, id DESC");
    qb.build_query_as::<Project>().fetch_all(pool).await
}

/// Find a project by ID within the scope filter.
pub async fn find_by_id(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
    id: &str,
) -> Result<Option<Project>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, client_id, name, created_at FROM projects WHERE id = ",
    );
    qb.push_bind(id);
    qb.push(" AND ");
    scope.push_predicate(&mut qb, "organization_id");
    qb.build_query_as::<Project>().fetch_optional(pool).await
}

/// Find a project by ID with no scope applied. Used to derive a child's
/// tenant and to guard writes; never feeds a response directly.
pub async fn find_by_id_any<'e, E>(executor: E, id: &str) -> Result<Option<Project>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Project>(
        "SELECT id, organization_id, client_id, name, created_at FROM projects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Rename a project.
pub async fn update_name<'e, E>(executor: E, id: &str, name: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE projects SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete a project row. Dependent tasks and attachments are handled by the
/// cascade in `policy::cascade`.
pub async fn delete<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete every project of an organization (cascade path).
pub async fn delete_for_org<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM projects WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}
