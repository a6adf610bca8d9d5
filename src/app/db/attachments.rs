use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::OrganizationId;
use crate::app::policy::scope::ScopeFilter;

/// Database row for attachments table. Exactly one of project_id/task_id is
/// set; storage_path is derived by the policy layer, never caller-supplied.
#[derive(Debug, FromRow)]
pub struct Attachment {
    pub id: String,
    pub organization_id: String,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub file_name: String,
    pub storage_path: String,
    pub byte_size: i64,
    pub created_at: i64,
}

/// Data structure for inserting a new attachment.
pub struct NewAttachment {
    pub id: String,
    pub organization_id: OrganizationId,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub file_name: String,
    pub storage_path: String,
    pub byte_size: i64,
}

/// Insert a new attachment.
pub async fn insert<'e, E>(executor: E, attachment: &NewAttachment) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO attachments (id, organization_id, project_id, task_id, file_name, storage_path, byte_size, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&attachment.id)
    .bind(attachment.organization_id.as_str())
    .bind(&attachment.project_id)
    .bind(&attachment.task_id)
    .bind(&attachment.file_name)
    .bind(&attachment.storage_path)
    .bind(attachment.byte_size)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// List attachments visible under the scope filter.
pub async fn list(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
) -> Result<Vec<Attachment>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, project_id, task_id, file_name, storage_path, byte_size, created_at FROM attachments WHERE ",
    );
    scope.push_predicate(&mut qb, "organization_id");
    qb.push(" ORDER BY created_at DESC, id DESC");
    qb.build_query_as::<Attachment>().fetch_all(pool).await
}

/// Find an attachment by ID within the scope filter.
pub async fn find_by_id(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
    id: &str,
) -> Result<Option<Attachment>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, project_id, task_id, file_name, storage_path, byte_size, created_at FROM attachments WHERE id = ",
    );
    qb.push_bind(id);
    qb.push(" AND ");
    scope.push_predicate(&mut qb, "organization_id");
    qb.build_query_as::<Attachment>().fetch_optional(pool).await
}

/// Find an attachment by ID with no scope applied. Guard paths only.
pub async fn find_by_id_any<'e, E>(executor: E, id: &str) -> Result<Option<Attachment>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Attachment>(
        "SELECT id, organization_id, project_id, task_id, file_name, storage_path, byte_size, created_at FROM attachments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Delete an attachment row.
pub async fn delete<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM attachments WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// All attachments of an organization, for cascade file cleanup.
pub async fn list_for_org<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<Vec<Attachment>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Attachment>(
        "SELECT id, organization_id, project_id, task_id, file_name, storage_path, byte_size, created_at FROM attachments WHERE organization_id = ?",
    )
    .bind(organization_id.as_str())
    .fetch_all(executor)
    .await
}

/// All attachments under a project, including ones on the project's tasks.
pub async fn list_for_project<'e, E>(
    executor: E,
    project_id: &str,
) -> Result<Vec<Attachment>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Attachment>(
        "SELECT id, organization_id, project_id, task_id, file_name, storage_path, byte_size, created_at FROM attachments \
         WHERE project_id = ? OR task_id IN (SELECT id FROM tasks WHERE project_id = ?)",
    )
    .bind(project_id)
    .bind(project_id)
    .fetch_all(executor)
    .await
}

/// Delete every attachment of an organization (cascade path).
pub async fn delete_for_org<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM attachments WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete every attachment under a project, including task-scoped ones
/// (cascade path).
pub async fn delete_for_project<'e, E>(executor: E, project_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "DELETE FROM attachments WHERE project_id = ? OR task_id IN (SELECT id FROM tasks WHERE project_id = ?)",
    )
    .bind(project_id)
    .bind(project_id)
    .execute(executor)
    .await?;
    Ok(())
}
