use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::OrganizationId;
use crate::app::policy::scope::ScopeFilter;

/// Database row for tasks table. `project_id` is optional; when set, the
/// task's organization_id always equals the project's.
#[derive(Debug, FromRow)]
pub struct Task {
    pub id: String,
    pub organization_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub done: bool,
    pub created_at: i64,
}

/// Data structure for inserting a new task.
pub struct NewTask {
    pub id: String,
    pub organization_id: OrganizationId,
    pub project_id: Option<String>,
    pub title: String,
}

/// Insert a new task.
pub async fn insert<'e, E>(executor: E, task: &NewTask) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO tasks (id, organization_id, project_id, title, done, created_at) VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(&task.id)
    .bind(task.organization_id.as_str())
    .bind(&task.project_id)
    .bind(&task.title)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// List tasks visible under the scope filter.
pub async fn list(pool: &sqlx::SqlitePool, scope: &ScopeFilter) -> Result<Vec<Task>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, project_id, title, done, created_at FROM tasks WHERE ",
    );
    scope.push_predicate(&mut qb, "organization_id");
    qb.push(" ORDER BY created_at DESC, id DESC");
    qb.build_query_as::<Task>().fetch_all(pool).await
}

/// Find a task by ID within the scope filter.
pub async fn find_by_id(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
    id: &str,
) -> Result<Option<Task>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, project_id, title, done, created_at FROM tasks WHERE id = ",
    );
    qb.push_bind(id);
    qb.push(" AND ");
    scope.push_predicate(&mut qb, "organization_id");
    qb.build_query_as::<Task>().fetch_optional(pool).await
}

/// Find a task by ID with no scope applied. Guard and derivation paths only.
pub async fn find_by_id_any<'e, E>(executor: E, id: &str) -> Result<Option<Task>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Task>(
        "SELECT id, organization_id, project_id, title, done, created_at FROM tasks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Update a task's title and done flag.
pub async fn update<'e, E>(executor: E, id: &str, title: &str, done: bool) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE tasks SET title = ?, done = ? WHERE id = ?")
        .bind(title)
        .bind(done)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete a task.
pub async fn delete<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete every task of an organization (cascade path).
pub async fn delete_for_org<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM tasks WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete every task of a project (cascade path).
pub async fn delete_for_project<'e, E>(executor: E, project_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM tasks WHERE project_id = ?")
        .bind(project_id)
        .execute(executor)
        .await?;
    Ok(())
}
