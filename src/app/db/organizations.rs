use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::{OrganizationId, OrganizationRole, Slug, UserId};
use crate::app::identity::Membership;
use crate::app::policy::scope::ScopeFilter;

/// Database row for organizations table.
#[derive(Debug, FromRow)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
}

/// Data structure for inserting a new organization.
pub struct NewOrganization {
    pub id: OrganizationId,
    pub name: String,
    pub slug: Slug,
}

/// Insert a new organization.
pub async fn insert<'e, E>(executor: E, organization: &NewOrganization) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query("INSERT INTO organizations (id, name, slug, created_at) VALUES (?, ?, ?, ?)")
        .bind(organization.id.as_str())
        .bind(&organization.name)
        .bind(organization.slug.as_str())
        .bind(now)
        .execute(executor)
        .await?;
    Ok(())
}

/// List organizations visible under the scope filter. For this table the
/// tenant column is the primary key itself.
pub async fn list(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
) -> Result<Vec<Organization>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, name, slug, created_at FROM organizations WHERE ",
    );
    scope.push_predicate(&mut qb, "id");
    qb.push(" ORDER BY created_at DESC, id DESC");
    qb.build_query_as::<Organization>().fetch_all(pool).await
}

/// Find an organization by ID within the scope filter. Returns None for
/// organizations outside the actor's scope, indistinguishable from missing.
pub async fn find_by_id(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
    organization_id: &OrganizationId,
) -> Result<Option<Organization>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, name, slug, created_at FROM organizations WHERE id = ",
    );
    qb.push_bind(organization_id.as_str());
    qb.push(" AND ");
    scope.push_predicate(&mut qb, "id");
    qb.build_query_as::<Organization>().fetch_optional(pool).await
}

/// Find an organization by ID with no scope applied. For internal guard and
/// cascade paths only; never feeds a response directly.
pub async fn find_by_id_any<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<Option<Organization>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Organization>(
        "SELECT id, name, slug, created_at FROM organizations WHERE id = ?",
    )
    .bind(organization_id.as_str())
    .fetch_optional(executor)
    .await
}

/// Rename an organization.
pub async fn update_name<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    name: &str,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE organizations SET name = ? WHERE id = ?")
        .bind(name)
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete the organization row itself. Dependent rows are handled by the
/// cascade in `policy::cascade`.
pub async fn delete<'e, E>(executor: E, organization_id: &OrganizationId) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM organizations WHERE id = ?")
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

/// Add a user to an organization with a specific role.
pub async fn add_member<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    user_id: &UserId,
    role: OrganizationRole,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO organization_members (organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(organization_id.as_str())
    .bind(user_id.as_str())
    .bind(role.to_string())
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Remove a user from an organization. Membership is independent of the
/// user account, which stays.
pub async fn remove_member<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    user_id: &UserId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM organization_members WHERE organization_id = ? AND user_id = ?")
        .bind(organization_id.as_str())
        .bind(user_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

/// Remove every membership of an organization (cascade path).
pub async fn remove_all_members<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM organization_members WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

/// Check if a user is a member of an organization.
pub async fn is_member<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    user_id: &UserId,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM organization_members WHERE organization_id = ? AND user_id = ?",
    )
    .bind(organization_id.as_str())
    .bind(user_id.as_str())
    .fetch_one(executor)
    .await?;
    Ok(count > 0)
}

/// All memberships of a user, in join order. Rows with an unparseable id or
/// role are skipped rather than failing the whole resolution.
pub async fn memberships_for_user(
    pool: &sqlx::SqlitePool,
    user_id: &UserId,
) -> Result<Vec<Membership>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT organization_id, role FROM organization_members WHERE user_id = ? ORDER BY created_at ASC, organization_id ASC",
    )
    .bind(user_id.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(organization_id, role)| {
            Some(Membership {
                organization_id: OrganizationId::from_string(&organization_id).ok()?,
                role: role.parse::<OrganizationRole>().ok()?,
            })
        })
        .collect())
}
