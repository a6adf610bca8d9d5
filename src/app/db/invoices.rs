use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::{InvoiceStatus, OrganizationId};
use crate::app::policy::scope::ScopeFilter;

/// Database row for invoices table.
#[derive(Debug, FromRow)]
pub struct Invoice {
    pub id: String,
    pub organization_id: String,
    pub client_id: Option<String>,
    pub invoice_number: String,
    pub status: String,
    pub issued_on: Option<i64>,
    pub created_at: i64,
}

/// Data structure for inserting a new invoice. The invoice number comes
/// from the external numbering service; this layer only stores it.
pub struct NewInvoice {
    pub id: String,
    pub organization_id: OrganizationId,
    pub client_id: Option<String>,
    pub invoice_number: String,
    pub status: InvoiceStatus,
}

/// Database row for invoice_line_items. Carries no organization_id: the
/// line item's tenant is its invoice's tenant, always reached by join.
#[derive(Debug, FromRow)]
pub struct LineItem {
    pub id: String,
    pub invoice_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub position: i64,
    pub created_at: i64,
}

/// Data structure for inserting a new line item.
pub struct NewLineItem {
    pub id: String,
    pub invoice_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub position: i64,
}

/// Insert a new invoice.
pub async fn insert<'e, E>(executor: E, invoice: &NewInvoice) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO invoices (id, organization_id, client_id, invoice_number, status, issued_on, created_at) VALUES (?, ?, ?, ?, ?, NULL, ?)",
    )
    .bind(&invoice.id)
    .bind(invoice.organization_id.as_str())
    .bind(&invoice.client_id)
    .bind(&invoice.invoice_number)
    .bind(invoice.status.to_string())
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// List invoices visible under the scope filter.
pub async fn list(pool: &sqlx::SqlitePool, scope: &ScopeFilter) -> Result<Vec<Invoice>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, client_id, invoice_number, status, issued_on, created_at FROM invoices WHERE ",
    );
    scope.push_predicate(&mut qb, "organization_id");
    qb.push(" ORDER BY created_at DESC, id DESC");
    qb.build_query_as::<Invoice>().fetch_all(pool).await
}

/// Find an invoice by ID within the scope filter.
pub async fn find_by_id(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
    id: &str,
) -> Result<Option<Invoice>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, organization_id, client_id, invoice_number, status, issued_on, created_at FROM invoices WHERE id = ",
    );
    qb.push_bind(id);
    qb.push(" AND ");
    scope.push_predicate(&mut qb, "organization_id");
    qb.build_query_as::<Invoice>().fetch_optional(pool).await
}

/// Find an invoice by ID with no scope applied. Used to derive a line
/// item's tenant and to guard writes; never feeds a response directly.
pub async fn find_by_id_any<'e, E>(executor: E, id: &str) -> Result<Option<Invoice>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Invoice>(
        "SELECT id, organization_id, client_id, invoice_number, status, issued_on, created_at FROM invoices WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Update an invoice's status. Marks issued_on the first time it leaves draft.
pub async fn update_status<'e, E>(
    executor: E,
    id: &str,
    status: InvoiceStatus,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "UPDATE invoices SET status = ?, issued_on = CASE WHEN ? != 'draft' AND issued_on IS NULL THEN ? ELSE issued_on END WHERE id = ?",
    )
    .bind(status.to_string())
    .bind(status.to_string())
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Delete an invoice row. Line items must be deleted first.
pub async fn delete<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM invoices WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete every invoice of an organization (cascade path).
pub async fn delete_for_org<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM invoices WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

/// Insert a new line item.
pub async fn insert_line_item<'e, E>(executor: E, item: &NewLineItem) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = OffsetDateTime::now_utc().unix_timestamp();
    sqlx::query(
        "INSERT INTO invoice_line_items (id, invoice_id, description, quantity, unit_price_cents, position, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.position)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Line items of one invoice, in position order. Callers must have already
/// established read access to the invoice itself.
pub async fn line_items_for_invoice<'e, E>(
    executor: E,
    invoice_id: &str,
) -> Result<Vec<LineItem>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, LineItem>(
        "SELECT id, invoice_id, description, quantity, unit_price_cents, position, created_at FROM invoice_line_items WHERE invoice_id = ? ORDER BY position ASC",
    )
    .bind(invoice_id)
    .fetch_all(executor)
    .await
}

/// List line items visible under the scope filter. The tenant predicate is
/// applied to the parent invoice via join, since line items store no tenant
/// of their own.
pub async fn list_line_items(
    pool: &sqlx::SqlitePool,
    scope: &ScopeFilter,
) -> Result<Vec<LineItem>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT li.id, li.invoice_id, li.description, li.quantity, li.unit_price_cents, li.position, li.created_at \
         FROM invoice_line_items li JOIN invoices i ON i.id = li.invoice_id WHERE ",
    );
    scope.push_predicate(&mut qb, "i.organization_id");
    qb.push(" ORDER BY li.invoice_id ASC, li.position ASC");
    qb.build_query_as::<LineItem>().fetch_all(pool).await
}

/// Number of line items on an invoice.
pub async fn count_line_items<'e, E>(executor: E, invoice_id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar("SELECT count(*) FROM invoice_line_items WHERE invoice_id = ?")
        .bind(invoice_id)
        .fetch_one(executor)
        .await
}

/// Delete one line item of an invoice.
pub async fn delete_line_item<'e, E>(
    executor: E,
    invoice_id: &str,
    item_id: &str,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM invoice_line_items WHERE id = ? AND invoice_id = ?")
        .bind(item_id)
        .bind(invoice_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete all line items of an invoice.
pub async fn delete_line_items_for_invoice<'e, E>(
    executor: E,
    invoice_id: &str,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = ?")
        .bind(invoice_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete every line item under an organization's invoices (cascade path).
pub async fn delete_line_items_for_org<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "DELETE FROM invoice_line_items WHERE invoice_id IN (SELECT id FROM invoices WHERE organization_id = ?)",
    )
    .bind(organization_id.as_str())
    .execute(executor)
    .await?;
    Ok(())
}
