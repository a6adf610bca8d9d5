//! Parent deletion cascades.
//!
//! Row deletion happens in one transaction; stored-file cleanup follows.
//! When rows are gone but a file removal fails, the operation reports
//! `PartialCascade` for manual reconciliation instead of pretending the
//! delete fully succeeded. Authorization for the cascade is implied by the
//! parent-delete decision; callers must have run the mutation guard first.

use sqlx::SqlitePool;

use crate::app::{db, domain::OrganizationId, error::AppError, storage::FileStore};

/// Delete an organization and everything referencing it: line items,
/// invoices, attachments (rows and files), tasks, projects, clients,
/// memberships, then the organization row itself.
pub async fn delete_organization(
    pool: &SqlitePool,
    files: &dyn FileStore,
    organization_id: &OrganizationId,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    // Snapshot inside the transaction so every row deleted below has its
    // stored file accounted for.
    let attachments = db::attachments::list_for_org(&mut *tx, organization_id).await?;
    db::invoices::delete_line_items_for_org(&mut *tx, organization_id).await?;
    db::invoices::delete_for_org(&mut *tx, organization_id).await?;
    db::attachments::delete_for_org(&mut *tx, organization_id).await?;
    db::tasks::delete_for_org(&mut *tx, organization_id).await?;
    db::projects::delete_for_org(&mut *tx, organization_id).await?;
    db::clients::delete_for_org(&mut *tx, organization_id).await?;
    db::organizations::remove_all_members(&mut *tx, organization_id).await?;
    db::organizations::delete(&mut *tx, organization_id).await?;
    tx.commit().await?;

    remove_files(files, &attachments).await
}

/// Delete a project together with its tasks and attachments (rows and
/// files). Sibling entities of the organization are untouched.
pub async fn delete_project(
    pool: &SqlitePool,
    files: &dyn FileStore,
    project_id: &str,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let attachments = db::attachments::list_for_project(&mut *tx, project_id).await?;
    db::attachments::delete_for_project(&mut *tx, project_id).await?;
    db::tasks::delete_for_project(&mut *tx, project_id).await?;
    db::projects::delete(&mut *tx, project_id).await?;
    tx.commit().await?;

    remove_files(files, &attachments).await
}

async fn remove_files(
    files: &dyn FileStore,
    attachments: &[db::attachments::Attachment],
) -> Result<(), AppError> {
    let mut failed = Vec::new();
    for attachment in attachments {
        if let Err(err) = files.remove(&attachment.storage_path).await {
            tracing::error!(path = %attachment.storage_path, %err, "cascade file removal failed");
            failed.push(attachment.storage_path.clone());
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(AppError::PartialCascade(format!(
            "{} stored file(s) left behind: {}",
            failed.len(),
            failed.join(", ")
        )))
    }
}
