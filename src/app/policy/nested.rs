//! Parent-child tenant consistency.
//!
//! Nested entities (invoice line items, project-scoped tasks and
//! attachments) never choose their own tenant: it is derived from the
//! parent, and any caller-declared tenant that diverges is rejected before
//! the write reaches storage.

use crate::app::domain::OrganizationId;
use crate::app::error::AppError;

/// Storage scope for an attachment: under a project or under a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentScope {
    Project,
    Task,
}

impl AttachmentScope {
    /// Path segment distinguishing project- and task-scoped files, so two
    /// attachments sharing a filename can never collide.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Task => "tasks",
        }
    }
}

/// Reject a caller-declared tenant that diverges from the parent's. A
/// missing declaration is fine: the parent's tenant is used.
pub fn expect_same_tenant(
    declared: Option<&OrganizationId>,
    parent: &OrganizationId,
) -> Result<(), AppError> {
    match declared {
        Some(organization_id) if organization_id != parent => Err(AppError::TenantMismatch),
        _ => Ok(()),
    }
}

/// Derive the storage path for an attachment's file:
/// `{organization_id}/{projects|tasks}/{entity_id}/{file_name}`.
///
/// The organization id comes first so one tenant's file listing can never
/// enumerate another tenant's prefix.
pub fn storage_path(
    organization_id: &OrganizationId,
    scope: AttachmentScope,
    entity_id: &str,
    file_name: &str,
) -> String {
    format!(
        "{}/{}/{}/{}",
        organization_id.as_str(),
        scope.segment(),
        entity_id,
        file_name
    )
}

/// Validate an uploaded file name before it becomes a path segment.
pub fn check_file_name(file_name: &str) -> Result<(), AppError> {
    if file_name.is_empty() || file_name.len() > 255 {
        return Err(AppError::Validation("File name must be 1–255 characters".to_string()));
    }
    if file_name.contains('/') || file_name.contains('\\') || file_name == "." || file_name == ".." {
        return Err(AppError::Validation("Invalid file name".to_string()));
    }
    Ok(())
}
