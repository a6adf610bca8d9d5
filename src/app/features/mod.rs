pub mod attachments;
pub mod auth;
pub mod clients;
pub mod invoices;
pub mod organizations;
pub mod projects;
pub mod tasks;

use serde::Deserialize;

use crate::app::{domain::OrganizationId, error::AppError};

/// Query parameters shared by list endpoints: an optional organization to
/// narrow the read scope to (never to widen it).
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub organization_id: Option<String>,
}

/// Parse an optional organization id from a query string or payload.
/// Malformed ids are a validation error, not a lookup miss.
pub fn parse_organization_id(value: Option<&str>) -> Result<Option<OrganizationId>, AppError> {
    value
        .map(OrganizationId::from_string)
        .transpose()
        .map_err(|_| AppError::Validation("Invalid organization id".to_string()))
}
