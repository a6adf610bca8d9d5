use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::Error as SqlxError;

/// Application error type for unified error handling across the app.
///
/// Policy rejections carry stable `code` strings in the response body so the
/// UI can react to them. Cross-tenant writes are deliberately surfaced with
/// the same generic `forbidden` body as role failures: the response must not
/// reveal whether the target row exists.
#[derive(Debug)]
pub enum AppError {
    /// No valid session (401). Surfaced as "please sign in".
    Unauthenticated,

    /// Actor lacks the required role within their own organization (403).
    Forbidden,

    /// Actor attempted a write into a tenant outside their memberships (403).
    /// Distinct variant for tests and logs, but indistinguishable from
    /// `Forbidden` on the wire.
    CrossTenantWrite,

    /// A nested entity's declared tenant conflicts with its parent's (422).
    TenantMismatch,

    /// A write arrived with no resolvable organization (422).
    MissingTenantContext,

    /// Rows were deleted but dependent stored files were not (500).
    /// Reported for manual reconciliation, never silently swallowed.
    PartialCascade(String),

    /// Invalid input data (400).
    Validation(String),

    /// Row not found, or outside the actor's read scope (404).
    NotFound,

    /// Database errors (500).
    Database(SqlxError),

    /// Generic internal errors (500).
    Internal,
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Please sign in".to_string(),
            ),
            AppError::Forbidden | AppError::CrossTenantWrite => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Forbidden".to_string(),
            ),
            AppError::TenantMismatch => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "tenant_mismatch",
                "Entity does not belong to the parent's organization".to_string(),
            ),
            AppError::MissingTenantContext => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "missing_tenant_context",
                "Select an organization first".to_string(),
            ),
            AppError::PartialCascade(detail) => {
                tracing::error!(%detail, "cascade left stored files behind");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial_cascade",
                    "Deletion completed but file cleanup failed".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_string()),
            AppError::Database(err) => {
                tracing::error!(%err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
