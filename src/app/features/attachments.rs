use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::app::{
    db,
    error::AppError,
    policy::{
        guard::{self, EntityKind, Operation},
        nested::{self, AttachmentScope},
        scope::ScopeFilter,
    },
    session::CurrentIdentity,
    AppState,
};

use super::ListQuery;

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: String,
    pub organization_id: String,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub file_name: String,
    pub storage_path: String,
    pub byte_size: i64,
    pub created_at: i64,
}

impl From<db::attachments::Attachment> for AttachmentResponse {
    fn from(row: db::attachments::Attachment) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            project_id: row.project_id,
            task_id: row.task_id,
            file_name: row.file_name,
            storage_path: row.storage_path,
            byte_size: row.byte_size,
            created_at: row.created_at,
        }
    }
}

/// GET /api/attachments — Attachment metadata visible to the actor.
pub async fn list(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AttachmentResponse>>, AppError> {
    let requested = super::parse_organization_id(query.organization_id.as_deref())?;
    let scope = ScopeFilter::for_read(&identity, requested.as_ref());
    let attachments = db::attachments::list(&state.db, &scope).await?;
    Ok(Json(attachments.into_iter().map(Into::into).collect()))
}

/// GET /api/attachments/:id/content — Raw file bytes, if visible.
pub async fn content(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let scope = ScopeFilter::for_read(&identity, None);
    let attachment = db::attachments::find_by_id(&state.db, &scope, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let bytes = state
        .files
        .get(&attachment.storage_path)
        .await
        .map_err(|_| AppError::Internal)?
        .ok_or(AppError::NotFound)?;
    Ok(Bytes::from(bytes).into_response())
}

/// POST /api/projects/:id/attachments/:file_name — Upload a file under a
/// project. The request body is the file content.
pub async fn upload_for_project(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path((project_id, file_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<AttachmentResponse>), AppError> {
    nested::check_file_name(&file_name)?;

    let project = db::projects::find_by_id_any(&state.db, &project_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&project.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Attachment,
        Operation::Create,
        Some(&organization_id),
    )?;

    store(
        &state,
        AttachmentScope::Project,
        organization_id,
        &project_id,
        file_name,
        body,
    )
    .await
}

/// POST /api/tasks/:id/attachments/:file_name — Upload a file under a task.
pub async fn upload_for_task(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path((task_id, file_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<AttachmentResponse>), AppError> {
    nested::check_file_name(&file_name)?;

    let task = db::tasks::find_by_id_any(&state.db, &task_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&task.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Attachment,
        Operation::Create,
        Some(&organization_id),
    )?;

    store(
        &state,
        AttachmentScope::Task,
        organization_id,
        &task_id,
        file_name,
        body,
    )
    .await
}

/// Write the file, then record the row. The storage path is derived from
/// the parent's tenant; the caller never chooses it.
async fn store(
    state: &AppState,
    attachment_scope: AttachmentScope,
    organization_id: crate::app::domain::OrganizationId,
    entity_id: &str,
    file_name: String,
    body: Bytes,
) -> Result<(StatusCode, Json<AttachmentResponse>), AppError> {
    let storage_path = nested::storage_path(&organization_id, attachment_scope, entity_id, &file_name);

    state
        .files
        .put(&storage_path, &body)
        .await
        .map_err(|_| AppError::Internal)?;

    let (project_id, task_id) = match attachment_scope {
        AttachmentScope::Project => (Some(entity_id.to_string()), None),
        AttachmentScope::Task => (None, Some(entity_id.to_string())),
    };
    let new_attachment = db::attachments::NewAttachment {
        id: ulid::Ulid::new().to_string(),
        organization_id,
        project_id,
        task_id,
        byte_size: body.len() as i64,
        file_name,
        storage_path,
    };
    db::attachments::insert(&state.db, &new_attachment).await?;

    let attachment = db::attachments::find_by_id_any(&state.db, &new_attachment.id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(attachment.into())))
}

/// DELETE /api/attachments/:id — Remove the row and the stored file. Row
/// gone but file left behind is reported as a partial cascade.
pub async fn remove(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let attachment = db::attachments::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&attachment.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Attachment,
        Operation::Delete,
        Some(&organization_id),
    )?;

    db::attachments::delete(&state.db, &id).await?;
    if state.files.remove(&attachment.storage_path).await.is_err() {
        return Err(AppError::PartialCascade(format!(
            "1 stored file(s) left behind: {}",
            attachment.storage_path
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/attachments", get(list))
        .route("/api/attachments/:id", axum::routing::delete(remove))
        .route("/api/attachments/:id/content", get(content))
        .route("/api/projects/:id/attachments/:file_name", post(upload_for_project))
        .route("/api/tasks/:id/attachments/:file_name", post(upload_for_task))
}
