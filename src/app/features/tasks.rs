use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::{
    db,
    error::AppError,
    policy::{
        guard::{self, EntityKind, Operation},
        nested,
        scope::ScopeFilter,
    },
    session::CurrentIdentity,
    AppState,
};

use super::ListQuery;

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub organization_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub done: bool,
    pub created_at: i64,
}

impl From<db::tasks::Task> for TaskResponse {
    fn from(row: db::tasks::Task) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            project_id: row.project_id,
            title: row.title,
            done: row.done,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub project_id: Option<String>,
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub done: bool,
}

/// GET /api/tasks — Tasks visible to the actor.
pub async fn list(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let requested = super::parse_organization_id(query.organization_id.as_deref())?;
    let scope = ScopeFilter::for_read(&identity, requested.as_ref());
    let tasks = db::tasks::list(&state.db, &scope).await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// GET /api/tasks/:id — One task, if visible.
pub async fn show(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, AppError> {
    let scope = ScopeFilter::for_read(&identity, None);
    let task = db::tasks::find_by_id(&state.db, &scope, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task.into()))
}

/// POST /api/tasks — Create a task, standalone or under a project.
///
/// With a project_id, the task's tenant is derived from the project; a
/// caller-declared organization that diverges is rejected before the write.
pub async fn create(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let declared = super::parse_organization_id(request.organization_id.as_deref())?;

    let organization_id = match &request.project_id {
        Some(project_id) => {
            let project = db::projects::find_by_id_any(&state.db, project_id)
                .await?
                .ok_or(AppError::NotFound)?;
            let parent_org = super::parse_organization_id(Some(&project.organization_id))?
                .ok_or(AppError::Internal)?;
            nested::expect_same_tenant(declared.as_ref(), &parent_org)?;
            parent_org
        }
        None => guard::resolve_target_organization(&identity, declared)?,
    };

    guard::authorize_mutation(
        &identity,
        EntityKind::Task,
        Operation::Create,
        Some(&organization_id),
    )?;

    let new_task = db::tasks::NewTask {
        id: ulid::Ulid::new().to_string(),
        organization_id,
        project_id: request.project_id,
        title: request.title,
    };
    db::tasks::insert(&state.db, &new_task).await?;

    let task = db::tasks::find_by_id_any(&state.db, &new_task.id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

/// PATCH /api/tasks/:id — Update title and done flag. Tasks cannot move
/// between projects or organizations.
pub async fn update(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let task = db::tasks::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&task.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Task,
        Operation::Update,
        Some(&organization_id),
    )?;

    db::tasks::update(&state.db, &id, &request.title, request.done).await?;
    let task = db::tasks::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok(Json(task.into()))
}

/// DELETE /api/tasks/:id — Delete a task.
pub async fn remove(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let task = db::tasks::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&task.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Task,
        Operation::Delete,
        Some(&organization_id),
    )?;

    db::tasks::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list).post(create))
        .route("/api/tasks/:id", get(show).patch(update).delete(remove))
}
