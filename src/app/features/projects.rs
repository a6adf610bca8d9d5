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
        cascade,
        guard::{self, EntityKind, Operation},
        nested,
        scope::ScopeFilter,
    },
    session::CurrentIdentity,
    AppState,
};

use super::ListQuery;

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub organization_id: String,
    pub client_id: Option<String>,
    pub name: String,
    pub created_at: i64,
}

impl From<db::projects::Project> for ProjectResponse {
    fn from(row: db::projects::Project) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            client_id: row.client_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub client_id: Option<String>,
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// GET /api/projects — Projects visible to the actor.
pub async fn list(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let requested = super::parse_organization_id(query.organization_id.as_deref())?;
    let scope = ScopeFilter::for_read(&identity, requested.as_ref());
    let projects = db::projects::list(&state.db, &scope).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// GET /api/projects/:id — One project, if visible.
pub async fn show(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let scope = ScopeFilter::for_read(&identity, None);
    let project = db::projects::find_by_id(&state.db, &scope, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(project.into()))
}

/// POST /api/projects — Create a project. A linked client must belong to
/// the same organization.
pub async fn create(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let supplied = super::parse_organization_id(request.organization_id.as_deref())?;
    let organization_id = guard::resolve_target_organization(&identity, supplied)?;
    guard::authorize_mutation(
        &identity,
        EntityKind::Project,
        Operation::Create,
        Some(&organization_id),
    )?;

    if let Some(client_id) = &request.client_id {
        let client = db::clients::find_by_id_any(&state.db, client_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let client_org = super::parse_organization_id(Some(&client.organization_id))?
            .ok_or(AppError::Internal)?;
        nested::expect_same_tenant(Some(&client_org), &organization_id)?;
    }

    let new_project = db::projects::NewProject {
        id: ulid::Ulid::new().to_string(),
        organization_id,
        client_id: request.client_id,
        name: request.name,
    };
    db::projects::insert(&state.db, &new_project).await?;

    let project = db::projects::find_by_id_any(&state.db, &new_project.id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// PATCH /api/projects/:id — Rename a project.
pub async fn update(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let project = db::projects::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&project.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Project,
        Operation::Update,
        Some(&organization_id),
    )?;

    db::projects::update_name(&state.db, &id, &request.name).await?;
    let project = db::projects::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok(Json(project.into()))
}

/// DELETE /api/projects/:id — Delete a project with its tasks and
/// attachments (rows and stored files).
pub async fn remove(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let project = db::projects::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&project.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Project,
        Operation::Delete,
        Some(&organization_id),
    )?;

    cascade::delete_project(&state.db, state.files.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list).post(create))
        .route("/api/projects/:id", get(show).patch(update).delete(remove))
}
