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
        scope::ScopeFilter,
    },
    session::CurrentIdentity,
    AppState,
};

use super::ListQuery;

#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: i64,
}

impl From<db::clients::Client> for ClientResponse {
    fn from(row: db::clients::Client) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 254))]
    pub email: Option<String>,
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 254))]
    pub email: Option<String>,
}

/// GET /api/clients — Clients visible to the actor, optionally narrowed to
/// one organization.
pub async fn list(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let requested = super::parse_organization_id(query.organization_id.as_deref())?;
    let scope = ScopeFilter::for_read(&identity, requested.as_ref());
    let clients = db::clients::list(&state.db, &scope).await?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

/// GET /api/clients/:id — One client, if visible. Clients outside the
/// actor's scope are indistinguishable from missing ones.
pub async fn show(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClientResponse>, AppError> {
    let scope = ScopeFilter::for_read(&identity, None);
    let client = db::clients::find_by_id(&state.db, &scope, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(client.into()))
}

/// POST /api/clients — Create a client in the target organization.
pub async fn create(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientResponse>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let supplied = super::parse_organization_id(request.organization_id.as_deref())?;
    let organization_id = guard::resolve_target_organization(&identity, supplied)?;
    guard::authorize_mutation(
        &identity,
        EntityKind::Client,
        Operation::Create,
        Some(&organization_id),
    )?;

    let new_client = db::clients::NewClient {
        id: ulid::Ulid::new().to_string(),
        organization_id,
        name: request.name,
        email: request.email,
    };
    db::clients::insert(&state.db, &new_client).await?;

    let client = db::clients::find_by_id_any(&state.db, &new_client.id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(client.into())))
}

/// PATCH /api/clients/:id — Update name/email.
pub async fn update(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let client = db::clients::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&client.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Client,
        Operation::Update,
        Some(&organization_id),
    )?;

    db::clients::update(&state.db, &id, &request.name, request.email.as_deref()).await?;
    let client = db::clients::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok(Json(client.into()))
}

/// DELETE /api/clients/:id — Delete a client.
pub async fn remove(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let client = db::clients::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&client.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Client,
        Operation::Delete,
        Some(&organization_id),
    )?;

    db::clients::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list).post(create))
        .route("/api/clients/:id", get(show).patch(update).delete(remove))
}
