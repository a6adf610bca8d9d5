use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::{
    db,
    domain::{OrganizationId, OrganizationRole, Slug, UserId},
    error::AppError,
    policy::{
        cascade,
        guard::{self, EntityKind, Operation},
        scope::ScopeFilter,
    },
    session::CurrentIdentity,
    AppState,
};

use super::ListQuery;

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
}

impl From<db::organizations::Organization> for OrganizationResponse {
    fn from(row: db::organizations::Organization) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
    pub role: String,
}

/// GET /api/organizations — Organizations visible to the actor.
pub async fn list(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let requested = super::parse_organization_id(query.organization_id.as_deref())?;
    let scope = ScopeFilter::for_read(&identity, requested.as_ref());
    let organizations = db::organizations::list(&state.db, &scope).await?;
    Ok(Json(organizations.into_iter().map(Into::into).collect()))
}

/// GET /api/organizations/:id — One organization, if visible.
pub async fn show(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let organization_id = OrganizationId::from_string(&id).map_err(|_| AppError::NotFound)?;
    let scope = ScopeFilter::for_read(&identity, None);
    let organization = db::organizations::find_by_id(&state.db, &scope, &organization_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(organization.into()))
}

/// POST /api/organizations — Create an organization.
///
/// Superadmins create bare organizations (managed path). Anyone else takes
/// the self-service path: the organization is created with the caller as
/// its owner, in one transaction.
pub async fn create(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let slug = Slug::new(request.slug)
        .map_err(|e| AppError::Validation(e.message.map(|m| m.to_string()).unwrap_or_else(|| "Invalid slug".to_string())))?;

    let organization_id = OrganizationId::new();
    let new_organization = db::organizations::NewOrganization {
        id: organization_id.clone(),
        name: request.name,
        slug,
    };

    if identity.is_superadmin {
        guard::authorize_mutation(
            &identity,
            EntityKind::Organization,
            Operation::Create,
            Some(&organization_id),
        )?;
        db::organizations::insert(&state.db, &new_organization).await?;
    } else {
        guard::authorize_organization_bootstrap(&identity)?;
        let mut tx = state.db.begin().await?;
        db::organizations::insert(&mut *tx, &new_organization).await?;
        db::organizations::add_member(
            &mut *tx,
            &organization_id,
            &identity.user_id,
            OrganizationRole::Owner,
        )
        .await?;
        tx.commit().await?;
    }

    let organization = db::organizations::find_by_id_any(&state.db, &organization_id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(organization.into())))
}

/// PATCH /api/organizations/:id — Rename (superadmin or owner/admin).
pub async fn update(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let organization_id = OrganizationId::from_string(&id).map_err(|_| AppError::NotFound)?;

    db::organizations::find_by_id_any(&state.db, &organization_id)
        .await?
        .ok_or(AppError::NotFound)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Organization,
        Operation::Update,
        Some(&organization_id),
    )?;

    db::organizations::update_name(&state.db, &organization_id, &request.name).await?;
    let organization = db::organizations::find_by_id_any(&state.db, &organization_id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok(Json(organization.into()))
}

/// DELETE /api/organizations/:id — Superadmin only. Cascades to every
/// entity referencing the organization, including stored files.
pub async fn remove(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let organization_id = OrganizationId::from_string(&id).map_err(|_| AppError::NotFound)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Organization,
        Operation::Delete,
        Some(&organization_id),
    )?;

    db::organizations::find_by_id_any(&state.db, &organization_id)
        .await?
        .ok_or(AppError::NotFound)?;

    cascade::delete_organization(&state.db, state.files.as_ref(), &organization_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/organizations/:id/members — Add a user (superadmin or
/// owner/admin of the organization).
pub async fn add_member(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddMemberRequest>,
) -> Result<StatusCode, AppError> {
    let organization_id = OrganizationId::from_string(&id).map_err(|_| AppError::NotFound)?;
    let role = request
        .role
        .parse::<OrganizationRole>()
        .map_err(|_| AppError::Validation("Invalid role".to_string()))?;
    let user_id = UserId::from_string(&request.user_id)
        .map_err(|_| AppError::Validation("Invalid user id".to_string()))?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Membership,
        Operation::Create,
        Some(&organization_id),
    )?;

    db::organizations::find_by_id_any(&state.db, &organization_id)
        .await?
        .ok_or(AppError::NotFound)?;
    db::users::find_by_id(&state.db, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if db::organizations::is_member(&state.db, &organization_id, &user_id).await? {
        return Err(AppError::Validation(
            "That user is already a member of this organization".to_string(),
        ));
    }

    db::organizations::add_member(&state.db, &organization_id, &user_id, role).await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/organizations/:id/members/:user_id — Remove a membership.
/// The user account itself is untouched.
pub async fn remove_member(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path((id, member_user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let organization_id = OrganizationId::from_string(&id).map_err(|_| AppError::NotFound)?;
    let user_id = UserId::from_string(&member_user_id).map_err(|_| AppError::NotFound)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Membership,
        Operation::Delete,
        Some(&organization_id),
    )?;

    if !db::organizations::is_member(&state.db, &organization_id, &user_id).await? {
        return Err(AppError::NotFound);
    }

    db::organizations::remove_member(&state.db, &organization_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/organizations", get(list).post(create))
        .route(
            "/api/organizations/:id",
            get(show).patch(update).delete(remove),
        )
        .route("/api/organizations/:id/members", post(add_member))
        .route(
            "/api/organizations/:id/members/:user_id",
            delete(remove_member),
        )
}
