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
    domain::InvoiceStatus,
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
pub struct LineItemResponse {
    pub id: String,
    pub invoice_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub position: i64,
}

impl From<db::invoices::LineItem> for LineItemResponse {
    fn from(row: db::invoices::LineItem) -> Self {
        Self {
            id: row.id,
            invoice_id: row.invoice_id,
            description: row.description,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            position: row.position,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub organization_id: String,
    pub client_id: Option<String>,
    pub invoice_number: String,
    pub status: String,
    pub issued_on: Option<i64>,
    pub created_at: i64,
    pub total_cents: i64,
    pub line_items: Vec<LineItemResponse>,
}

impl InvoiceResponse {
    fn from_parts(invoice: db::invoices::Invoice, items: Vec<db::invoices::LineItem>) -> Self {
        // Bounds on new line items keep this well inside i64, but rows
        // written before those bounds existed must not panic a read path.
        let total_cents = items
            .iter()
            .map(|i| i.quantity.saturating_mul(i.unit_price_cents))
            .fold(0i64, i64::saturating_add);
        Self {
            id: invoice.id,
            organization_id: invoice.organization_id,
            client_id: invoice.client_id,
            invoice_number: invoice.invoice_number,
            status: invoice.status,
            issued_on: invoice.issued_on,
            created_at: invoice.created_at,
            total_cents,
            line_items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LineItemRequest {
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i64,
    #[validate(range(min = 0i64, max = 1_000_000_000_000i64))]
    pub unit_price_cents: i64,
    /// Optional declared tenant. Must match the invoice's organization when
    /// present; a divergent value is rejected before the write.
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    /// Supplied by the external numbering service; stored, not generated.
    #[validate(length(min = 1, max = 64))]
    pub invoice_number: String,
    pub client_id: Option<String>,
    pub organization_id: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub status: String,
}

/// GET /api/invoices — Invoices visible to the actor, with line items.
pub async fn list(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let requested = super::parse_organization_id(query.organization_id.as_deref())?;
    let scope = ScopeFilter::for_read(&identity, requested.as_ref());

    let invoices = db::invoices::list(&state.db, &scope).await?;
    // One scoped pass over the items; their tenant comes from the parent
    // invoice via join.
    let mut items_by_invoice: std::collections::HashMap<String, Vec<db::invoices::LineItem>> =
        std::collections::HashMap::new();
    for item in db::invoices::list_line_items(&state.db, &scope).await? {
        items_by_invoice
            .entry(item.invoice_id.clone())
            .or_default()
            .push(item);
    }

    let responses = invoices
        .into_iter()
        .map(|invoice| {
            let items = items_by_invoice.remove(&invoice.id).unwrap_or_default();
            InvoiceResponse::from_parts(invoice, items)
        })
        .collect();
    Ok(Json(responses))
}

/// GET /api/invoices/:id — One invoice with its line items, if visible.
pub async fn show(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let scope = ScopeFilter::for_read(&identity, None);
    let invoice = db::invoices::find_by_id(&state.db, &scope, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let items = db::invoices::line_items_for_invoice(&state.db, &invoice.id).await?;
    Ok(Json(InvoiceResponse::from_parts(invoice, items)))
}

/// POST /api/invoices — Create an invoice and its line items in one
/// transaction.
pub async fn create(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let supplied = super::parse_organization_id(request.organization_id.as_deref())?;
    let organization_id = guard::resolve_target_organization(&identity, supplied)?;
    guard::authorize_mutation(
        &identity,
        EntityKind::Invoice,
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

    // Declared tenants on inline items must agree with the invoice's before
    // anything is written.
    for item in &request.line_items {
        let declared = super::parse_organization_id(item.organization_id.as_deref())?;
        nested::expect_same_tenant(declared.as_ref(), &organization_id)?;
    }

    let invoice_id = ulid::Ulid::new().to_string();
    let new_invoice = db::invoices::NewInvoice {
        id: invoice_id.clone(),
        organization_id,
        client_id: request.client_id,
        invoice_number: request.invoice_number,
        status: InvoiceStatus::Draft,
    };

    let mut tx = state.db.begin().await?;
    db::invoices::insert(&mut *tx, &new_invoice).await?;
    for (position, item) in request.line_items.iter().enumerate() {
        let new_item = db::invoices::NewLineItem {
            id: ulid::Ulid::new().to_string(),
            invoice_id: invoice_id.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            position: position as i64,
        };
        db::invoices::insert_line_item(&mut *tx, &new_item).await?;
    }
    tx.commit().await?;

    let invoice = db::invoices::find_by_id_any(&state.db, &invoice_id)
        .await?
        .ok_or(AppError::Internal)?;
    let items = db::invoices::line_items_for_invoice(&state.db, &invoice_id).await?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from_parts(invoice, items))))
}

/// PATCH /api/invoices/:id — Update status.
pub async fn update(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let status = request
        .status
        .parse::<InvoiceStatus>()
        .map_err(|_| AppError::Validation("Invalid status".to_string()))?;

    let invoice = db::invoices::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&invoice.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Invoice,
        Operation::Update,
        Some(&organization_id),
    )?;

    db::invoices::update_status(&state.db, &id, status).await?;
    let invoice = db::invoices::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::Internal)?;
    let items = db::invoices::line_items_for_invoice(&state.db, &id).await?;
    Ok(Json(InvoiceResponse::from_parts(invoice, items)))
}

/// DELETE /api/invoices/:id — Delete an invoice and its line items.
pub async fn remove(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let invoice = db::invoices::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&invoice.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Invoice,
        Operation::Delete,
        Some(&organization_id),
    )?;

    let mut tx = state.db.begin().await?;
    db::invoices::delete_line_items_for_invoice(&mut *tx, &id).await?;
    db::invoices::delete(&mut *tx, &id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/invoices/:id/line-items — Append a line item. The item's
/// tenant is the invoice's tenant, derived, never caller-chosen.
pub async fn add_line_item(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LineItemRequest>,
) -> Result<(StatusCode, Json<LineItemResponse>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let invoice = db::invoices::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&invoice.organization_id))?
        .ok_or(AppError::Internal)?;

    let declared = super::parse_organization_id(request.organization_id.as_deref())?;
    nested::expect_same_tenant(declared.as_ref(), &organization_id)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Invoice,
        Operation::Update,
        Some(&organization_id),
    )?;

    let position = db::invoices::count_line_items(&state.db, &id).await?;
    let new_item = db::invoices::NewLineItem {
        id: ulid::Ulid::new().to_string(),
        invoice_id: id.clone(),
        description: request.description,
        quantity: request.quantity,
        unit_price_cents: request.unit_price_cents,
        position,
    };
    db::invoices::insert_line_item(&state.db, &new_item).await?;

    let items = db::invoices::line_items_for_invoice(&state.db, &id).await?;
    let created = items
        .into_iter()
        .find(|item| item.id == new_item.id)
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// DELETE /api/invoices/:id/line-items/:item_id — Remove a line item.
pub async fn remove_line_item(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let invoice = db::invoices::find_by_id_any(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let organization_id = super::parse_organization_id(Some(&invoice.organization_id))?
        .ok_or(AppError::Internal)?;

    guard::authorize_mutation(
        &identity,
        EntityKind::Invoice,
        Operation::Update,
        Some(&organization_id),
    )?;

    if !db::invoices::delete_line_item(&state.db, &id, &item_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list).post(create))
        .route("/api/invoices/:id", get(show).patch(update).delete(remove))
        .route("/api/invoices/:id/line-items", post(add_line_item))
        .route(
            "/api/invoices/:id/line-items/:item_id",
            delete(remove_line_item),
        )
}
