use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use sqlx::SqlitePool;

/// Human-readable application name.
pub const APP_NAME: &str = "Clientdesk";

/// Shared state available to all handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub files: Arc<dyn storage::FileStore>,
    pub config: config::Config,
}

/// All application routes.
pub fn routes(_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .merge(features::auth::routes())
        .merge(features::organizations::routes())
        .merge(features::clients::routes())
        .merge(features::projects::routes())
        .merge(features::tasks::routes())
        .merge(features::invoices::routes())
        .merge(features::attachments::routes())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "name": APP_NAME, "status": "ok" }))
}

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod features;
pub mod identity;
pub mod policy;
pub mod session;
pub mod storage;
