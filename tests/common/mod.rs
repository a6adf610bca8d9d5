#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use clientdesk::app::storage::MemoryFileStore;
use clientdesk::create_router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Router backed by an in-memory file store. The store handle is returned
/// so tests can inspect what files survive a cascade.
pub fn test_router(pool: SqlitePool) -> (axum::Router, Arc<MemoryFileStore>) {
    let files = Arc::new(MemoryFileStore::new());
    let state = clientdesk::app::AppState {
        db: pool,
        files: files.clone(),
        config: clientdesk::app::config::Config::for_tests(),
    };
    (create_router(state), files)
}

pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> http::Request<Body> {
    let mut builder = http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn bare_request(method: &str, uri: &str, cookie: Option<&str>) -> http::Request<Body> {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: http::Response<axum::body::Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn extract_session_id_from_cookie(set_cookie_header: &str) -> Option<&str> {
    set_cookie_header.split(';').next()?.strip_prefix("session_id=")
}

/// Create a user directly in the database, returning its id.
pub async fn create_user(pool: &SqlitePool, email: &str, password: &str) -> String {
    use clientdesk::app::db;
    use clientdesk::app::domain::{Email, HashedPassword, Password, UserId};

    let email_type = Email::new(email.to_string()).unwrap();
    let password_type = Password::new(password.to_string()).unwrap();
    let password_hash = HashedPassword::from_password(&password_type).unwrap();
    let user_id = UserId::new();

    let new_user = db::users::NewUser {
        id: user_id.clone(),
        email: email_type,
        password_hash,
    };
    db::users::insert(pool, &new_user).await.unwrap();
    user_id.as_str()
}

/// Log in an existing user and return a cookie header for later requests.
pub async fn login_cookie(app: &axum::Router, email: &str, password: &str) -> String {
    let request = json_request(
        "POST",
        "/login",
        None,
        serde_json::json!({ "email": email, "password": password }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap();
    let session_id = extract_session_id_from_cookie(set_cookie).unwrap();
    format!("session_id={}", session_id)
}

/// Create a user, log in, return (user_id, cookie).
pub async fn authenticated_user(
    pool: &SqlitePool,
    app: &axum::Router,
    email: &str,
    password: &str,
) -> (String, String) {
    let user_id = create_user(pool, email, password).await;
    let cookie = login_cookie(app, email, password).await;
    (user_id, cookie)
}

/// Create a superadmin user, log in, return (user_id, cookie).
pub async fn authenticated_superadmin(
    pool: &SqlitePool,
    app: &axum::Router,
    email: &str,
    password: &str,
) -> (String, String) {
    use clientdesk::app::db;
    use clientdesk::app::domain::UserId;

    let user_id = create_user(pool, email, password).await;
    let typed = UserId::from_string(&user_id).unwrap();
    db::users::grant_superadmin(pool, &typed).await.unwrap();
    let cookie = login_cookie(app, email, password).await;
    (user_id, cookie)
}

/// Create an organization directly in the database, returning its id.
pub async fn create_organization(pool: &SqlitePool, name: &str, slug: &str) -> String {
    use clientdesk::app::db;
    use clientdesk::app::domain::{OrganizationId, Slug};

    let organization_id = OrganizationId::new();
    let new_organization = db::organizations::NewOrganization {
        id: organization_id.clone(),
        name: name.to_string(),
        slug: Slug::new(slug.to_string()).unwrap(),
    };
    db::organizations::insert(pool, &new_organization)
        .await
        .unwrap();
    organization_id.as_str()
}

/// Add a membership directly in the database.
pub async fn add_member(pool: &SqlitePool, organization_id: &str, user_id: &str, role: &str) {
    use clientdesk::app::db;
    use clientdesk::app::domain::{OrganizationId, OrganizationRole, UserId};

    let organization_id = OrganizationId::from_string(organization_id).unwrap();
    let user_id = UserId::from_string(user_id).unwrap();
    let role = role.parse::<OrganizationRole>().unwrap();
    db::organizations::add_member(pool, &organization_id, &user_id, role)
        .await
        .unwrap();
}
