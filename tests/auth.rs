use tower::ServiceExt;

mod common;

use crate::common::*;

#[tokio::test]
async fn signup_creates_account_and_session() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool);

    let request = json_request(
        "POST",
        "/signup",
        None,
        serde_json::json!({ "email": "new@example.com", "password": "Password123" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(extract_session_id_from_cookie(&set_cookie).is_some());

    let body = body_json(response).await;
    assert!(body["user_id"].is_string());
}

#[tokio::test]
async fn signup_rejects_weak_password() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool);

    let request = json_request(
        "POST",
        "/signup",
        None,
        serde_json::json!({ "email": "weak@example.com", "password": "password" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool.clone());
    create_user(&pool, "taken@example.com", "Password123").await;

    let request = json_request(
        "POST",
        "/signup",
        None,
        serde_json::json!({ "email": "taken@example.com", "password": "Password456" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_with_wrong_password_gets_generic_message() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool.clone());
    create_user(&pool, "login@example.com", "Password123").await;

    let request = json_request(
        "POST",
        "/login",
        None,
        serde_json::json!({ "email": "login@example.com", "password": "WrongPassword1" }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid email or password");

    // Unknown account gets the same body; no way to probe which emails exist.
    let request = json_request(
        "POST",
        "/login",
        None,
        serde_json::json!({ "email": "nobody@example.com", "password": "WrongPassword1" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn api_requests_without_session_are_401() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool);

    for uri in [
        "/api/organizations",
        "/api/clients",
        "/api/projects",
        "/api/tasks",
        "/api/invoices",
        "/api/attachments",
    ] {
        let response = app
            .clone()
            .oneshot(bare_request("GET", uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["code"], "unauthenticated");
    }
}

#[tokio::test]
async fn stale_session_cookie_is_401() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool);

    let response = app
        .oneshot(bare_request(
            "GET",
            "/api/clients",
            Some("session_id=not-a-real-session"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool.clone());
    let (_user_id, cookie) = authenticated_user(&pool, &app, "out@example.com", "Password123").await;

    let response = app
        .clone()
        .oneshot(bare_request("POST", "/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::NO_CONTENT);

    // The session row is gone; the old cookie resolves to no identity.
    let response = app
        .oneshot(bare_request("GET", "/api/clients", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_without_memberships_sees_empty_lists() {
    let pool = test_pool().await;
    let (app, _files) = test_router(pool.clone());

    // Another tenant has data.
    let org = create_organization(&pool, "Acme", "acme").await;
    let owner = create_user(&pool, "owner@example.com", "Password123").await;
    add_member(&pool, &org, &owner, "owner").await;

    let (_user_id, cookie) =
        authenticated_user(&pool, &app, "fresh@example.com", "Password123").await;

    for uri in ["/api/organizations", "/api/clients", "/api/projects", "/api/tasks", "/api/invoices"] {
        let response = app
            .clone()
            .oneshot(bare_request("GET", uri, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::OK, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!([]), "{uri}");
    }
}
