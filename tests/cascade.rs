use axum::body::Body;
use clientdesk::app::storage::FileStore;
use tower::ServiceExt;

mod common;

use crate::common::*;

async fn seed_org_with_owner(
    pool: &sqlx::SqlitePool,
    app: &axum::Router,
    name: &str,
    slug: &str,
    email: &str,
) -> (String, String, String) {
    let org = create_organization(pool, name, slug).await;
    let (user_id, cookie) = authenticated_user(pool, app, email, "Password123").await;
    add_member(pool, &org, &user_id, "owner").await;
    (org, user_id, cookie)
}

fn upload_request(uri: &str, cookie: &str, content: &[u8]) -> http::Request<Body> {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::from(content.to_vec()))
        .unwrap()
}

async fn create_entity(
    app: &axum::Router,
    cookie: &str,
    uri: &str,
    body: serde_json::Value,
) -> String {
    let response = app
        .clone()
        .oneshot(json_request("POST", uri, Some(cookie), body))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED, "{uri}");
    body_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn uploads_land_under_the_tenant_prefix() {
    let pool = test_pool().await;
    let (app, files) = test_router(pool.clone());
    let (org, _user, cookie) =
        seed_org_with_owner(&pool, &app, "Acme", "acme", "a@example.com").await;

    let project = create_entity(
        &app,
        &cookie,
        "/api/projects",
        serde_json::json!({ "name": "Website" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(upload_request(
            &format!("/api/projects/{project}/attachments/brief.pdf"),
            &cookie,
            b"fake pdf bytes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(
        body["storage_path"],
        format!("{org}/projects/{project}/brief.pdf")
    );
    assert_eq!(body["byte_size"], 14);

    let stored = files.list_prefix(&org).await.unwrap();
    assert_eq!(stored, vec![format!("{org}/projects/{project}/brief.pdf")]);

    // Content comes back through the scoped read.
    let id = body["id"].as_str().unwrap();
    let response = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/attachments/{id}/content"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    assert_eq!(&bytes[..], b"fake pdf bytes");
}

#[tokio::test]
async fn traversal_file_names_are_rejected() {
    let pool = test_pool().await;
    let (app, files) = test_router(pool.clone());
    let (_org, _user, cookie) =
        seed_org_with_owner(&pool, &app, "Acme", "acme", "a@example.com").await;

    let project = create_entity(
        &app,
        &cookie,
        "/api/projects",
        serde_json::json!({ "name": "Website" }),
    )
    .await;

    for file_name in ["..", "."] {
        let response = app
            .clone()
            .oneshot(upload_request(
                &format!("/api/projects/{project}/attachments/{file_name}"),
                &cookie,
                b"nope",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST, "{file_name}");
    }
    assert!(files.list_prefix("").await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_attachment_removes_row_and_file() {
    let pool = test_pool().await;
    let (app, files) = test_router(pool.clone());
    let (org, _user, cookie) =
        seed_org_with_owner(&pool, &app, "Acme", "acme", "a@example.com").await;

    let task = create_entity(
        &app,
        &cookie,
        "/api/tasks",
        serde_json::json!({ "title": "Review" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(upload_request(
            &format!("/api/tasks/{task}/attachments/notes.txt"),
            &cookie,
            b"notes",
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let id = body["id"].as_str().unwrap();
    assert_eq!(body["storage_path"], format!("{org}/tasks/{task}/notes.txt"));

    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/attachments/{id}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::NO_CONTENT);
    assert!(files.list_prefix(&org).await.unwrap().is_empty());

    let response = app
        .oneshot(bare_request("GET", "/api/attachments", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn organization_delete_cascades_every_row_and_file() {
    let pool = test_pool().await;
    let (app, files) = test_router(pool.clone());
    let (org, _user, cookie) =
        seed_org_with_owner(&pool, &app, "Acme", "acme", "a@example.com").await;

    // A second tenant that must be untouched by the cascade.
    let (other_org, _other_user, other_cookie) =
        seed_org_with_owner(&pool, &app, "Globex", "globex", "b@example.com").await;
    let other_client = create_entity(
        &app,
        &other_cookie,
        "/api/clients",
        serde_json::json!({ "name": "Survivor" }),
    )
    .await;

    let client = create_entity(
        &app,
        &cookie,
        "/api/clients",
        serde_json::json!({ "name": "Acme Client" }),
    )
    .await;
    let project = create_entity(
        &app,
        &cookie,
        "/api/projects",
        serde_json::json!({ "name": "Website", "client_id": client }),
    )
    .await;
    let task = create_entity(
        &app,
        &cookie,
        "/api/tasks",
        serde_json::json!({ "title": "Build", "project_id": project }),
    )
    .await;
    create_entity(
        &app,
        &cookie,
        "/api/invoices",
        serde_json::json!({
            "invoice_number": "INV-0001",
            "client_id": client,
            "line_items": [{ "description": "Work", "quantity": 1, "unit_price_cents": 100 }],
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(upload_request(
            &format!("/api/projects/{project}/attachments/brief.pdf"),
            &cookie,
            b"brief",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED);
    let response = app
        .clone()
        .oneshot(upload_request(
            &format!("/api/tasks/{task}/attachments/notes.txt"),
            &cookie,
            b"notes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED);

    let (_id, root) = authenticated_superadmin(&pool, &app, "root@example.com", "Password123").await;
    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/organizations/{org}"),
            Some(&root),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::NO_CONTENT);

    // No surviving rows reference the organization, in any table.
    for table in [
        "clients",
        "projects",
        "tasks",
        "invoices",
        "attachments",
        "organization_members",
    ] {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE organization_id = ?"))
                .bind(&org)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0, "{table}");
    }
    let orphaned_items: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM invoice_line_items WHERE invoice_id NOT IN (SELECT id FROM invoices)",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(orphaned_items, 0);

    // Stored files under the tenant prefix are gone too.
    assert!(files.list_prefix(&org).await.unwrap().is_empty());

    // The other tenant is intact.
    let response = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/clients/{other_client}"),
            Some(&other_cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE id = ?")
        .bind(&other_org)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn project_delete_cascades_tasks_and_attachments() {
    let pool = test_pool().await;
    let (app, files) = test_router(pool.clone());
    let (org, _user, cookie) =
        seed_org_with_owner(&pool, &app, "Acme", "acme", "a@example.com").await;

    let project = create_entity(
        &app,
        &cookie,
        "/api/projects",
        serde_json::json!({ "name": "Website" }),
    )
    .await;
    let task = create_entity(
        &app,
        &cookie,
        "/api/tasks",
        serde_json::json!({ "title": "Build", "project_id": project }),
    )
    .await;
    // A standalone task that must survive.
    let loose_task = create_entity(
        &app,
        &cookie,
        "/api/tasks",
        serde_json::json!({ "title": "Unrelated" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(upload_request(
            &format!("/api/projects/{project}/attachments/brief.pdf"),
            &cookie,
            b"brief",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED);
    let response = app
        .clone()
        .oneshot(upload_request(
            &format!("/api/tasks/{task}/attachments/notes.txt"),
            &cookie,
            b"notes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED);
    let response = app
        .clone()
        .oneshot(upload_request(
            &format!("/api/tasks/{loose_task}/attachments/keep.txt"),
            &cookie,
            b"keep",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/projects/{project}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::NO_CONTENT);

    // The project's task went with it; the standalone task did not.
    let response = app
        .clone()
        .oneshot(bare_request("GET", &format!("/api/tasks/{task}"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    let response = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/tasks/{loose_task}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);

    // Only the surviving task's file remains.
    let stored = files.list_prefix(&org).await.unwrap();
    assert_eq!(stored, vec![format!("{org}/tasks/{loose_task}/keep.txt")]);
}
