use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use accounting_portal::{config::Config, routes, store::fixtures::DEMO_PASSWORD, AppState};

fn demo_app() -> Router {
    let state = AppState::new(Config::demo("test_secret_key")).expect("state");
    routes::router(state)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": email, "password": DEMO_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn admin_routes_require_a_valid_token() {
    let app = demo_app();

    let (status, body) = call(&app, "GET", "/api/admin/jobs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, body) = call(&app, "GET", "/api/admin/jobs", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = call(
        &app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": "admin@demo.local", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn editor_archives_but_cannot_delete_jobs() {
    let app = demo_app();
    let editor = login(&app, "editor@demo.local").await;

    let (status, me) = call(&app, "GET", "/api/admin/me", Some(&editor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "editor");
    let permissions = me["permissions"].as_array().unwrap();
    assert!(permissions.contains(&json!("jobs:archive")));
    assert!(!permissions.contains(&json!("jobs:delete")));

    let (status, job) = call(&app, "POST", "/api/admin/jobs/1/archive", Some(&editor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["is_archived"], true);
    assert_eq!(job["is_active"], false);

    let (status, _) = call(&app, "DELETE", "/api/admin/jobs/2", Some(&editor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "POST", "/api/admin/jobs/1/activate", Some(&editor), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, public) = call(&app, "GET", "/api/public/jobs", None, None).await;
    assert_eq!(public["pagination"]["total"], 4);

    let (_, all) = call(&app, "GET", "/api/admin/jobs", Some(&editor), None).await;
    assert_eq!(all["pagination"]["total"], 6);

    let (status, _) = call(&app, "GET", "/api/admin/audit-log", Some(&editor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = login(&app, "admin@demo.local").await;
    let (status, audit) = call(&app, "GET", "/api/admin/audit-log", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let entry = &audit["items"][0];
    assert_eq!(entry["action"], "archive");
    assert_eq!(entry["module"], "jobs");
    assert_eq!(entry["resource_id"], "1");
    assert_eq!(entry["actor"]["email"], "editor@demo.local");

    let (status, _) = call(&app, "DELETE", "/api/admin/jobs/2", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", "/api/admin/jobs/2", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn viewer_is_read_only() {
    let app = demo_app();
    let viewer = login(&app, "viewer@demo.local").await;

    let (status, list) = call(&app, "GET", "/api/admin/candidates", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["total"], 5);

    let (status, _) = call(
        &app,
        "POST",
        "/api/admin/blog/hiring-remote-accountants/publish",
        Some(&viewer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        "POST",
        "/api/admin/candidates/bulk-delete",
        Some(&viewer),
        Some(json!({ "ids": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, dashboard) = call(&app, "GET", "/api/admin/dashboard", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["jobs"]["total"], 6);
    assert_eq!(dashboard["active_jobs"]["total"], 5);
    assert_eq!(dashboard["candidates"]["total"], 5);
}

#[tokio::test]
async fn page_size_is_remembered_per_user_and_list() {
    let app = demo_app();
    let admin = login(&app, "admin@demo.local").await;

    let (_, first) = call(&app, "GET", "/api/admin/candidates?per_page=5", Some(&admin), None).await;
    assert_eq!(first["pagination"]["per_page"], 5);

    let (_, again) = call(&app, "GET", "/api/admin/candidates", Some(&admin), None).await;
    assert_eq!(again["pagination"]["per_page"], 5);

    let (_, jobs) = call(&app, "GET", "/api/admin/jobs", Some(&admin), None).await;
    assert_eq!(jobs["pagination"]["per_page"], 10);

    let editor = login(&app, "editor@demo.local").await;
    let (_, other_user) = call(&app, "GET", "/api/admin/candidates", Some(&editor), None).await;
    assert_eq!(other_user["pagination"]["per_page"], 10);

    let (status, settings) = call(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&admin),
        Some(json!({ "theme": "dark", "page_sizes": { "jobs": 25 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "dark");
    assert_eq!(settings["page_sizes"]["jobs"], 25);
    assert_eq!(settings["page_sizes"]["candidates"], 5);

    let (status, _) = call(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&admin),
        Some(json!({ "page_sizes": { "jobs": 30 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn bulk_delete_reports_missing_ids() {
    let app = demo_app();
    let admin = login(&app, "admin@demo.local").await;

    let (status, outcome) = call(
        &app,
        "POST",
        "/api/admin/candidates/bulk-delete",
        Some(&admin),
        Some(json!({ "ids": [1, 2, 99] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mut deleted: Vec<i64> = outcome["deleted"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    deleted.sort();
    assert_eq!(deleted, vec![1, 2]);
    assert_eq!(outcome["missing"], json!([99]));

    let (_, list) = call(&app, "GET", "/api/admin/candidates", Some(&admin), None).await;
    assert_eq!(list["pagination"]["total"], 3);
}

#[tokio::test]
async fn export_returns_csv_attachment() {
    let app = demo_app();
    let admin = login(&app, "admin@demo.local").await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/candidates/export")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "ids": [1, 3], "format": "csv" }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("candidates_"));
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Name,Email"));

    let (_, audit) = call(&app, "GET", "/api/admin/audit-log", Some(&admin), None).await;
    assert_eq!(audit["items"][0]["action"], "download");
}

#[tokio::test]
async fn admin_post_shadows_bundled_sample() {
    let app = demo_app();
    let editor = login(&app, "editor@demo.local").await;

    let (status, created) = call(
        &app,
        "POST",
        "/api/admin/blog",
        Some(&editor),
        Some(json!({
            "slug": "month-end-close-playbook",
            "title": "Month-End Close, Revisited",
            "content": "Updated guidance.",
            "category": "Accounting",
            "is_published": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "month-end-close-playbook");
    assert_eq!(created["author"], "Editorial Team");

    let (status, detail) =
        call(&app, "GET", "/api/public/blog/month-end-close-playbook", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["item"]["title"], "Month-End Close, Revisited");

    let (_, list) = call(&app, "GET", "/api/public/blog", None, None).await;
    assert_eq!(list["pagination"]["total"], 4);
    assert_eq!(list["items"][0]["slug"], "month-end-close-playbook");
}

#[tokio::test]
async fn punctuation_only_title_still_gets_an_addressable_slug() {
    let app = demo_app();
    let editor = login(&app, "editor@demo.local").await;

    let (status, created) = call(
        &app,
        "POST",
        "/api/admin/blog",
        Some(&editor),
        Some(json!({
            "title": "???",
            "content": "Draft notes.",
            "category": "Accounting",
            "is_published": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "post");

    let (status, fetched) = call(&app, "GET", "/api/admin/blog/post", Some(&editor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["item"]["title"], "???");

    let (status, published) =
        call(&app, "POST", "/api/admin/blog/post/publish", Some(&editor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["is_published"], true);
}

#[tokio::test]
async fn listing_survives_an_unwritable_preferences_file() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("prefs.json");
    let mut config = Config::demo("test_secret_key");
    config.preferences_path = Some(prefs.clone());
    let app = routes::router(AppState::new(config).expect("state"));
    let admin = login(&app, "admin@demo.local").await;

    std::fs::create_dir(&prefs).unwrap();

    let (status, list) =
        call(&app, "GET", "/api/admin/candidates?per_page=5", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["per_page"], 5);
    assert_eq!(list["items"].as_array().unwrap().len(), 5);

    let (_, again) = call(&app, "GET", "/api/admin/candidates", Some(&admin), None).await;
    assert_eq!(again["pagination"]["per_page"], 10);
}
