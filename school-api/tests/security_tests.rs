//! Access gate and request limit tests

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use school_api::{build_router, AppState};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

const TEST_KEY: &str = "s3cret-key";

async fn setup_app() -> axum::Router {
    let db = school_common::db::open_in_memory()
        .await
        .expect("Should open in-memory store");
    build_router(AppState::new(db, TEST_KEY))
}

/// Router over a store that fails every query
async fn setup_app_with_closed_store() -> axum::Router {
    let db = school_common::db::open_in_memory()
        .await
        .expect("Should open in-memory store");
    db.close().await;
    build_router(AppState::new(db, TEST_KEY))
}

async fn call(app: &axum::Router, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_missing_or_wrong_key_rejected_before_store_access() {
    let app = setup_app_with_closed_store().await;

    let (status, body) = call(&app, "/secure/students", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = call(&app, "/secure/students", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // With the right key the closed store is reached and fails
    let (status, body) = call(&app, "/secure/students", Some(TEST_KEY)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "STORE_ERROR");
}

#[tokio::test]
async fn test_every_secure_route_is_gated() {
    let app = setup_app_with_closed_store().await;

    for uri in [
        "/secure/students",
        "/secure/students/search?name=a",
        "/secure/students/s1",
        "/secure/courses",
        "/secure/courses/c1/students",
        "/secure/enrollments",
        "/secure/enrollments/not-a-uuid",
        "/secure/stats/grades",
        "/secure/stats/top-courses",
        "/secure/reports/students-not-enrolled",
        "/secure/reports/student-courses",
        "/secure/reports/students-by-course?name=x",
        "/secure/tables",
        "/secure/tables/students",
    ] {
        let (status, _) = call(&app, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_secure_routes_serve_same_data_with_key() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/students")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"student_id": "s1", "name": "Amy", "age": 16, "grade": "A", "email": "amy@x.io"})
                .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let (status, public) = call(&app, "/students", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, secure) = call(&app, "/secure/students", Some(TEST_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public, secure);

    let (status, body) = call(&app, "/secure/students/s1", Some(TEST_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Amy");
}

#[tokio::test]
async fn test_health_never_gated() {
    let app = setup_app_with_closed_store().await;
    let (status, body) = call(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_table_overview() {
    let app = setup_app().await;

    let (status, body) = call(&app, "/secure/tables", Some(TEST_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["students", "courses", "enrollments"]);
    assert!(body.as_array().unwrap().iter().all(|t| t["row_count"] == 0));

    let (status, body) = call(&app, "/secure/tables/courses?page=3", Some(TEST_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_rows"], 0);
    assert_eq!(body["page_size"], 100);
    assert_eq!(
        body["columns"],
        json!(["course_id", "course_name", "instructor", "created_at"])
    );
    assert_eq!(body["rows"], json!([]));

    // Only record tables are exposed
    let (status, _) = call(&app, "/secure/tables/settings", Some(TEST_KEY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "/secure/tables/students?page=x", Some(TEST_KEY)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn test_upload_over_body_limit() {
    let db = school_common::db::open_in_memory().await.unwrap();
    let app = build_router(AppState::new(db, TEST_KEY).with_max_upload_bytes(1024));

    let mut csv = String::from("name,age,grade,email\n");
    while csv.len() < 8 * 1024 {
        csv.push_str("Somebody Withalongname,18,A,somebody@school.test\n");
    }
    let body = format!(
        "--XBOUNDARY\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"big.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {}\r\n\
         --XBOUNDARY--\r\n",
        csv
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload-csv")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

    let (_, list) = call(&app, "/students", None).await;
    assert_eq!(list, json!([]));
}
