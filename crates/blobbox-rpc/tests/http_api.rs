use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use blobbox_rpc::RpcServer;
use blobbox_storage::{BlobStore, Storage, StoreLimits};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn test_app(capacity_bytes: u64) -> Router {
    let storage = Storage::in_memory().await.unwrap();
    let limits = StoreLimits {
        capacity_bytes,
        ..Default::default()
    };
    RpcServer::new(BlobStore::new(storage, limits)).router()
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> TestResponse {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_post_set_and_get() {
    let app = test_app(1024).await;

    let res = post_json(
        &app,
        "/",
        json!({"method": "data-set", "params": {"name": "calendar_events", "data": [{"day": 3}]}}),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"status": true, "data": {"result": "success"}}));

    let res = post_json(
        &app,
        "/",
        json!({"method": "data-get", "params": {"name": "calendar_events"}}),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({"status": true, "data": {"result": "success", "value": [{"day": 3}]}})
    );
}

#[tokio::test]
async fn test_legacy_endpoint_and_names() {
    let app = test_app(1024).await;

    let res = post_json(
        &app,
        "/api/v1/",
        json!({"method": "db_data_set", "params": {"name": "calendar_events", "data": {"events": []}}}),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["result"], "success");

    let res = post_json(
        &app,
        "/api/v1",
        json!({"method": "db_data_get", "params": {"name": "calendar_events"}}),
    )
    .await;
    assert_eq!(res.json()["data"]["value"], json!({"events": []}));
}

#[tokio::test]
async fn test_get_with_query_params() {
    let app = test_app(1024).await;

    let res = get(&app, "/?method=data-set&params%5Bname%5D=memo&params%5Bdata%5D%5Btext%5D=hi").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["result"], "success");

    let res = get(&app, "/?method=data_get&params%5Bname%5D=memo").await;
    assert_eq!(res.json()["data"]["value"], json!({"text": "hi"}));
}

#[tokio::test]
async fn test_form_body() {
    let app = test_app(1024).await;

    let request = Request::post("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("method=data-set&params%5Bname%5D=f&params%5Bdata%5D=v"))
        .unwrap();
    let res = send(&app, request).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["result"], "success");

    let res = get(&app, "/?method=data-get&params%5Bname%5D=f").await;
    assert_eq!(res.json()["data"]["value"], "v");
}

#[tokio::test]
async fn test_body_overrides_query() {
    let app = test_app(1024).await;

    let request = Request::post("/?method=reset")
        .body(Body::from(r#"{"method": "list-names"}"#))
        .unwrap();
    let res = send(&app, request).await;
    assert_eq!(res.json(), json!({"status": true, "data": {"result": "success", "value": []}}));
}

#[tokio::test]
async fn test_missing_params_fail_in_envelope() {
    let app = test_app(1024).await;

    let res = get(&app, "/?method=data-set&params=%7B%7D").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], true);
    assert_eq!(body["data"]["result"], "failed");
    assert!(body["data"]["value"].is_string());
}

#[tokio::test]
async fn test_get_unknown_name_fails_in_envelope() {
    let app = test_app(1024).await;

    let res = post_json(&app, "/", json!({"method": "data-get", "params": {"name": "never-saved"}})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["result"], "failed");
}

#[tokio::test]
async fn test_disallowed_verbs() {
    let app = test_app(1024).await;

    for method in ["PUT", "DELETE", "PATCH", "OPTIONS"] {
        let request = Request::builder()
            .method(method)
            .uri("/?method=list-names")
            .body(Body::empty())
            .unwrap();
        let res = send(&app, request).await;
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        assert!(res.body.is_empty());
    }
}

#[tokio::test]
async fn test_unknown_operation() {
    let app = test_app(1024).await;

    let res = get(&app, "/?method=drop-table").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.is_empty());

    let res = get(&app, "/").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.is_empty());
}

#[tokio::test]
async fn test_quota_over_http() {
    let app = test_app(10).await;

    let res = post_json(&app, "/", json!({"method": "data-set", "params": {"name": "a", "data": "12345"}})).await;
    assert_eq!(res.json()["data"]["result"], "success");

    let res = post_json(&app, "/", json!({"method": "data-set", "params": {"name": "b", "data": "123"}})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["result"], "failed");

    let res = post_json(&app, "/", json!({"method": "data-get", "params": {"name": "b"}})).await;
    assert_eq!(res.json()["data"]["result"], "failed");
}

#[tokio::test]
async fn test_list_names_after_three_saves() {
    let app = test_app(1024).await;

    for name in ["x", "y", "z"] {
        post_json(&app, "/", json!({"method": "data-set", "params": {"name": name, "data": 1}})).await;
    }

    let res = get(&app, "/?method=list_names").await;
    let mut names: Vec<String> = serde_json::from_value(res.json()["data"]["value"].clone()).unwrap();
    names.sort();
    assert_eq!(names, vec!["x", "y", "z"]);

    let res = get(&app, "/?method=reset").await;
    assert_eq!(res.json(), json!({"status": true, "data": {"result": "success"}}));

    let res = get(&app, "/?method=list-names").await;
    assert_eq!(res.json()["data"]["value"], json!([]));
}

#[tokio::test]
async fn test_stored_strings_are_escaped() {
    let app = test_app(1024).await;

    post_json(
        &app,
        "/",
        json!({"method": "data-set", "params": {"name": "note", "data": {"html": "<b>\"hi\" & 'bye'</b>", "n": 1}}}),
    )
    .await;

    let res = post_json(&app, "/", json!({"method": "data-get", "params": {"name": "note"}})).await;
    assert_eq!(
        res.json()["data"]["value"],
        json!({"html": "&lt;b&gt;&quot;hi&quot; &amp; &#039;bye&#039;&lt;/b&gt;", "n": 1})
    );
}

#[tokio::test]
async fn test_unicode_is_not_escaped_in_response() {
    let app = test_app(1024).await;

    post_json(&app, "/", json!({"method": "data-set", "params": {"name": "jp", "data": "会議/予定"}})).await;
    let res = post_json(&app, "/", json!({"method": "data-get", "params": {"name": "jp"}})).await;

    let text = String::from_utf8(res.body).unwrap();
    assert!(text.contains("会議/予定"));
}

#[tokio::test]
async fn test_response_headers() {
    let app = test_app(1024).await;

    let ok = get(&app, "/?method=list-names").await;
    let rejected = send(
        &app,
        Request::put("/").body(Body::empty()).unwrap(),
    )
    .await;

    for res in [ok, rejected] {
        let h = &res.headers;
        assert_eq!(h["access-control-allow-origin"], "*");
        assert_eq!(h["access-control-allow-methods"], "GET, POST");
        assert_eq!(h["access-control-allow-headers"], "Content-Type");
        assert_eq!(h["content-type"], "application/json; charset=utf-8");
        assert_eq!(h["x-content-type-options"], "nosniff");
        assert_eq!(h["x-frame-options"], "SAMEORIGIN");
        assert_eq!(h["content-security-policy"], "script-src 'self'");
        assert_eq!(h["strict-transport-security"], "max-age=31536000;");
        assert_eq!(
            h["cache-control"],
            "no-store, no-cache, must-revalidate, max-age=0"
        );
        assert_eq!(h["expires"], "Thu, 01 Jan 1970 00:00:00 GMT");
    }
}

#[tokio::test]
async fn test_oversized_body_fails_in_envelope() {
    let app = test_app(1024).await;

    let data = "x".repeat(100 * 1024);
    let res = post_json(
        &app,
        "/",
        json!({"method": "data-set", "params": {"name": "huge", "data": data}}),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json(),
        json!({"status": true, "data": {"result": "failed", "value": "save failed (capacity exceeded)"}})
    );
    assert_eq!(res.headers["content-type"], "application/json; charset=utf-8");

    let res = post_json(&app, "/", json!({"method": "data-get", "params": {"name": "huge"}})).await;
    assert_eq!(res.json()["data"]["result"], "failed");
}

#[tokio::test]
async fn test_oversized_body_with_disallowed_verb() {
    let app = test_app(1024).await;

    let request = Request::put("/")
        .body(Body::from("x".repeat(100 * 1024)))
        .unwrap();
    let res = send(&app, request).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.body.is_empty());
}

#[tokio::test]
async fn test_deeply_nested_form_key() {
    let app = test_app(1024 * 1024).await;

    let form = format!("method=list-names&a{}=1", "[]".repeat(50_000));
    let request = Request::post("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let res = send(&app, request).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"status": true, "data": {"result": "success", "value": []}}));
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let storage = Storage::in_memory().await.unwrap();
    let app = RpcServer::new(BlobStore::new(storage.clone(), StoreLimits::default())).router();

    storage.close().await;

    let res = get(&app, "/?method=list-names").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.body.is_empty());
}
