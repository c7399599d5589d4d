// tests/api_inproc.rs
// Drives the router in-process against a local store in a temp dir.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use paylink::api::{router, ApiSettings};
use paylink::store::{LinkStore, LocalStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BASE_URL: &str = "http://paylink.test";

fn app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn LinkStore> =
        Arc::new(LocalStore::open(dir.path().to_str().unwrap()).unwrap());
    let router = router(
        store,
        ApiSettings {
            base_url: BASE_URL.to_string(),
        },
    );
    (router, dir)
}

async fn request(
    app: &Router,
    method: http::Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn create_body() -> Value {
    json!({
        "recipient": "0x1111111111111111111111111111111111111111",
        "amount": "1.5",
        "currency": "ETH",
        "createdBy": "0xCreator"
    })
}

#[tokio::test]
async fn create_returns_link_and_shareable_url() {
    let (app, _dir) = app();

    let (status, body) = request(&app, http::Method::POST, "/links", Some(create_body())).await;
    assert_eq!(status, StatusCode::CREATED);

    let link = &body["link"];
    assert_eq!(link["recipient"], "0x1111111111111111111111111111111111111111");
    assert_eq!(link["amount"], "1.5");
    assert_eq!(link["currency"], "ETH");
    assert_eq!(link["paid"], false);
    assert!(link.get("paidAt").is_none());

    let id = link["id"].as_str().unwrap();
    assert_eq!(body["url"], format!("{}/pay/{}", BASE_URL, id));
}

#[tokio::test]
async fn create_rejects_malformed_input() {
    let (app, _dir) = app();

    let mut bad = create_body();
    bad["recipient"] = json!("not-an-address");
    let (status, body) = request(&app, http::Method::POST, "/links", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("recipient"));

    let mut bad = create_body();
    bad["recipient"] = json!("");
    let (status, _) = request(&app, http::Method::POST, "/links", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad = create_body();
    bad["amount"] = json!("-2");
    let (status, body) = request(&app, http::Method::POST, "/links", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("amount"));

    // nothing was persisted
    let (_, links) = request(&app, http::Method::GET, "/links", None).await;
    assert_eq!(links.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn get_by_id_round_trips_and_misses_are_404() {
    let (app, _dir) = app();

    let (_, created) = request(&app, http::Method::POST, "/links", Some(create_body())).await;
    let id = created["link"]["id"].as_str().unwrap().to_string();

    let (status, fetched) = request(&app, http::Method::GET, &format!("/links/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created["link"]);

    let (status, body) = request(
        &app,
        http::Method::GET,
        "/links/00000000-0000-4000-8000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "link not found");

    // an id that is not even a uuid was still never issued
    let (status, _) = request(&app, http::Method::GET, "/links/nonexistent-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_creator_case_insensitively() {
    let (app, _dir) = app();

    request(&app, http::Method::POST, "/links", Some(create_body())).await;
    let mut other = create_body();
    other["createdBy"] = json!("0xSomeoneElse");
    request(&app, http::Method::POST, "/links", Some(other)).await;

    let (_, all) = request(&app, http::Method::GET, "/links", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, filtered) = request(&app, http::Method::GET, "/links?creator=0xcreator", None).await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["createdBy"], "0xCreator");
}

#[tokio::test]
async fn pay_settles_link_and_misses_are_404() {
    let (app, _dir) = app();

    let (_, created) = request(&app, http::Method::POST, "/links", Some(create_body())).await;
    let id = created["link"]["id"].as_str().unwrap().to_string();

    let pay = json!({"paidBy": "0xPayer", "txHash": "0xdeadbeef"});
    let (status, paid) = request(
        &app,
        http::Method::POST,
        &format!("/links/{}/pay", id),
        Some(pay.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["paid"], true);
    assert_eq!(paid["paidBy"], "0xPayer");
    assert_eq!(paid["txHash"], "0xdeadbeef");
    assert!(paid.get("paidAt").is_some());

    let (status, _) = request(
        &app,
        http::Method::POST,
        "/links/00000000-0000-4000-8000-000000000000/pay",
        Some(pay),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        http::Method::POST,
        &format!("/links/{}/pay", id),
        Some(json!({"paidBy": "", "txHash": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _dir) = app();
    let (status, body) = request(&app, http::Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
