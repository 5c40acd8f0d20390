//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use pix_hex::{PixService, inbound::HttpServer};
use pix_repo::{HmacKeyCodec, SqliteRepo};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Creates a server over in-memory SQLite with the given rate limit.
pub async fn create_test_server(requests_per_minute: u32) -> HttpServer<SqliteRepo, HmacKeyCodec> {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let service = PixService::new(repo, HmacKeyCodec::new("integration-secret"));
    HttpServer::with_rate_limit(service, requests_per_minute)
}

pub fn health_request() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {}", api_key))
        .body(Body::empty())
        .unwrap()
}

pub fn post(uri: &str, api_key: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Sends a request and returns the status with the decoded JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Signs up a user and returns their API key.
pub async fn signup(app: &Router, first_name: &str, wallet: i64) -> String {
    let (status, json) = send(
        app,
        post(
            "/api/users",
            None,
            json!({ "first_name": first_name, "last_name": "Silva", "wallet": wallet }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["api_key"].as_str().unwrap().to_string()
}
