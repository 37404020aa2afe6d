#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use leafplate_api::{config::AppConfig, db, AppState};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness for an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
}

impl TestApp {
    /// Fresh schema plus one registered user whose token is used for authenticated calls.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = leafplate_api::app_router(state.clone());

        let mut app = Self {
            router,
            state,
            token: String::new(),
        };

        let response = app
            .request(
                Method::POST,
                "/api/auth/register",
                Some(json!({
                    "username": "owner",
                    "email": "owner@example.com",
                    "password": "secret123",
                    "fullName": "Workshop Owner"
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), 201, "registering the test user");
        let body = response_json(response).await;
        app.token = body["data"]["token"]
            .as_str()
            .expect("token in register response")
            .to_string();
        app
    }

    /// Bearer token for the default user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Seeds stock through the public add endpoint.
    pub async fn add_material(&self, name: &str, quantity: i64, price_per_unit: i64) -> Value {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/materials",
                Some(json!({
                    "name": name,
                    "quantity": quantity,
                    "unit": "ใบ",
                    "pricePerUnit": price_per_unit,
                    "date": "2024-03-01"
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "seeding material {}", name);
        response_json(response).await["data"].clone()
    }

    /// Current quantity of a material by name, or `None` when absent.
    pub async fn stock_of(&self, name: &str) -> Option<Decimal> {
        let response = self
            .request_authenticated(Method::GET, "/api/materials", None)
            .await;
        assert_eq!(response.status(), 200);
        let body = response_json(response).await;
        body["data"]
            .as_array()
            .expect("materials array")
            .iter()
            .find(|m| m["name"] == name)
            .map(|m| decimal(&m["quantity"]))
    }

    /// History rows for a material, newest first.
    pub async fn history_of(&self, name: &str) -> Vec<Value> {
        let uri = format!("/api/material-history?name={}", urlencode(name));
        let response = self.request_authenticated(Method::GET, &uri, None).await;
        assert_eq!(response.status(), 200);
        response_json(response).await["data"]
            .as_array()
            .expect("history array")
            .clone()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn response_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Decimals serialise as strings; accept numbers too.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

/// Percent-encodes a query value (Thai names are multi-byte).
pub fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
