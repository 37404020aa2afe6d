//! Leaf-plate API library
//!
//! Raw-material stock, production orders, bookkeeping and reports for a
//! leaf-plate workshop, served as a REST/JSON API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod rate_limiter;
pub mod recipes;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Extension, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::auth::{AuthConfig, AuthRouterExt, AuthService};
use crate::middleware_helpers::request_id_middleware;

const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(1);

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        let services = handlers::AppServices::new(db.clone(), &config, auth.clone());
        Self {
            db,
            config,
            auth,
            services,
        }
    }
}

/// Success envelope
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Everything under `/api`. Register and login are public, the rest need a token.
pub fn api_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        // Materials
        .route(
            "/materials",
            get(handlers::materials::list_materials).post(handlers::materials::add_material),
        )
        .route(
            "/materials/update-unit",
            patch(handlers::materials::update_unit),
        )
        .route(
            "/materials/quantity",
            post(handlers::materials::adjust_quantity),
        )
        .route(
            "/materials/:id",
            axum::routing::put(handlers::materials::update_material)
                .delete(handlers::materials::delete_material),
        )
        // Material history
        .route(
            "/material-history",
            get(handlers::material_history::list_history)
                .post(handlers::material_history::create_history_entry),
        )
        // Production orders
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/production",
            post(handlers::orders::record_production),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        // Ledger
        .route(
            "/transactions",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::create_transaction),
        )
        .route(
            "/transactions/:id",
            axum::routing::put(handlers::transactions::update_transaction)
                .delete(handlers::transactions::delete_transaction),
        )
        // Recipes and reports
        .route("/recipes", get(handlers::recipes::get_recipes))
        .route("/reports/summary", get(handlers::reports::summary))
        .route("/reports/export/:dataset", get(handlers::reports::export))
        .with_auth();

    Router::new().merge(public).merge(protected)
}

/// Full application router with the shared middleware stack.
///
/// Rate limiting and CORS are added by the binary so tests can drive the
/// router without them.
pub fn app_router(state: AppState) -> Router {
    let db = state.db.clone();
    let auth = state.auth.clone();
    let max_body_size = state.config.max_body_size;

    Router::new()
        .nest("/api", api_routes())
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .with_state(state)
        .nest("/health", health::health_routes(db))
        .fallback(not_found)
        .layer(Extension(auth))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(crate::tracing::configure_http_tracing())
        .layer(middleware::from_fn(request_id_middleware))
}

async fn not_found(uri: axum::http::Uri) -> errors::ServiceError {
    errors::ServiceError::NotFound(format!("No route for {}", uri.path()))
}

async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    ::tracing::debug!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    ::tracing::info!(
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        elapsed_ms = duration.as_millis() as u64,
        "Request completed"
    );
    crate::tracing::log_slow_request(
        method.as_str(),
        uri.path(),
        duration,
        SLOW_REQUEST_THRESHOLD,
    );

    response
}
