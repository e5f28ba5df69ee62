//! Clothing Store API Library
//!
//! Schema migrations, domain services and the axum router for a small
//! clothing store: catalog, customer accounts, orders and admin statistics.
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
pub mod openapi;
pub mod seed;
pub mod services;
pub mod tracing;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::get,
    Router,
};
use http::HeaderValue;
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::services::{
    categories::CategoryService, customers::CustomerService, orders::OrderService,
    products::ProductService, statistics::StatisticsService,
};

/// Per-request budget before the server answers 408
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        Self {
            db,
            config: Arc::new(config),
            auth,
        }
    }

    pub fn category_service(&self) -> CategoryService {
        CategoryService::new(self.db.clone())
    }

    pub fn product_service(&self) -> ProductService {
        ProductService::new(self.db.clone())
    }

    pub fn customer_service(&self) -> CustomerService {
        CustomerService::new(self.db.clone())
    }

    pub fn order_service(&self) -> OrderService {
        OrderService::new(self.db.clone())
    }

    pub fn statistics_service(&self) -> StatisticsService {
        StatisticsService::new(self.db.clone())
    }
}

/// Every route of the API, without global middleware
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/categories", handlers::categories::category_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/users", handlers::users::user_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/admin", handlers::orders::admin_order_routes())
        .nest("/statistics", handlers::statistics::statistics_routes())
}

/// Builds the CORS layer: explicit origins when configured, permissive in
/// development, same-origin only otherwise.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

// Inject AuthService into request extensions for auth middleware
async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// The complete application: routes, state and global middleware.
pub fn app_router(state: AppState) -> Router {
    with_global_layers(api_routes(), state, REQUEST_TIMEOUT)
}

/// Wraps `routes` in the global middleware stack and binds the state.
pub fn with_global_layers(
    routes: Router<AppState>,
    state: AppState,
    request_timeout: Duration,
) -> Router {
    let cors = cors_layer(&state.config);
    let auth = state.auth.clone();

    routes
        // HTTP tracing layer for consistent request/response telemetry
        .layer(tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(auth, inject_auth_service))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
