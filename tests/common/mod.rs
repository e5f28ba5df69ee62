#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use clothing_store::{
    app_router,
    config::AppConfig,
    db,
    entities::{category, product},
    seed::{self, AdminSeed},
    services::{
        categories::{CategoryInput, CategoryService},
        products::{ProductInput, ProductService},
    },
    AppState,
};

pub const TEST_JWT_SECRET: &str =
    "integration-tests-signing-key-3f9a7c2e1b8d4f6a0c5e9b7d2a4f8c1e6b3d9a7f";
pub const ADMIN_EMAIL: &str = "admin@clothing.test";
pub const ADMIN_PASSWORD: &str = "admin-password-123";

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with a fresh, migrated database.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:", "development");
        cfg.jwt_secret = Some(TEST_JWT_SECRET.to_string());

        let pool = db::connect_in_memory()
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());

        Self { router, state }
    }

    /// Send a request against the router with an optional JSON body and bearer token.
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

        self.send(builder.body(body).expect("failed to build request"))
            .await
    }

    /// Send an `application/x-www-form-urlencoded` POST. Values must not need escaping.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let encoded = fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(encoded))
            .expect("failed to build form request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Registers a customer through the API and returns the response body.
    pub async fn register(&self, first: &str, last: &str, email: &str, password: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/users",
                Some(json!({
                    "first_name": first,
                    "last_name": last,
                    "email": email,
                    "password": password,
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "registration failed");
        response_json(response).await
    }

    /// Logs in through the form endpoint and returns the access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post_form("/users/login", &[("username", email), ("password", password)])
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed for {email}");
        let body = response_json(response).await;
        body["access_token"]
            .as_str()
            .expect("access_token in login response")
            .to_string()
    }

    /// Registers a customer and returns `(customer_id, token)`.
    pub async fn customer(&self, email: &str) -> (i64, String) {
        let password = "customer-pass-1";
        let body = self.register("Test", "Customer", email, password).await;
        let id = body["customer_id"].as_i64().expect("customer_id");
        (id, self.login(email, password).await)
    }

    /// Creates the admin account (once) and returns a token for it.
    pub async fn admin_token(&self) -> String {
        seed::seed_admin(
            &self.state.db,
            AdminSeed {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                first_name: "Store".to_string(),
                last_name: "Admin".to_string(),
            },
            false,
        )
        .await
        .expect("seed admin");
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn create_category(&self, name: &str) -> category::Model {
        CategoryService::new(self.state.db.clone())
            .create_category(CategoryInput {
                name: Some(name.to_string()),
            })
            .await
            .expect("create category")
    }

    pub async fn create_product(
        &self,
        name: &str,
        price: Decimal,
        stock: i32,
        category_id: Option<i32>,
    ) -> product::Model {
        ProductService::new(self.state.db.clone())
            .create_product(ProductInput {
                name: name.to_string(),
                description: None,
                price,
                stock_quantity: stock,
                category_id,
            })
            .await
            .expect("create product")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Parses a decimal that the API renders as a JSON string.
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("decimal rendered as string")
        .parse::<Decimal>()
        .expect("valid decimal")
        .round_dp(2)
}
