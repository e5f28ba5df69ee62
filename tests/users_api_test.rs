//! Registration, login and the current-user endpoint.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_creates_customer_without_exposing_hash() {
    let app = TestApp::new().await;
    let body = app
        .register("Ada", "Lovelace", "Ada@Example.COM", "analytical-engine")
        .await;

    assert_eq!(body["first_name"], "Ada");
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["role"], "customer");
    assert!(body["created_at"].is_string());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts_regardless_of_case() {
    let app = TestApp::new().await;
    app.register("Ada", "Lovelace", "ada@example.com", "analytical-engine")
        .await;

    let response = app
        .request(
            Method::POST,
            "/users",
            Some(json!({
                "first_name": "Other",
                "last_name": "Person",
                "email": " ADA@example.com ",
                "password": "another-password",
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response_json(response).await["message"],
        "Email already registered"
    );
}

#[tokio::test]
async fn invalid_registrations_are_rejected() {
    let app = TestApp::new().await;

    let cases = [
        json!({"first_name": "A", "last_name": "B", "email": "a@b.co", "password": "short"}),
        json!({"first_name": "A", "last_name": "B", "email": "not-an-email", "password": "long-enough"}),
        json!({"first_name": "", "last_name": "B", "email": "a@b.co", "password": "long-enough"}),
        json!({"first_name": "A", "email": "a@b.co", "password": "long-enough"}),
    ];
    for payload in cases {
        let response = app.request(Method::POST, "/users", Some(payload), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn login_issues_bearer_token() {
    let app = TestApp::new().await;
    app.register("Grace", "Hopper", "grace@example.com", "cobol-forever")
        .await;

    let response = app
        .post_form(
            "/users/login",
            &[
                ("username", "grace@example.com"),
                ("password", "cobol-forever"),
                ("grant_type", "password"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);

    let token = body["access_token"].as_str().unwrap();
    let claims = app.state.auth.validate_token(token).unwrap();
    assert_eq!(claims.email, "grace@example.com");
}

#[tokio::test]
async fn login_accepts_email_in_any_case() {
    let app = TestApp::new().await;
    app.register("Grace", "Hopper", "grace@example.com", "cobol-forever")
        .await;

    let token = app.login("GRACE@example.com", "cobol-forever").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let app = TestApp::new().await;
    app.register("Grace", "Hopper", "grace@example.com", "cobol-forever")
        .await;

    for (username, password) in [
        ("grace@example.com", "wrong-password"),
        ("nobody@example.com", "cobol-forever"),
    ] {
        let response = app
            .post_form(
                "/users/login",
                &[("username", username), ("password", password)],
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response_json(response).await["message"],
            "Incorrect email or password"
        );
    }
}

#[tokio::test]
async fn login_rejects_json_and_unknown_grants() {
    let app = TestApp::new().await;

    let json_body = app
        .request(
            Method::POST,
            "/users/login",
            Some(json!({"username": "a@b.co", "password": "whatever1"})),
            None,
        )
        .await;
    assert_eq!(json_body.status(), StatusCode::BAD_REQUEST);

    let grant = app
        .post_form(
            "/users/login",
            &[
                ("username", "a@b.co"),
                ("password", "whatever1"),
                ("grant_type", "client_credentials"),
            ],
        )
        .await;
    assert_eq!(grant.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_returns_current_customer() {
    let app = TestApp::new().await;
    let (id, token) = app.customer("me@example.com").await;

    let response = app.request(Method::GET, "/users/me", None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["customer_id"], id);
    assert_eq!(body["email"], "me@example.com");

    let anonymous = app.request(Method::GET, "/users/me", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}
