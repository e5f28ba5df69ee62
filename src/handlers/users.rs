use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::{AccessToken, AuthRouterExt, AuthUser},
    errors::{ErrorResponse, ServiceError},
    services::customers::{CustomerProfile, RegisterCustomer},
    AppState,
};

/// OAuth2 password-grant form. `username` carries the email address.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub grant_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = RegisterCustomer,
    responses(
        (status = 201, description = "Account created", body = CustomerProfile),
        (status = 400, description = "Invalid registration", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterCustomer>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(input) = payload?;
    let customer = state.customer_service().register(input).await?;
    Ok((StatusCode::CREATED, Json(CustomerProfile::from(customer))))
}

#[utoipa::path(
    post,
    path = "/users/login",
    tag = "Users",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = AccessToken),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<AccessToken>, ServiceError> {
    let Form(form) = form?;
    if let Some(grant) = form.grant_type.as_deref() {
        if !grant.is_empty() && grant != "password" {
            return Err(ServiceError::BadRequest(format!(
                "Unsupported grant_type '{grant}'"
            )));
        }
    }

    let customer = state
        .customer_service()
        .authenticate(&form.username, &form.password)
        .await?;
    let token = state.auth.issue_token(&customer)?;
    Ok(Json(token))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "The authenticated customer", body = CustomerProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CustomerProfile>, ServiceError> {
    let customer = state
        .customer_service()
        .get_customer(user.customer_id)
        .await
        .map_err(|e| match e {
            // Token outlived the account
            ServiceError::NotFound(_) => ServiceError::Unauthorized("Account no longer exists".into()),
            other => other,
        })?;
    Ok(Json(customer.into()))
}

pub fn user_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", post(register))
        .route("/login", post(login));

    let authenticated = Router::new().route("/me", get(me)).with_auth();

    public.merge(authenticated)
}
