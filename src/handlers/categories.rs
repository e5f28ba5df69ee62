use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use crate::{
    auth::AuthRouterExt,
    entities::{category::Model as Category, customer::Role},
    errors::{ErrorResponse, ServiceError},
    services::categories::CategoryInput,
    AppState,
};

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    responses((status = 200, description = "All categories ordered by id", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ServiceError> {
    Ok(Json(state.category_service().list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse),
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>, ServiceError> {
    Ok(Json(state.category_service().get_category(id).await?))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Missing 'name'", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Category already exists", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(input) = payload?;
    let created = state.category_service().create_category(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Name taken by another category", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Json<Category>, ServiceError> {
    let Json(input) = payload?;
    Ok(Json(state.category_service().update_category(id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.category_service().delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_categories).merge(post(create_category).with_role(Role::Admin)),
        )
        .route(
            "/:id",
            get(get_category).merge(
                put(update_category)
                    .delete(delete_category)
                    .with_role(Role::Admin),
            ),
        )
}
