use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::customer::Role,
    errors::{ErrorResponse, ServiceError},
    services::orders::{OrderDetails, PlaceOrderRequest},
    AppState,
};

#[utoipa::path(
    post,
    path = "/orders",
    tag = "Orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderDetails),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 422, description = "Insufficient stock", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(request) = payload?;
    let order = state
        .order_service()
        .place_order(user.customer_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Caller's order history, newest first", body = [OrderDetails]),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<OrderDetails>>, ServiceError> {
    Ok(Json(
        state
            .order_service()
            .list_orders_for_customer(user.customer_id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "Orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order", body = OrderDetails),
        (status = 403, description = "Order belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    user: AuthUser,
) -> Result<Json<OrderDetails>, ServiceError> {
    Ok(Json(
        state
            .order_service()
            .get_order(id, user.customer_id, user.is_admin())
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Every order, newest first", body = [OrderDetails]),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderDetails>>, ServiceError> {
    Ok(Json(state.order_service().list_all_orders().await?))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_orders).post(place_order))
        .route("/:id", get(get_order))
        .with_auth()
}

pub fn admin_order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .with_role(Role::Admin)
}
