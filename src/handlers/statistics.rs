use axum::{extract::State, routing::get, Json, Router};

use crate::{
    auth::AuthRouterExt,
    entities::customer::Role,
    errors::{ErrorResponse, ServiceError},
    services::statistics::{SalesStatistics, UserStatistics},
    AppState,
};

#[utoipa::path(
    get,
    path = "/statistics/users",
    tag = "Statistics",
    responses(
        (status = 200, description = "Customer counts and registrations per day", body = UserStatistics),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_statistics(
    State(state): State<AppState>,
) -> Result<Json<UserStatistics>, ServiceError> {
    Ok(Json(state.statistics_service().user_statistics().await?))
}

#[utoipa::path(
    get,
    path = "/statistics/sales",
    tag = "Statistics",
    responses(
        (status = 200, description = "Order volume, revenue and best sellers", body = SalesStatistics),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn sales_statistics(
    State(state): State<AppState>,
) -> Result<Json<SalesStatistics>, ServiceError> {
    Ok(Json(state.statistics_service().sales_statistics().await?))
}

pub fn statistics_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(user_statistics))
        .route("/sales", get(sales_statistics))
        .with_role(Role::Admin)
}
