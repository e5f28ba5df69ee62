use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clothing Store API",
        version = "0.1.0",
        description = r#"
# Clothing Store API

Catalog browsing, customer accounts and order placement for a small clothing store.

## Authentication

Obtain a token from `POST /users/login` (form fields `username` and `password`) and
send it on subsequent requests:

```
Authorization: Bearer <access_token>
```

Catalog writes, `/admin/*` and `/statistics/*` require the `admin` role.
"#
    ),
    tags(
        (name = "Meta", description = "Banner and health endpoints"),
        (name = "Categories", description = "Catalog categories"),
        (name = "Products", description = "Catalog products"),
        (name = "Users", description = "Registration and login"),
        (name = "Orders", description = "Order placement and history"),
        (name = "Statistics", description = "Administrative reporting")
    ),
    paths(
        crate::handlers::root,
        crate::health::health_check,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::users::register,
        crate::handlers::users::login,
        crate::handlers::users::me,
        crate::handlers::orders::place_order,
        crate::handlers::orders::list_my_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_all_orders,
        crate::handlers::statistics::user_statistics,
        crate::handlers::statistics::sales_statistics,
    ),
    components(
        schemas(
            crate::handlers::Banner,
            crate::health::HealthInfo,
            crate::health::HealthStatus,
            crate::entities::category::Model,
            crate::entities::product::Model,
            crate::entities::customer::Role,
            crate::entities::order::OrderStatus,
            crate::services::categories::CategoryInput,
            crate::services::products::ProductInput,
            crate::services::customers::RegisterCustomer,
            crate::services::customers::CustomerProfile,
            crate::handlers::users::LoginForm,
            crate::auth::AccessToken,
            crate::services::orders::PlaceOrderRequest,
            crate::services::orders::OrderLine,
            crate::services::orders::OrderDetails,
            crate::services::statistics::UserStatistics,
            crate::services::statistics::DailyRegistrations,
            crate::services::statistics::SalesStatistics,
            crate::services::statistics::ProductSales,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Serves the generated document at `/api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
