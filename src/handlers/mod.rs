//! HTTP handlers. Each submodule exposes the routes for one resource.

pub mod categories;
pub mod orders;
pub mod products;
pub mod statistics;
pub mod users;

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Banner returned by `GET /`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Banner {
    #[schema(example = "Clothing Store v0.1")]
    pub msg: String,
}

pub const BANNER: &str = "Clothing Store v0.1";

#[utoipa::path(
    get,
    path = "/",
    tag = "Meta",
    responses((status = 200, description = "Service banner", body = Banner))
)]
pub async fn root() -> Json<Banner> {
    Json(Banner {
        msg: BANNER.to_string(),
    })
}
