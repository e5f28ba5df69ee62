use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::validate_not_blank;
use crate::{
    db::DbPool,
    entities::{
        category::Entity as Category,
        order_item,
        product::{self, Entity as Product},
    },
    errors::ServiceError,
};

/// Prices must fit a DECIMAL(10,2) column
const PRICE_INTEGER_DIGITS: u32 = 8;

/// Create or replace payload for a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    #[schema(example = "Wool Overcoat")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "149.90")]
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    pub category_id: Option<i32>,
}

/// Filter for listing products
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Only return products in this category
    pub category_id: Option<i32>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("negative_price"));
    }
    if price.trunc() >= Decimal::from(10u64.pow(PRICE_INTEGER_DIGITS)) || price.round_dp(2) != *price {
        return Err(ValidationError::new("price_out_of_range"));
    }
    Ok(())
}

/// Service for managing catalog products
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let mut query = Product::find();
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        let products = query
            .order_by_asc(product::Column::ProductId)
            .all(&*self.db_pool)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;
        self.ensure_category_exists(input.category_id).await?;

        let created = product::ActiveModel {
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            price: Set(input.price),
            stock_quantity: Set(input.stock_quantity),
            category_id: Set(input.category_id),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(product_id = created.product_id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: i32,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_product(product_id).await?;
        self.ensure_category_exists(input.category_id).await?;

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(input.name.trim().to_string());
        active.description = Set(input.description);
        active.price = Set(input.price);
        active.stock_quantity = Set(input.stock_quantity);
        active.category_id = Set(input.category_id);

        Ok(active.update(&*self.db_pool).await?)
    }

    /// Deletes a product that no order references
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i32) -> Result<(), ServiceError> {
        let product = self.get_product(product_id).await?;

        let referenced = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(&*self.db_pool)
            .await?;
        if referenced > 0 {
            return Err(ServiceError::Conflict(
                "Product is referenced by existing orders".to_string(),
            ));
        }

        Product::delete_by_id(product.product_id)
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                ServiceError::from_db_with_conflict(e, "Product is referenced by existing orders")
            })?;
        info!(product_id, "Product deleted");
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: Option<i32>) -> Result<(), ServiceError> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        Category::find_by_id(category_id)
            .one(&*self.db_pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))
    }
}
