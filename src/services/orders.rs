use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        money,
        order::{self, Entity as Order, OrderStatus},
        order_item::{self, Entity as OrderItem},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
};

/// Request body for placing a single-product order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    #[schema(example = 1)]
    pub product_id: i32,
    #[validate(range(min = 1, max = 1000))]
    #[schema(example = 2)]
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub order_item_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

impl From<order_item::Model> for OrderLine {
    fn from(item: order_item::Model) -> Self {
        Self {
            line_total: money(item.line_total()),
            order_item_id: item.order_item_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: money(item.unit_price),
        }
    }
}

/// Order with its lines and computed total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderDetails {
    pub order_id: i32,
    pub customer_id: i32,
    #[schema(value_type = String, format = Date)]
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl OrderDetails {
    fn assemble(order: order::Model, items: Vec<order_item::Model>) -> Self {
        let items: Vec<OrderLine> = items.into_iter().map(OrderLine::from).collect();
        let total = money(items.iter().map(|line| line.line_total).sum::<Decimal>());
        Self {
            order_id: order.order_id,
            customer_id: order.customer_id,
            order_date: order.order_date,
            status: order.status,
            items,
            total,
        }
    }
}

/// Service for placing and reading orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Places an order for one product. Stock is checked and decremented in
    /// the same transaction that writes the order.
    #[instrument(skip(self))]
    pub async fn place_order(
        &self,
        customer_id: i32,
        request: PlaceOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;

        let (order, item) = match write_order(&txn, customer_id, &request).await {
            Ok(written) => written,
            Err(e) => {
                txn.rollback().await?;
                return Err(e);
            }
        };
        txn.commit().await?;

        info!(
            order_id = order.order_id,
            customer_id,
            product_id = request.product_id,
            quantity = request.quantity,
            "Order placed"
        );
        Ok(OrderDetails::assemble(order, vec![item]))
    }

    /// Order history for one customer, newest first
    #[instrument(skip(self))]
    pub async fn list_orders_for_customer(
        &self,
        customer_id: i32,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::OrderId)
            .all(&*self.db_pool)
            .await?;
        with_items(&*self.db_pool, orders).await
    }

    /// Every order in the store, newest first
    #[instrument(skip(self))]
    pub async fn list_all_orders(&self) -> Result<Vec<OrderDetails>, ServiceError> {
        let orders = Order::find()
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::OrderId)
            .all(&*self.db_pool)
            .await?;
        with_items(&*self.db_pool, orders).await
    }

    /// Reads one order. Only its owner or an admin may see it.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: i32,
        requester_id: i32,
        requester_is_admin: bool,
    ) -> Result<OrderDetails, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if order.customer_id != requester_id && !requester_is_admin {
            return Err(ServiceError::Forbidden(
                "Not allowed to view this order".to_string(),
            ));
        }

        let mut details = with_items(&*self.db_pool, vec![order]).await?;
        details
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Order vanished while loading".to_string()))
    }
}

async fn write_order(
    txn: &DatabaseTransaction,
    customer_id: i32,
    request: &PlaceOrderRequest,
) -> Result<(order::Model, order_item::Model), ServiceError> {
    let product = Product::find_by_id(request.product_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

    if product.stock_quantity < request.quantity {
        return Err(insufficient_stock(&product, request.quantity));
    }

    // Conditional decrement so a concurrent order cannot oversell
    let decremented = Product::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).sub(request.quantity),
        )
        .filter(product::Column::ProductId.eq(product.product_id))
        .filter(product::Column::StockQuantity.gte(request.quantity))
        .exec(txn)
        .await?;
    if decremented.rows_affected != 1 {
        return Err(insufficient_stock(&product, request.quantity));
    }

    let order = order::ActiveModel {
        customer_id: Set(customer_id),
        status: Set(OrderStatus::Pending),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|e| ServiceError::from_db_with_conflict(e, "Customer does not exist"))?;

    let item = order_item::ActiveModel {
        order_id: Set(order.order_id),
        product_id: Set(product.product_id),
        quantity: Set(request.quantity),
        unit_price: Set(product.price),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok((order, item))
}

fn insufficient_stock(product: &product::Model, requested: i32) -> ServiceError {
    ServiceError::InsufficientStock(format!(
        "product {} has {} in stock, {} requested",
        product.product_id, product.stock_quantity, requested
    ))
}

async fn with_items<C>(db: &C, orders: Vec<order::Model>) -> Result<Vec<OrderDetails>, ServiceError>
where
    C: ConnectionTrait,
{
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = orders.iter().map(|o| o.order_id).collect();
    let mut items_by_order: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    for item in OrderItem::find()
        .filter(order_item::Column::OrderId.is_in(ids))
        .order_by_asc(order_item::Column::OrderItemId)
        .all(db)
        .await?
    {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.order_id).unwrap_or_default();
            OrderDetails::assemble(order, items)
        })
        .collect())
}
