use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{
        customer::{self, Entity as Customer, Role},
        money,
        order::{self, Entity as Order},
        order_item::{self, Entity as OrderItem},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
};

/// Number of products reported in the sales leaderboard
pub const TOP_PRODUCTS_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyRegistrations {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserStatistics {
    pub total_customers: u64,
    pub admins: u64,
    pub customers_with_orders: u64,
    pub registrations_per_day: Vec<DailyRegistrations>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSales {
    pub product_id: i32,
    pub name: String,
    pub units_sold: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesStatistics {
    pub order_count: u64,
    pub items_sold: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
    pub top_products: Vec<ProductSales>,
}

/// Read-only aggregates for administrators
#[derive(Clone)]
pub struct StatisticsService {
    db_pool: Arc<DbPool>,
}

impl StatisticsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn user_statistics(&self) -> Result<UserStatistics, ServiceError> {
        let db = &*self.db_pool;

        let total_customers = Customer::find().count(db).await?;
        let admins = Customer::find()
            .filter(customer::Column::Role.eq(Role::Admin))
            .count(db)
            .await?;
        let customers_with_orders = Order::find()
            .select_only()
            .column(order::Column::CustomerId)
            .distinct()
            .count(db)
            .await?;

        let registrations_per_day = Customer::find()
            .select_only()
            .column(customer::Column::CreatedAt)
            .column_as(
                Expr::expr(Func::count(Expr::col(customer::Column::CustomerId))),
                "count",
            )
            .group_by(customer::Column::CreatedAt)
            .order_by_asc(customer::Column::CreatedAt)
            .into_tuple::<(NaiveDate, i64)>()
            .all(db)
            .await?
            .into_iter()
            .map(|(date, count)| DailyRegistrations { date, count })
            .collect();

        Ok(UserStatistics {
            total_customers,
            admins,
            customers_with_orders,
            registrations_per_day,
        })
    }

    #[instrument(skip(self))]
    pub async fn sales_statistics(&self) -> Result<SalesStatistics, ServiceError> {
        let db = &*self.db_pool;

        let order_count = Order::find().count(db).await?;

        // One row per product: units and revenue summed in the database
        let mut ranked = OrderItem::find()
            .select_only()
            .column(order_item::Column::ProductId)
            .column_as(
                Expr::expr(Func::sum(Expr::col(order_item::Column::Quantity))),
                "units_sold",
            )
            .column_as(
                Expr::expr(Func::sum(
                    Expr::col(order_item::Column::Quantity)
                        .mul(Expr::col(order_item::Column::UnitPrice)),
                )),
                "revenue",
            )
            .group_by(order_item::Column::ProductId)
            .into_tuple::<(i32, i64, Decimal)>()
            .all(db)
            .await?;

        let items_sold = ranked.iter().map(|(_, units, _)| units).sum();
        let revenue = ranked
            .iter()
            .map(|(_, _, revenue)| *revenue)
            .sum::<Decimal>();
        let revenue = money(revenue);

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(TOP_PRODUCTS_LIMIT);

        let ids: Vec<i32> = ranked.iter().map(|(id, _, _)| *id).collect();
        let names: HashMap<i32, String> = Product::find()
            .filter(product::Column::ProductId.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.product_id, p.name))
            .collect();

        let top_products = ranked
            .into_iter()
            .map(|(product_id, units_sold, revenue)| ProductSales {
                product_id,
                name: names.get(&product_id).cloned().unwrap_or_default(),
                units_sold,
                revenue: money(revenue),
            })
            .collect();

        Ok(SalesStatistics {
            order_count,
            items_sold,
            revenue,
            top_products,
        })
    }
}
