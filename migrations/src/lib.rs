pub use sea_orm_migration::prelude::*;

pub mod m20240301_000001_create_categories_table;
pub mod m20240301_000002_create_products_table;
pub mod m20240301_000003_create_customers_table;
pub mod m20240301_000004_create_orders_table;
pub mod m20240301_000005_create_order_items_table;
pub mod m20240415_000006_add_customer_credentials;

pub use m20240415_000006_add_customer_credentials::UNUSABLE_PASSWORD_HASH;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_categories_table::Migration),
            Box::new(m20240301_000002_create_products_table::Migration),
            Box::new(m20240301_000003_create_customers_table::Migration),
            Box::new(m20240301_000004_create_orders_table::Migration),
            Box::new(m20240301_000005_create_order_items_table::Migration),
            Box::new(m20240415_000006_add_customer_credentials::Migration),
        ]
    }
}
