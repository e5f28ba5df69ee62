//! Schema tests run against the migrations directly, without the HTTP layer.

use assert_matches::assert_matches;
use chrono::Utc;
use clothing_store::db;
use migrations::{
    m20240301_000001_create_categories_table, m20240415_000006_add_customer_credentials,
    Migrator, MigratorTrait, UNUSABLE_PASSWORD_HASH,
};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, QueryResult, Statement,
};
use sea_orm_migration::{MigrationTrait, SchemaManager};

async fn migrated() -> DatabaseConnection {
    let pool = db::connect_in_memory().await.expect("connect");
    db::run_migrations(&pool).await.expect("migrate");
    pool
}

async fn exec(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
        .await
        .map(|_| ())
}

async fn query_one(db: &DatabaseConnection, sql: &str) -> QueryResult {
    db.query_one(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
        .await
        .expect("query")
        .expect("one row")
}

#[tokio::test]
async fn migrator_rerun_is_a_no_op() {
    let db = migrated().await;
    exec(&db, "INSERT INTO categories (name) VALUES ('Tops')")
        .await
        .unwrap();

    Migrator::up(&db, None).await.expect("second run");

    assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    let row = query_one(&db, "SELECT COUNT(*) AS n FROM categories").await;
    assert_eq!(row.try_get::<i64>("", "n").unwrap(), 1);
}

#[tokio::test]
async fn single_migration_applies_twice() {
    let db = migrated().await;
    let manager = SchemaManager::new(&db);

    m20240301_000001_create_categories_table::Migration
        .up(&manager)
        .await
        .expect("categories again");
    m20240415_000006_add_customer_credentials::Migration
        .up(&manager)
        .await
        .expect("credentials again");

    assert!(manager.has_table("categories").await.unwrap());
    assert!(manager.has_column("customers", "password_hash").await.unwrap());
}

#[tokio::test]
async fn schema_can_be_rolled_back_and_reapplied() {
    let db = migrated().await;

    Migrator::down(&db, None).await.expect("down");
    let manager = SchemaManager::new(&db);
    assert!(!manager.has_table("order_items").await.unwrap());
    assert!(!manager.has_table("categories").await.unwrap());

    Migrator::up(&db, None).await.expect("up again");
    assert!(manager.has_table("order_items").await.unwrap());
}

#[tokio::test]
async fn order_item_requires_existing_order_and_product() {
    let db = migrated().await;

    let err = exec(
        &db,
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES (999, 999, 1, 9.99)",
    )
    .await
    .unwrap_err();
    assert_matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_))
    );
}

#[tokio::test]
async fn duplicate_customer_email_is_rejected() {
    let db = migrated().await;
    let insert = "INSERT INTO customers (first_name, last_name, email) VALUES ('A', 'B', 'dup@example.com')";

    exec(&db, insert).await.expect("first insert");
    let err = exec(&db, insert).await.unwrap_err();
    assert_matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    );
}

#[tokio::test]
async fn dates_and_status_default_on_insert() {
    let db = migrated().await;
    exec(
        &db,
        "INSERT INTO customers (first_name, last_name, email) VALUES ('Ada', 'L', 'ada@example.com')",
    )
    .await
    .unwrap();
    exec(&db, "INSERT INTO orders (customer_id) VALUES (1)")
        .await
        .unwrap();

    let today = Utc::now().date_naive().to_string();
    let order = query_one(&db, "SELECT order_date, status FROM orders WHERE order_id = 1").await;
    assert_eq!(order.try_get::<String>("", "order_date").unwrap(), today);
    assert_eq!(order.try_get::<String>("", "status").unwrap(), "pending");

    let customer = query_one(
        &db,
        "SELECT created_at, role, password_hash FROM customers WHERE customer_id = 1",
    )
    .await;
    assert_eq!(customer.try_get::<String>("", "created_at").unwrap(), today);
    assert_eq!(customer.try_get::<String>("", "role").unwrap(), "customer");
    assert_eq!(
        customer.try_get::<String>("", "password_hash").unwrap(),
        UNUSABLE_PASSWORD_HASH
    );
}

#[tokio::test]
async fn credentials_are_backfilled_for_existing_customers() {
    let db = db::connect_in_memory().await.unwrap();
    // Everything before the credentials migration
    Migrator::up(&db, Some(5)).await.unwrap();
    exec(
        &db,
        "INSERT INTO customers (first_name, last_name, email) VALUES ('Old', 'Timer', 'old@example.com')",
    )
    .await
    .unwrap();

    Migrator::up(&db, None).await.unwrap();

    let row = query_one(&db, "SELECT password_hash, role FROM customers").await;
    assert_eq!(
        row.try_get::<String>("", "password_hash").unwrap(),
        UNUSABLE_PASSWORD_HASH
    );
    assert_eq!(row.try_get::<String>("", "role").unwrap(), "customer");

    let err = exec(
        &db,
        "INSERT INTO customers (first_name, last_name, email, password_hash) VALUES ('N', 'U', 'n@example.com', NULL)",
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbErr::Exec(_));
}

#[tokio::test]
async fn deleting_category_detaches_products() {
    let db = migrated().await;
    exec(&db, "INSERT INTO categories (name) VALUES ('Hats')")
        .await
        .unwrap();
    exec(
        &db,
        "INSERT INTO products (name, price, category_id) VALUES ('Cap', 12.50, 1)",
    )
    .await
    .unwrap();

    exec(&db, "DELETE FROM categories WHERE category_id = 1")
        .await
        .unwrap();

    let row = query_one(&db, "SELECT category_id, stock_quantity FROM products").await;
    assert_eq!(row.try_get::<Option<i32>>("", "category_id").unwrap(), None);
    assert_eq!(row.try_get::<i32>("", "stock_quantity").unwrap(), 0);
}
