//! Demo catalog and admin bootstrap. Every step looks up existing rows
//! first, so seeding an already seeded database changes nothing.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{info, instrument, warn};

use crate::{
    db::DbPool,
    entities::{category, customer::Role, product},
    errors::ServiceError,
    services::{
        categories::{CategoryInput, CategoryService},
        customers::{CustomerService, RegisterCustomer},
        products::{ProductInput, ProductService},
    },
};

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    stock: i32,
    category: &'static str,
}

const DEMO_CATEGORIES: [&str; 4] = ["Tops", "Bottoms", "Outerwear", "Accessories"];

fn demo_products() -> Vec<DemoProduct> {
    vec![
        DemoProduct {
            name: "Classic White Tee",
            description: "Heavyweight organic cotton crew neck",
            price: dec!(19.99),
            stock: 120,
            category: "Tops",
        },
        DemoProduct {
            name: "Oxford Button-Down",
            description: "Slim fit, light blue",
            price: dec!(49.50),
            stock: 60,
            category: "Tops",
        },
        DemoProduct {
            name: "Selvedge Denim Jeans",
            description: "Straight leg, raw indigo",
            price: dec!(89.00),
            stock: 40,
            category: "Bottoms",
        },
        DemoProduct {
            name: "Chino Shorts",
            description: "Stone, 7 inch inseam",
            price: dec!(34.95),
            stock: 75,
            category: "Bottoms",
        },
        DemoProduct {
            name: "Wool Overcoat",
            description: "Charcoal, knee length",
            price: dec!(199.00),
            stock: 15,
            category: "Outerwear",
        },
        DemoProduct {
            name: "Rain Shell",
            description: "Packable waterproof jacket",
            price: dec!(79.00),
            stock: 30,
            category: "Outerwear",
        },
        DemoProduct {
            name: "Leather Belt",
            description: "Full grain, brass buckle",
            price: dec!(29.00),
            stock: 90,
            category: "Accessories",
        },
        DemoProduct {
            name: "Merino Beanie",
            description: "Ribbed knit, one size",
            price: dec!(24.00),
            stock: 0,
            category: "Accessories",
        },
    ]
}

/// Credentials for the bootstrap administrator
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// What a seeding run created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    pub products_created: usize,
    pub admin_created: bool,
}

/// Inserts the demo categories and products that are not there yet.
#[instrument(skip(db))]
pub async fn seed_catalog(db: &Arc<DbPool>) -> Result<SeedReport, ServiceError> {
    let categories = CategoryService::new(db.clone());
    let products = ProductService::new(db.clone());
    let mut report = SeedReport::default();

    for name in DEMO_CATEGORIES {
        let exists = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(&**db)
            .await?
            .is_some();
        if !exists {
            categories
                .create_category(CategoryInput {
                    name: Some(name.to_string()),
                })
                .await?;
            report.categories_created += 1;
        }
    }

    for demo in demo_products() {
        let exists = product::Entity::find()
            .filter(product::Column::Name.eq(demo.name))
            .one(&**db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let category_id = category::Entity::find()
            .filter(category::Column::Name.eq(demo.category))
            .one(&**db)
            .await?
            .map(|c| c.category_id);

        products
            .create_product(ProductInput {
                name: demo.name.to_string(),
                description: Some(demo.description.to_string()),
                price: demo.price,
                stock_quantity: demo.stock,
                category_id,
            })
            .await?;
        report.products_created += 1;
    }

    info!(
        categories = report.categories_created,
        products = report.products_created,
        "Demo catalog seeded"
    );
    Ok(report)
}

/// Creates the admin account unless the email is already registered.
/// With `reset_password` an existing admin gets the supplied password.
/// An email held by a regular customer is refused, never promoted.
#[instrument(skip(db, admin), fields(email = %admin.email))]
pub async fn seed_admin(
    db: &Arc<DbPool>,
    admin: AdminSeed,
    reset_password: bool,
) -> Result<bool, ServiceError> {
    let customers = CustomerService::new(db.clone());

    if let Some(existing) = customers.find_by_email(&admin.email).await? {
        if !existing.is_admin() {
            warn!(customer_id = existing.customer_id, "Seed email belongs to a customer account");
            return Err(ServiceError::Conflict(format!(
                "{} is registered to a non-admin account",
                existing.email
            )));
        }
        if reset_password {
            customers
                .set_password(existing.customer_id, &admin.password)
                .await?;
            info!(customer_id = existing.customer_id, "Admin password reset");
        } else {
            info!(customer_id = existing.customer_id, "Admin account already present");
        }
        return Ok(false);
    }

    let created = customers
        .register_with_role(
            RegisterCustomer {
                first_name: admin.first_name,
                last_name: admin.last_name,
                email: admin.email,
                password: admin.password,
            },
            Role::Admin,
        )
        .await?;
    info!(customer_id = created.customer_id, "Admin account created");
    Ok(true)
}

/// Seeds the catalog and, when credentials are given, the admin account.
pub async fn seed_all(
    db: &Arc<DbPool>,
    admin: Option<AdminSeed>,
    reset_password: bool,
) -> Result<SeedReport, ServiceError> {
    let mut report = seed_catalog(db).await?;
    if let Some(admin) = admin {
        report.admin_created = seed_admin(db, admin, reset_password).await?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, run_migrations};
    use assert_matches::assert_matches;

    async fn migrated() -> Arc<DbPool> {
        let db = connect_in_memory().await.unwrap();
        run_migrations(&db).await.unwrap();
        Arc::new(db)
    }

    fn admin() -> AdminSeed {
        AdminSeed {
            email: "Owner@Example.com".into(),
            password: "store-owner-pass".into(),
            first_name: "Store".into(),
            last_name: "Owner".into(),
        }
    }

    #[tokio::test]
    async fn seeding_twice_creates_rows_once() {
        let db = migrated().await;

        let first = seed_all(&db, Some(admin()), false).await.unwrap();
        assert_eq!(first.categories_created, DEMO_CATEGORIES.len());
        assert_eq!(first.products_created, demo_products().len());
        assert!(first.admin_created);

        let second = seed_all(&db, Some(admin()), false).await.unwrap();
        assert_eq!(second, SeedReport::default());
    }

    #[tokio::test]
    async fn admin_can_log_in_and_password_reset_applies() {
        let db = migrated().await;
        seed_admin(&db, admin(), false).await.unwrap();

        let customers = CustomerService::new(db.clone());
        let account = customers
            .authenticate("owner@example.com", "store-owner-pass")
            .await
            .unwrap();
        assert!(account.is_admin());

        let mut changed = admin();
        changed.password = "a-brand-new-secret".into();
        assert!(!seed_admin(&db, changed, true).await.unwrap());
        assert!(customers
            .authenticate("owner@example.com", "a-brand-new-secret")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn customer_email_is_not_taken_over_by_admin_seed() {
        let db = migrated().await;
        let customers = CustomerService::new(db.clone());
        customers
            .register(RegisterCustomer {
                first_name: "Regular".into(),
                last_name: "Shopper".into(),
                email: "owner@example.com".into(),
                password: "shopper-password".into(),
            })
            .await
            .unwrap();

        assert_matches!(
            seed_admin(&db, admin(), true).await,
            Err(ServiceError::Conflict(_))
        );

        let account = customers
            .authenticate("owner@example.com", "shopper-password")
            .await
            .unwrap();
        assert!(!account.is_admin());
    }
}
