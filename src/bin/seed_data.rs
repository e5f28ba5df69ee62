//! Seed data script - populates the database with the demo catalog
//!
//! Run with: cargo run --bin seed-data -- --admin-email owner@example.com
//!
//! Creates the demo categories and products that are missing and, when an
//! admin email is given, an administrator account. Re-running is harmless.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use clothing_store::{
    config, db,
    seed::{self, AdminSeed},
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the clothing store with demo data")]
struct Args {
    /// Apply pending migrations before seeding
    #[arg(long)]
    migrate: bool,

    /// Email of the administrator account to create
    #[arg(long, env = "SEED_ADMIN_EMAIL")]
    admin_email: Option<String>,

    /// Password for the administrator account
    #[arg(long, env = "SEED_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    #[arg(long, default_value = "Store")]
    admin_first_name: String,

    #[arg(long, default_value = "Admin")]
    admin_last_name: String,

    /// Overwrite the password of an existing admin account
    #[arg(long)]
    reset_admin_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json());

    let admin = match (args.admin_email, args.admin_password) {
        (Some(email), Some(password)) => Some(AdminSeed {
            email,
            password,
            first_name: args.admin_first_name,
            last_name: args.admin_last_name,
        }),
        (Some(_), None) => bail!("--admin-password (or SEED_ADMIN_PASSWORD) is required with --admin-email"),
        (None, _) => None,
    };

    info!(mode = %cfg.mode, "=== Clothing Store Seed Data ===");
    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to database")?;
    if args.migrate {
        db::run_migrations(&pool).await?;
    }

    let pool = Arc::new(pool);
    let report = seed::seed_all(&pool, admin, args.reset_admin_password).await?;

    info!(
        categories = report.categories_created,
        products = report.products_created,
        admin_created = report.admin_created,
        "=== Seed Data Complete ==="
    );
    Ok(())
}
