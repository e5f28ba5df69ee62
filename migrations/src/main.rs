use sea_orm_migration::prelude::*;

/// Migration CLI. Reads `DATABASE_URL` and accepts the usual sea-orm-migration
/// subcommands (`up`, `down`, `status`, `fresh`, `refresh`, `reset`).
/// Log output is configured by the CLI itself; pass `-v` for SQL tracing.
#[tokio::main]
async fn main() {
    cli::run_cli(migrations::Migrator).await;
}
