use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DbBackend};

use super::m20240301_000003_create_customers_table::Customers;

/// Hash marker for accounts that predate credentials. It never verifies.
pub const UNUSABLE_PASSWORD_HASH: &str = "!";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        if !manager
            .has_column("customers", Credentials::PasswordHash.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Credentials::PasswordHash);
            col.string_len(255);
            if backend == DbBackend::Sqlite {
                // SQLite cannot tighten nullability after the fact.
                col.not_null().default(UNUSABLE_PASSWORD_HASH);
            } else {
                col.null();
            }
            manager
                .alter_table(
                    Table::alter()
                        .table(Customers::Table)
                        .add_column(col)
                        .to_owned(),
                )
                .await?;
        }

        let backfill = Query::update()
            .table(Customers::Table)
            .value(Credentials::PasswordHash, UNUSABLE_PASSWORD_HASH)
            .and_where(Expr::col(Credentials::PasswordHash).is_null())
            .to_owned();
        manager
            .get_connection()
            .execute(backend.build(&backfill))
            .await?;

        if backend != DbBackend::Sqlite {
            manager
                .alter_table(
                    Table::alter()
                        .table(Customers::Table)
                        .modify_column(
                            ColumnDef::new(Credentials::PasswordHash)
                                .string_len(255)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;
        }

        if !manager
            .has_column("customers", Credentials::Role.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Credentials::Role);
            col.string_len(20).not_null().default("customer");
            manager
                .alter_table(
                    Table::alter()
                        .table(Customers::Table)
                        .add_column(col)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for column in [Credentials::Role, Credentials::PasswordHash] {
            if manager
                .has_column("customers", column.to_string().as_str())
                .await?
            {
                manager
                    .alter_table(
                        Table::alter()
                            .table(Customers::Table)
                            .drop_column(column)
                            .to_owned(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Credentials {
    PasswordHash,
    Role,
}
