use sea_orm_migration::prelude::*;

use crate::m2025_10_20_000001_create_users::Users;

/// Table: interests (one row per user, categories kept as a JSON text blob)
#[derive(DeriveIden)]
enum Interests {
    Table,
    Id,
    UserId,
    Categories,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Interests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Interests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Interests::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Interests::Categories).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_interests_user")
                            .from(Interests::Table, Interests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Interests::Table).to_owned())
            .await
    }
}
