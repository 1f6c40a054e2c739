use sea_orm_migration::prelude::*;

use crate::m2025_10_20_000001_create_users::Users;

/// Table: admin_logs (append-only audit trail)
#[derive(DeriveIden)]
enum AdminLogs {
    Table,
    Id,
    AdminId,
    Action,
    TargetType,
    TargetId,
    Details,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminLogs::AdminId).big_integer().not_null())
                    .col(ColumnDef::new(AdminLogs::Action).string().not_null())
                    .col(ColumnDef::new(AdminLogs::TargetType).string().not_null())
                    .col(ColumnDef::new(AdminLogs::TargetId).string().not_null())
                    .col(ColumnDef::new(AdminLogs::Details).text().null())
                    .col(
                        ColumnDef::new(AdminLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_logs_admin")
                            .from(AdminLogs::Table, AdminLogs::AdminId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_logs_created")
                    .table(AdminLogs::Table)
                    .col(AdminLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminLogs::Table).to_owned())
            .await
    }
}
