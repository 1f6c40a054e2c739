use sea_orm_migration::prelude::*;

use crate::m2025_10_20_000001_create_users::Users;

/// Table: saved_articles (bookmarks keyed by user and source URL)
#[derive(DeriveIden)]
enum SavedArticles {
    Table,
    Id,
    UserId,
    ArticleId,
    Title,
    Description,
    Url,
    ImageUrl,
    Source,
    Category,
    PublishedAt,
    SavedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavedArticles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavedArticles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavedArticles::UserId).big_integer().not_null())
                    .col(ColumnDef::new(SavedArticles::ArticleId).text().not_null())
                    .col(ColumnDef::new(SavedArticles::Title).text().not_null())
                    .col(ColumnDef::new(SavedArticles::Description).text().null())
                    .col(ColumnDef::new(SavedArticles::Url).text().not_null())
                    .col(ColumnDef::new(SavedArticles::ImageUrl).text().null())
                    .col(ColumnDef::new(SavedArticles::Source).string().null())
                    .col(ColumnDef::new(SavedArticles::Category).string().null())
                    .col(ColumnDef::new(SavedArticles::PublishedAt).string().null())
                    .col(
                        ColumnDef::new(SavedArticles::SavedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_saved_articles_user")
                            .from(SavedArticles::Table, SavedArticles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // at most one bookmark per (user, article)
        manager
            .create_index(
                Index::create()
                    .name("idx_saved_articles_user_article")
                    .table(SavedArticles::Table)
                    .col(SavedArticles::UserId)
                    .col(SavedArticles::ArticleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SavedArticles::Table).to_owned())
            .await
    }
}
