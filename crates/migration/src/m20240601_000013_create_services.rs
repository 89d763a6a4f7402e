//! Create `services` table (the catalog).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(pk_auto(Services::Id))
                    .col(string_len(Services::Name, 100).unique_key())
                    .col(double(Services::BasePrice))
                    .col(text_null(Services::Description))
                    // minutes
                    .col(integer(Services::EstimatedTime))
                    .col(string_len_null(Services::Category, 50))
                    .col(boolean(Services::IsAvailable).default(true))
                    .col(boolean(Services::IsActive).default(true))
                    .col(timestamp_with_time_zone(Services::CreatedAt))
                    .col(timestamp_with_time_zone(Services::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Services { Table, Id, Name, BasePrice, Description, EstimatedTime, Category, IsAvailable, IsActive, CreatedAt, UpdatedAt }
