//! Create `professionals` table: 1:1 extension of a PROFESSIONAL user,
//! linked to the catalog service the professional offers.
//!
//! `rating` / `total_reviews` are derived counters, only written by
//! request completion.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Professionals::Table)
                    .if_not_exists()
                    .col(pk_auto(Professionals::Id))
                    .col(integer(Professionals::UserId).unique_key())
                    .col(integer(Professionals::ServiceId))
                    .col(double(Professionals::ExperienceYears))
                    .col(text_null(Professionals::Bio))
                    .col(string_len(Professionals::Location, 200))
                    .col(string_len_null(Professionals::Pincode, 10))
                    .col(boolean(Professionals::DocumentVerified).default(false))
                    .col(boolean(Professionals::IsVerified).default(false))
                    .col(double(Professionals::Rating).default(0.0))
                    .col(integer(Professionals::TotalReviews).default(0))
                    .col(boolean(Professionals::IsActive).default(true))
                    .col(timestamp_with_time_zone(Professionals::CreatedAt))
                    .col(timestamp_with_time_zone(Professionals::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_professional_user")
                            .from(Professionals::Table, Professionals::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_professional_service")
                            .from(Professionals::Table, Professionals::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Professionals::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Professionals {
    Table,
    Id,
    UserId,
    ServiceId,
    ExperienceYears,
    Bio,
    Location,
    Pincode,
    DocumentVerified,
    IsVerified,
    Rating,
    TotalReviews,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Services { Table, Id }
