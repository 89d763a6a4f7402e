//! Create `reviews` table. At most one review per service request.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(pk_auto(Reviews::Id))
                    .col(integer(Reviews::ServiceRequestId).unique_key())
                    .col(integer(Reviews::CustomerId))
                    .col(integer(Reviews::ProfessionalId))
                    .col(integer(Reviews::Rating))
                    .col(text_null(Reviews::Comment))
                    .col(text_null(Reviews::CustomerRemarks))
                    .col(text_null(Reviews::ProfessionalRemarks))
                    .col(timestamp_with_time_zone(Reviews::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_request")
                            .from(Reviews::Table, Reviews::ServiceRequestId)
                            .to(ServiceRequests::Table, ServiceRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Reviews { Table, Id, ServiceRequestId, CustomerId, ProfessionalId, Rating, Comment, CustomerRemarks, ProfessionalRemarks, CreatedAt }

#[derive(DeriveIden)]
enum ServiceRequests { Table, Id }
