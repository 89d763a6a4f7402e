//! Create `service_requests` table, the booking lifecycle rows.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceRequests::Table)
                    .if_not_exists()
                    .col(pk_auto(ServiceRequests::Id))
                    .col(integer(ServiceRequests::ServiceId))
                    .col(integer(ServiceRequests::CustomerId))
                    .col(integer_null(ServiceRequests::ProfessionalId))
                    .col(string_len(ServiceRequests::Status, 32))
                    .col(timestamp_with_time_zone(ServiceRequests::RequestTime))
                    .col(timestamp_with_time_zone_null(ServiceRequests::CompletionDate))
                    .col(string_len(ServiceRequests::Location, 200))
                    .col(string_len(ServiceRequests::PinCode, 20))
                    .col(text_null(ServiceRequests::Remarks))
                    .col(text_null(ServiceRequests::CustomerRemarks))
                    .col(boolean(ServiceRequests::IsActive).default(true))
                    .col(timestamp_with_time_zone(ServiceRequests::CreatedAt))
                    .col(timestamp_with_time_zone(ServiceRequests::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_service")
                            .from(ServiceRequests::Table, ServiceRequests::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_customer")
                            .from(ServiceRequests::Table, ServiceRequests::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_professional")
                            .from(ServiceRequests::Table, ServiceRequests::ProfessionalId)
                            .to(Professionals::Table, Professionals::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceRequests::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceRequests {
    Table,
    Id,
    ServiceId,
    CustomerId,
    ProfessionalId,
    Status,
    RequestTime,
    CompletionDate,
    Location,
    PinCode,
    Remarks,
    CustomerRemarks,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Services { Table, Id }

#[derive(DeriveIden)]
enum Customers { Table, Id }

#[derive(DeriveIden)]
enum Professionals { Table, Id }
