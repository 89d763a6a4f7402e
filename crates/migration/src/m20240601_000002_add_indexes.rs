use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: role filter used by admin listings
        manager
            .create_index(Index::create().name("idx_user_role").table(Users::Table).col(Users::Role).to_owned())
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_customer_pincode")
                    .table(Customers::Table)
                    .col(Customers::Pincode)
                    .to_owned(),
            )
            .await?;

        // Professionals: eligible-assignee lookup by (service_id, pincode)
        manager
            .create_index(
                Index::create()
                    .name("idx_professional_service_pincode")
                    .table(Professionals::Table)
                    .col(Professionals::ServiceId)
                    .col(Professionals::Pincode)
                    .to_owned(),
            )
            .await?;

        // ServiceRequests: per-owner listings and available-requests scan
        manager
            .create_index(
                Index::create()
                    .name("idx_request_customer")
                    .table(ServiceRequests::Table)
                    .col(ServiceRequests::CustomerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_request_professional")
                    .table(ServiceRequests::Table)
                    .col(ServiceRequests::ProfessionalId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_request_service_status")
                    .table(ServiceRequests::Table)
                    .col(ServiceRequests::ServiceId)
                    .col(ServiceRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_professional")
                    .table(ProfessionalDocuments::Table)
                    .col(ProfessionalDocuments::ProfessionalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_category")
                    .table(Services::Table)
                    .col(Services::Category)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_user_role").table(Users::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_customer_pincode").table(Customers::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_professional_service_pincode").table(Professionals::Table).to_owned())
            .await?;
        for name in ["idx_request_customer", "idx_request_professional", "idx_request_service_status"] {
            manager
                .drop_index(Index::drop().name(name).table(ServiceRequests::Table).to_owned())
                .await?;
        }
        manager
            .drop_index(Index::drop().name("idx_document_professional").table(ProfessionalDocuments::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_category").table(Services::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Role }

#[derive(DeriveIden)]
enum Customers { Table, Pincode }

#[derive(DeriveIden)]
enum Professionals { Table, ServiceId, Pincode }

#[derive(DeriveIden)]
enum ServiceRequests { Table, CustomerId, ProfessionalId, ServiceId, Status }

#[derive(DeriveIden)]
enum ProfessionalDocuments { Table, ProfessionalId }

#[derive(DeriveIden)]
enum Services { Table, Category }
