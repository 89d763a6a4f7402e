//! Create `professional_documents` table.
//!
//! `verified_by` holds a principal label rather than a user FK because the
//! verifying administrator has no users row.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProfessionalDocuments::Table)
                    .if_not_exists()
                    .col(pk_auto(ProfessionalDocuments::Id))
                    .col(integer(ProfessionalDocuments::ProfessionalId))
                    .col(string_len(ProfessionalDocuments::DocumentType, 50))
                    .col(string_len(ProfessionalDocuments::DocumentUrl, 255))
                    .col(boolean(ProfessionalDocuments::IsVerified).default(false))
                    .col(string_len_null(ProfessionalDocuments::VerifiedBy, 160))
                    .col(timestamp_with_time_zone_null(ProfessionalDocuments::VerificationDate))
                    .col(timestamp_with_time_zone(ProfessionalDocuments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_professional")
                            .from(ProfessionalDocuments::Table, ProfessionalDocuments::ProfessionalId)
                            .to(Professionals::Table, Professionals::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ProfessionalDocuments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ProfessionalDocuments { Table, Id, ProfessionalId, DocumentType, DocumentUrl, IsVerified, VerifiedBy, VerificationDate, CreatedAt }

#[derive(DeriveIden)]
enum Professionals { Table, Id }
