//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240601_000011_create_users;
mod m20240601_000012_create_user_credentials;
mod m20240601_000013_create_services;
mod m20240601_000014_create_customers;
mod m20240601_000015_create_professionals;
mod m20240601_000016_create_professional_documents;
mod m20240601_000017_create_service_requests;
mod m20240601_000018_create_reviews;
mod m20240601_000002_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000011_create_users::Migration),
            Box::new(m20240601_000012_create_user_credentials::Migration),
            Box::new(m20240601_000013_create_services::Migration),
            Box::new(m20240601_000014_create_customers::Migration),
            Box::new(m20240601_000015_create_professionals::Migration),
            Box::new(m20240601_000016_create_professional_documents::Migration),
            Box::new(m20240601_000017_create_service_requests::Migration),
            Box::new(m20240601_000018_create_reviews::Migration),
            // Indexes should always be applied last
            Box::new(m20240601_000002_add_indexes::Migration),
        ]
    }
}
