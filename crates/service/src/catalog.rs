//! Catalog of bookable services. Admins create; everyone authenticated can list.

use models::catalog;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::principal::Principal;

#[derive(Clone)]
pub struct CatalogService {
    db: DatabaseConnection,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    #[instrument(skip(self, principal, input), fields(name = %input.name))]
    pub async fn create(&self, principal: &Principal, input: catalog::NewService) -> Result<catalog::Model, ServiceError> {
        principal.require_admin()?;
        catalog::validate_new(&input)?;
        let exists = catalog::Entity::find()
            .filter(catalog::Column::Name.eq(input.name.trim()))
            .filter(catalog::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;
        if exists.is_some() {
            return Err(ServiceError::validation("Service with this name already exists"));
        }
        let created = catalog::create(&self.db, &input).await?;
        info!(service_id = created.id, by = %principal.label(), "service_created");
        Ok(created)
    }

    /// Active services ordered by name.
    pub async fn list(&self) -> Result<Vec<catalog::Model>, ServiceError> {
        Ok(catalog::Entity::find()
            .filter(catalog::Column::IsActive.eq(true))
            .order_by_asc(catalog::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<catalog::Model, ServiceError> {
        catalog::Entity::find_by_id(id)
            .filter(catalog::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service"))
    }
}
