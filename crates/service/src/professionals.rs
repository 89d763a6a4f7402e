//! Read side for professionals: lookups and the eligible-by-service listing.

use models::{catalog, professional, user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::errors::ServiceError;
use crate::principal::Principal;

#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalView {
    #[serde(flatten)]
    pub professional: professional::Model,
    pub user: Option<user::Model>,
}

#[derive(Clone)]
pub struct ProfessionalService {
    db: DatabaseConnection,
}

impl ProfessionalService {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    pub async fn get(&self, id: i32) -> Result<ProfessionalView, ServiceError> {
        let (professional, user) = professional::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Professional"))?;
        Ok(ProfessionalView { professional, user })
    }

    /// Active, document-verified and verified professionals for one service,
    /// optionally narrowed to a pincode.
    pub async fn by_service(&self, service_id: i32, pincode: Option<&str>) -> Result<Vec<ProfessionalView>, ServiceError> {
        catalog::Entity::find_by_id(service_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service"))?;
        let mut q = professional::Entity::find()
            .filter(professional::Column::ServiceId.eq(service_id))
            .filter(professional::Column::IsActive.eq(true))
            .filter(professional::Column::DocumentVerified.eq(true))
            .filter(professional::Column::IsVerified.eq(true));
        if let Some(pin) = pincode.map(str::trim).filter(|p| !p.is_empty()) {
            q = q.filter(professional::Column::Pincode.eq(pin));
        }
        let rows = q
            .order_by_desc(professional::Column::Rating)
            .order_by_asc(professional::Column::Id)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(professional, user)| ProfessionalView { professional, user }).collect())
    }

    /// All active professionals, verified or not (admin).
    pub async fn list(&self, principal: &Principal) -> Result<Vec<ProfessionalView>, ServiceError> {
        principal.require_admin()?;
        let rows = professional::Entity::find()
            .filter(professional::Column::IsActive.eq(true))
            .order_by_asc(professional::Column::Id)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(professional, user)| ProfessionalView { professional, user }).collect())
    }
}
