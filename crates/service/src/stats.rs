use std::collections::BTreeMap;

use models::{customer, professional, service_request, service_request::RequestStatus, user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Iterable, PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::errors::ServiceError;
use crate::principal::Principal;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_customers: u64,
    pub total_professionals: u64,
    pub total_service_requests: u64,
    /// Active professionals not yet verified.
    pub pending_verifications: u64,
    pub requests_by_status: BTreeMap<String, u64>,
}

pub async fn dashboard_stats(db: &DatabaseConnection, principal: &Principal) -> Result<DashboardStats, ServiceError> {
    principal.require_admin()?;
    let mut requests_by_status = BTreeMap::new();
    for status in RequestStatus::iter() {
        let n = service_request::Entity::find()
            .filter(service_request::Column::Status.eq(status))
            .count(db)
            .await?;
        requests_by_status.insert(status.as_str().to_string(), n);
    }
    Ok(DashboardStats {
        total_users: user::Entity::find().count(db).await?,
        total_customers: customer::Entity::find().count(db).await?,
        total_professionals: professional::Entity::find().count(db).await?,
        total_service_requests: service_request::Entity::find().count(db).await?,
        pending_verifications: professional::Entity::find()
            .filter(professional::Column::IsActive.eq(true))
            .filter(professional::Column::IsVerified.eq(false))
            .count(db)
            .await?,
        requests_by_status,
    })
}
