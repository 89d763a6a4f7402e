//! Booking rows and the status enumeration that drives the lifecycle.
//!
//! The transition graph lives here so that both the engine and its tests
//! agree on which moves are legal:
//!
//! ```text
//! REQUESTED -> ASSIGNED -> IN_PROGRESS -> COMPLETED
//!     \___________\____________\______-> CANCELLED
//! ```
//!
//! `REJECTED` is terminal and has no inbound transition exposed over HTTP.

use std::fmt;

use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{catalog, customer, professional, validation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    #[sea_orm(string_value = "REQUESTED")]
    Requested,
    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Requested => "REQUESTED",
            RequestStatus::Assigned => "ASSIGNED",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Cancelled => "CANCELLED",
            RequestStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled | RequestStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        match (self, next) {
            (Requested, Assigned) | (Assigned, InProgress) | (InProgress, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// States from which a customer may cancel.
    pub fn cancellable() -> [RequestStatus; 3] {
        [RequestStatus::Requested, RequestStatus::Assigned, RequestStatus::InProgress]
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub service_id: i32,
    pub customer_id: i32,
    pub professional_id: Option<i32>,
    pub status: RequestStatus,
    pub request_time: DateTimeWithTimeZone,
    pub completion_date: Option<DateTimeWithTimeZone>,
    pub location: String,
    pub pin_code: String,
    pub remarks: Option<String>,
    pub customer_remarks: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
    Customer,
    Professional,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(catalog::Entity).from(Column::ServiceId).to(catalog::Column::Id).into(),
            Relation::Customer => Entity::belongs_to(customer::Entity).from(Column::CustomerId).to(customer::Column::Id).into(),
            Relation::Professional => Entity::belongs_to(professional::Entity)
                .from(Column::ProfessionalId)
                .to(professional::Column::Id)
                .into(),
        }
    }
}

impl Related<catalog::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Customer.def() }
}

impl Related<professional::Entity> for Entity {
    fn to() -> RelationDef { Relation::Professional.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub service_id: i32,
    pub location: String,
    pub pin_code: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

pub fn validate_new(input: &NewServiceRequest) -> Result<(), ModelError> {
    validation::validate_location(&input.location)?;
    validation::validate_pincode(&input.pin_code)?;
    Ok(())
}

/// 新建请求：状态为 REQUESTED，未分配专业人员
pub async fn create<C: ConnectionTrait>(db: &C, customer_id: i32, input: &NewServiceRequest) -> Result<Model, ModelError> {
    validate_new(input)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        service_id: Set(input.service_id),
        customer_id: Set(customer_id),
        professional_id: Set(None),
        status: Set(RequestStatus::Requested),
        request_time: Set(now),
        completion_date: Set(None),
        location: Set(input.location.trim().to_string()),
        pin_code: Set(input.pin_code.trim().to_string()),
        remarks: Set(input.remarks.clone()),
        customer_remarks: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn list_for_customer<C: ConnectionTrait>(db: &C, customer_id: i32) -> Result<Vec<Model>, ModelError> {
    Entity::find()
        .filter(Column::CustomerId.eq(customer_id))
        .order_by_desc(Column::RequestTime)
        .order_by_desc(Column::Id)
        .all(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn list_for_professional<C: ConnectionTrait>(db: &C, professional_id: i32) -> Result<Vec<Model>, ModelError> {
    Entity::find()
        .filter(Column::ProfessionalId.eq(professional_id))
        .order_by_desc(Column::RequestTime)
        .order_by_desc(Column::Id)
        .all(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

/// Unassigned REQUESTED rows for one service.
pub async fn list_available<C: ConnectionTrait>(db: &C, service_id: i32) -> Result<Vec<Model>, ModelError> {
    Entity::find()
        .filter(Column::ServiceId.eq(service_id))
        .filter(Column::Status.eq(RequestStatus::Requested))
        .filter(Column::ProfessionalId.is_null())
        .order_by_asc(Column::RequestTime)
        .order_by_asc(Column::Id)
        .all(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}
