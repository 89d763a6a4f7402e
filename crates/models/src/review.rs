use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::service_request;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub service_request_id: i32,
    pub customer_id: i32,
    pub professional_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub customer_remarks: Option<String>,
    pub professional_remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { ServiceRequest }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::ServiceRequest => Entity::belongs_to(service_request::Entity)
                .from(Column::ServiceRequestId)
                .to(service_request::Column::Id)
                .into(),
        }
    }
}

impl Related<service_request::Entity> for Entity {
    fn to() -> RelationDef { Relation::ServiceRequest.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_rating(rating: i32) -> Result<(), ModelError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ModelError::validation("Rating must be between 1 and 5"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub service_request_id: i32,
    pub customer_id: i32,
    pub professional_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
}

/// 评论内容同时写入 comment 与 customer_remarks
pub async fn create<C: ConnectionTrait>(db: &C, input: &NewReview) -> Result<Model, ModelError> {
    validate_rating(input.rating)?;
    let am = ActiveModel {
        service_request_id: Set(input.service_request_id),
        customer_id: Set(input.customer_id),
        professional_id: Set(input.professional_id),
        rating: Set(input.rating),
        comment: Set(input.comment.clone()),
        customer_remarks: Set(input.comment.clone()),
        professional_remarks: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn find_for_request<C: ConnectionTrait>(db: &C, request_id: i32) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::ServiceRequestId.eq(request_id))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}
