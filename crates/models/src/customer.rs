use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{user, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub location: String,
    pub pincode: Option<String>,
    pub rating: f64,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub location: String,
    #[serde(default)]
    pub pincode: Option<String>,
}

pub fn validate_new(input: &NewCustomer) -> Result<(), ModelError> {
    validation::validate_location(&input.location)?;
    if let Some(pin) = &input.pincode {
        validation::validate_pincode(pin)?;
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, user_id: i32, input: &NewCustomer) -> Result<Model, ModelError> {
    validate_new(input)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        user_id: Set(user_id),
        location: Set(input.location.trim().to_string()),
        pincode: Set(input.pincode.clone()),
        rating: Set(0.0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}
