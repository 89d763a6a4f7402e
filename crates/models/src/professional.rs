use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{catalog, user, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "professionals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub service_id: i32,
    pub experience_years: f64,
    pub bio: Option<String>,
    pub location: String,
    pub pincode: Option<String>,
    pub document_verified: bool,
    pub is_verified: bool,
    pub rating: f64,
    pub total_reviews: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Service,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Service => Entity::belongs_to(catalog::Entity).from(Column::ServiceId).to(catalog::Column::Id).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<catalog::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfessional {
    pub service_id: i32,
    pub experience_years: f64,
    #[serde(default)]
    pub bio: Option<String>,
    pub location: String,
    #[serde(default)]
    pub pincode: Option<String>,
}

pub fn validate_experience(years: f64) -> Result<(), ModelError> {
    if !(0.0..=50.0).contains(&years) {
        return Err(ModelError::validation("Experience must be between 0 and 50 years"));
    }
    Ok(())
}

pub fn validate_new(input: &NewProfessional) -> Result<(), ModelError> {
    validate_experience(input.experience_years)?;
    validation::validate_location(&input.location)?;
    if let Some(pin) = &input.pincode {
        validation::validate_pincode(pin)?;
    }
    Ok(())
}

/// New professionals start unverified with an empty rating.
pub async fn create<C: ConnectionTrait>(db: &C, user_id: i32, input: &NewProfessional) -> Result<Model, ModelError> {
    validate_new(input)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        user_id: Set(user_id),
        service_id: Set(input.service_id),
        experience_years: Set(input.experience_years),
        bio: Set(input.bio.clone()),
        location: Set(input.location.trim().to_string()),
        pincode: Set(input.pincode.clone()),
        document_verified: Set(false),
        is_verified: Set(false),
        rating: Set(0.0),
        total_reviews: Set(0),
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
