//! Catalog entries (`services` table): what customers can book.

use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub base_price: f64,
    pub description: Option<String>,
    /// Minutes.
    pub estimated_time: i32,
    pub category: Option<String>,
    pub is_available: bool,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub base_price: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub estimated_time: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool { true }

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ModelError::validation("service name required"));
    }
    if trimmed.chars().count() > 100 {
        return Err(ModelError::validation("service name too long (<=100)"));
    }
    Ok(())
}

pub fn validate_new(input: &NewService) -> Result<(), ModelError> {
    validate_name(&input.name)?;
    if !(input.base_price.is_finite() && input.base_price > 0.0) {
        return Err(ModelError::validation("Price must be greater than 0"));
    }
    if input.estimated_time <= 0 {
        return Err(ModelError::validation("Estimated time must be greater than 0"));
    }
    if let Some(cat) = &input.category {
        if cat.chars().count() > 50 {
            return Err(ModelError::validation("category too long (<=50)"));
        }
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, input: &NewService) -> Result<Model, ModelError> {
    validate_new(input)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        name: Set(input.name.trim().to_string()),
        base_price: Set(input.base_price),
        description: Set(input.description.clone()),
        estimated_time: Set(input.estimated_time),
        category: Set(input.category.clone()),
        is_available: Set(input.is_available),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewService {
        NewService {
            name: "Plumbing".into(),
            base_price: 49.5,
            description: None,
            estimated_time: 60,
            category: Some("home".into()),
            is_available: true,
        }
    }

    #[test]
    fn accepts_positive_price_and_duration() {
        assert!(validate_new(&input()).is_ok());
    }

    #[test]
    fn rejects_non_positive_price() {
        assert!(validate_new(&NewService { base_price: 0.0, ..input() }).is_err());
        assert!(validate_new(&NewService { base_price: -3.0, ..input() }).is_err());
        assert!(validate_new(&NewService { base_price: f64::NAN, ..input() }).is_err());
    }

    #[test]
    fn rejects_non_positive_duration() {
        assert!(validate_new(&NewService { estimated_time: 0, ..input() }).is_err());
    }

    #[test]
    fn rejects_blank_name() {
        assert!(validate_new(&NewService { name: " ".into(), ..input() }).is_err());
    }
}
