use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation;

/// Closed set of roles. Persisted and serialized as `ADMIN` / `PROFESSIONAL` / `CUSTOMER`.
///
/// Only `Professional` and `Customer` ever appear in the `users` table; the
/// administrator is a configured principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "PROFESSIONAL")]
    Professional,
    #[sea_orm(string_value = "CUSTOMER")]
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Professional => "PROFESSIONAL",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "PROFESSIONAL" => Ok(Role::Professional),
            "CUSTOMER" => Ok(Role::Customer),
            other => Err(ModelError::validation(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub role: Role,
    #[sea_orm(unique)]
    pub phone: Option<String>,
    pub name: String,
    pub last_login: Option<DateTimeWithTimeZone>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Fields needed to create an identity row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

pub fn validate_new(input: &NewUser) -> Result<(), ModelError> {
    validation::validate_email(&input.email)?;
    validation::validate_name(&input.name)?;
    if let Some(phone) = &input.phone {
        validation::validate_phone(phone)?;
    }
    if input.role == Role::Admin {
        return Err(ModelError::validation("admin accounts cannot be registered"));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, input: &NewUser) -> Result<Model, ModelError> {
    validate_new(input)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        email: Set(input.email.trim().to_lowercase()),
        role: Set(input.role),
        phone: Set(input.phone.clone()),
        name: Set(input.name.trim().to_string()),
        last_login: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn find_by_phone<C: ConnectionTrait>(db: &C, phone: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Phone.eq(phone))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

/// Soft delete: users are never removed, only deactivated.
pub async fn deactivate<C: ConnectionTrait>(db: &C, id: i32) -> Result<Model, ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))?
        .ok_or_else(|| ModelError::validation("user not found"))?
        .into();
    found.is_active = Set(false);
    found.updated_at = Set(Utc::now().into());
    found.update(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn touch_last_login<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), ModelError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    Entity::update_many()
        .col_expr(Column::LastLogin, Expr::value(now))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))?;
    Ok(())
}
