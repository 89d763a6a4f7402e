#![cfg(test)]
use migration::MigratorTrait;
use models::{catalog, customer, professional, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::principal::Principal;

/// Fresh in-memory database with all migrations applied; one per test.
pub async fn memory_db() -> Result<DatabaseConnection, anyhow::Error> {
    let cfg = configs::DatabaseConfig { url: "sqlite::memory:".into(), ..Default::default() };
    let db = models::db::connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn admin() -> Principal {
    Principal::Admin { email: "admin@example.com".into() }
}

pub async fn seed_service(db: &DatabaseConnection, name: &str) -> Result<catalog::Model, anyhow::Error> {
    let input = catalog::NewService {
        name: name.into(),
        base_price: 40.0,
        description: None,
        estimated_time: 90,
        category: Some("home".into()),
        is_available: true,
    };
    Ok(catalog::create(db, &input).await?)
}

pub async fn seed_customer(db: &DatabaseConnection, email: &str) -> Result<Principal, anyhow::Error> {
    let u = user::create(db, &user::NewUser { email: email.into(), name: "Casey Customer".into(), phone: None, role: user::Role::Customer }).await?;
    let c = customer::create(db, u.id, &customer::NewCustomer { location: "1 Elm St".into(), pincode: Some("10001".into()) }).await?;
    Ok(Principal::Customer { user_id: u.id, customer_id: c.id, email: u.email })
}

pub async fn seed_professional(db: &DatabaseConnection, email: &str, service_id: i32, verified: bool) -> Result<Principal, anyhow::Error> {
    let u = user::create(db, &user::NewUser { email: email.into(), name: "Pat Pro".into(), phone: None, role: user::Role::Professional }).await?;
    let input = professional::NewProfessional { service_id, experience_years: 4.0, bio: None, location: "2 Oak St".into(), pincode: Some("10001".into()) };
    let p = professional::create(db, u.id, &input).await?;
    if verified {
        let mut am: professional::ActiveModel = p.clone().into();
        am.is_verified = Set(true);
        am.document_verified = Set(true);
        am.update(db).await?;
    }
    Ok(Principal::Professional { user_id: u.id, professional_id: p.id, email: u.email, verified })
}

pub async fn professional_row(db: &DatabaseConnection, principal: &Principal) -> Result<professional::Model, anyhow::Error> {
    let id = principal.require_professional()?;
    professional::Entity::find_by_id(id).one(db).await?.ok_or_else(|| anyhow::anyhow!("professional {id} missing"))
}
