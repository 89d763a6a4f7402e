use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set, TransactionTrait};

use crate::{catalog, customer, db, professional, professional_document, review, service_request, user, user_credentials};
use crate::service_request::RequestStatus;

async fn memory_db() -> anyhow::Result<DatabaseConnection> {
    let cfg = configs::DatabaseConfig { url: "sqlite::memory:".into(), ..Default::default() };
    let db = db::connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn new_user(email: &str, phone: Option<&str>, role: user::Role) -> user::NewUser {
    user::NewUser { email: email.into(), name: "Test User".into(), phone: phone.map(Into::into), role }
}

fn plumbing() -> catalog::NewService {
    catalog::NewService {
        name: "Plumbing".into(),
        base_price: 50.0,
        description: Some("pipes".into()),
        estimated_time: 60,
        category: Some("home".into()),
        is_available: true,
    }
}

#[tokio::test]
async fn migrations_apply_and_roll_back() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    assert_eq!(user::Entity::find().count(&db).await?, 0);
    migration::Migrator::down(&db, None).await?;
    assert!(user::Entity::find().count(&db).await.is_err());
    Ok(())
}

#[tokio::test]
async fn user_email_is_unique_case_insensitively() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let u = user::create(&db, &new_user("Bob@Example.com", None, user::Role::Customer)).await?;
    assert_eq!(u.email, "bob@example.com");
    assert!(u.is_active);
    assert!(user::create(&db, &new_user("bob@example.com", None, user::Role::Customer)).await.is_err());
    assert!(user::find_by_email(&db, "BOB@example.com").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn credentials_upsert_replaces_hash() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let u = user::create(&db, &new_user("c@example.com", Some("+15551234567"), user::Role::Customer)).await?;
    user_credentials::upsert_password(&db, u.id, "hash-1".into(), "argon2").await?;
    user_credentials::upsert_password(&db, u.id, "hash-2".into(), "argon2").await?;
    let cred = user_credentials::find_for_user(&db, u.id).await?.expect("credentials");
    assert_eq!(cred.password_hash, "hash-2");
    assert_eq!(user_credentials::Entity::find().count(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn deactivate_and_last_login() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let u = user::create(&db, &new_user("p@example.com", None, user::Role::Professional)).await?;
    assert!(u.last_login.is_none());
    user::touch_last_login(&db, u.id).await?;
    let u2 = user::Entity::find_by_id(u.id).one(&db).await?.expect("user");
    assert!(u2.last_login.is_some());
    let off = user::deactivate(&db, u.id).await?;
    assert!(!off.is_active);
    // 软删除：行仍然存在
    assert_eq!(user::Entity::find().count(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn request_rows_start_requested_and_unassigned() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let svc = catalog::create(&db, &plumbing()).await?;
    let cu = user::create(&db, &new_user("cust@example.com", None, user::Role::Customer)).await?;
    let cust = customer::create(&db, cu.id, &customer::NewCustomer { location: "Main St".into(), pincode: Some("12345".into()) }).await?;
    let req = service_request::create(
        &db,
        cust.id,
        &service_request::NewServiceRequest { service_id: svc.id, location: "Main St".into(), pin_code: "12345".into(), remarks: None },
    )
    .await?;
    assert_eq!(req.status, RequestStatus::Requested);
    assert!(req.professional_id.is_none());
    assert_eq!(service_request::list_available(&db, svc.id).await?.len(), 1);
    assert_eq!(service_request::list_for_customer(&db, cust.id).await?.len(), 1);

    let bad_pin = service_request::NewServiceRequest { service_id: svc.id, location: "x".into(), pin_code: "12".into(), remarks: None };
    assert!(service_request::create(&db, cust.id, &bad_pin).await.is_err());
    Ok(())
}

#[tokio::test]
async fn documents_append_and_review_is_unique_per_request() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let svc = catalog::create(&db, &plumbing()).await?;
    let pu = user::create(&db, &new_user("pro@example.com", None, user::Role::Professional)).await?;
    let pro = professional::create(
        &db,
        pu.id,
        &professional::NewProfessional { service_id: svc.id, experience_years: 3.0, bio: None, location: "Town".into(), pincode: None },
    )
    .await?;
    assert!(!pro.is_verified && !pro.document_verified);
    professional_document::create(&db, pro.id, "", "professional_documents/1/a.pdf").await?;
    professional_document::create(&db, pro.id, "license", "professional_documents/1/b.pdf").await?;
    let docs = professional_document::list_unverified(&db, pro.id).await?;
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].document_type, professional_document::DEFAULT_DOCUMENT_TYPE);

    let cu = user::create(&db, &new_user("c2@example.com", None, user::Role::Customer)).await?;
    let cust = customer::create(&db, cu.id, &customer::NewCustomer { location: "Main St".into(), pincode: None }).await?;
    let req = service_request::create(
        &db,
        cust.id,
        &service_request::NewServiceRequest { service_id: svc.id, location: "Main St".into(), pin_code: "54321".into(), remarks: None },
    )
    .await?;
    let input = review::NewReview { service_request_id: req.id, customer_id: cust.id, professional_id: pro.id, rating: 5, comment: Some("great".into()) };
    review::create(&db, &input).await?;
    assert!(review::create(&db, &input).await.is_err());
    assert!(review::create(&db, &review::NewReview { rating: 9, ..input }).await.is_err());
    Ok(())
}

#[tokio::test]
async fn transaction_rollback_discards_writes() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let txn = db.begin().await?;
    let svc = catalog::create(&txn, &plumbing()).await?;
    let mut am: catalog::ActiveModel = svc.into();
    am.is_available = Set(false);
    am.update(&txn).await?;
    txn.rollback().await?;
    assert_eq!(catalog::Entity::find().count(&db).await?, 0);
    Ok(())
}
