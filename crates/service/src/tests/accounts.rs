use std::sync::Arc;

use models::{catalog::NewService, user, user::Role};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::auth::domain::{LoginInput, RegisterCustomerInput, RegisterProfessionalInput};
use crate::auth::errors::AuthError;
use crate::auth::repo::seaorm::SeaOrmAuthRepository;
use crate::auth::service::{AdminAccount, AuthConfig, AuthService};
use crate::auth::token::TokenIssuer;
use crate::catalog::CatalogService;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::principal::Principal;
use crate::professionals::ProfessionalService;
use crate::stats::dashboard_stats;
use crate::test_support::{admin, memory_db, seed_customer, seed_professional, seed_service};
use crate::users::{phone_update_error, ProfileUpdate, UserService};

fn auth(db: &DatabaseConnection) -> AuthService<SeaOrmAuthRepository> {
    let admin = AdminAccount { email: "admin@example.com".into(), password: "Adm1nPass".into() };
    let cfg = AuthConfig { tokens: TokenIssuer::new("test-secret", 15, 7), password_algorithm: "argon2".into(), admin: Some(admin) };
    AuthService::new(Arc::new(SeaOrmAuthRepository::new(db.clone())), cfg)
}

fn customer_input(email: &str) -> RegisterCustomerInput {
    RegisterCustomerInput {
        email: email.into(),
        password: "Secret123".into(),
        name: "Casey".into(),
        phone: Some("415550001".into()),
        location: "1 Elm St".into(),
        pincode: Some("10001".into()),
    }
}

#[tokio::test]
async fn register_login_and_resolve_customer() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let svc = auth(&db);
    let reg = svc.register_customer(customer_input("Casey@Example.com")).await?;
    assert_eq!(reg.user.email, "casey@example.com");
    assert_eq!(reg.user.role, Role::Customer);
    let customer_id = reg.customer_id.ok_or_else(|| anyhow::anyhow!("no customer row"))?;

    let dup = svc.register_customer(customer_input("casey@example.com")).await;
    assert!(matches!(dup, Err(AuthError::Conflict(_))));
    let same_phone = svc.register_customer(customer_input("other@example.com")).await;
    assert!(matches!(same_phone, Err(AuthError::Conflict(_))));

    let session = svc.login(LoginInput { email: "casey@example.com".into(), password: "Secret123".into() }).await?;
    assert!(!session.is_admin);
    assert_eq!(session.user_id, Some(reg.user.id));
    let stored = user::Entity::find_by_id(reg.user.id).one(&db).await?.unwrap();
    assert!(stored.last_login.is_some());

    match svc.resolve_principal(&session.access_token).await? {
        Principal::Customer { user_id, customer_id: cid, .. } => {
            assert_eq!(user_id, reg.user.id);
            assert_eq!(cid, customer_id);
        }
        other => panic!("unexpected principal {other:?}"),
    }
    // refresh token 不能当 access token 用
    assert!(svc.resolve_principal(&session.refresh_token).await.is_err());

    let wrong = svc.login(LoginInput { email: "casey@example.com".into(), password: "Wrong1234".into() }).await;
    assert!(matches!(wrong, Err(AuthError::Unauthorized)));
    Ok(())
}

#[tokio::test]
async fn professional_registration_requires_known_service() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let svc = auth(&db);
    let plumbing = seed_service(&db, "Plumbing").await?;
    let input = |service_id| RegisterProfessionalInput {
        email: "pat@example.com".into(),
        password: "Secret123".into(),
        name: "Pat".into(),
        phone: None,
        service_id,
        experience_years: 3.0,
        bio: None,
        location: "2 Oak St".into(),
        pincode: None,
    };
    assert!(svc.register_professional(input(999)).await.is_err());
    let reg = svc.register_professional(input(plumbing.id)).await?;
    assert!(reg.professional_id.is_some());

    let session = svc.login(LoginInput { email: "pat@example.com".into(), password: "Secret123".into() }).await?;
    assert_eq!(session.is_verified, Some(false));
    match svc.resolve_principal(&session.access_token).await? {
        Principal::Professional { verified, .. } => assert!(!verified),
        other => panic!("unexpected principal {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn blocked_user_cannot_log_in() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let svc = auth(&db);
    let users = UserService::new(db.clone());
    let reg = svc.register_customer(customer_input("casey@example.com")).await?;
    let session = svc.login(LoginInput { email: "casey@example.com".into(), password: "Secret123".into() }).await?;

    let err = users.block(&admin(), reg.user.id, "  ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref m) if m == "Reason for blocking must be provided"));
    users.block(&admin(), reg.user.id, "fraud").await?;

    let res = svc.login(LoginInput { email: "casey@example.com".into(), password: "Secret123".into() }).await;
    assert!(matches!(res, Err(AuthError::Inactive)));
    assert!(matches!(svc.resolve_principal(&session.access_token).await, Err(AuthError::Inactive)));
    Ok(())
}

#[tokio::test]
async fn admin_is_config_only() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let svc = auth(&db);
    let session = svc.login(LoginInput { email: "ADMIN@example.com".into(), password: "Adm1nPass".into() }).await?;
    assert!(session.is_admin);
    assert!(matches!(svc.resolve_principal(&session.access_token).await?, Principal::Admin { .. }));
    assert!(svc.register_customer(customer_input("admin@example.com")).await.is_err());
    Ok(())
}

#[tokio::test]
async fn profile_update_and_deactivation() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let users = UserService::new(db.clone());
    let casey = seed_customer(&db, "casey@example.com").await?;
    let other = seed_customer(&db, "other@example.com").await?;

    let update = ProfileUpdate { name: Some("Casey C".into()), phone: Some("415550002".into()), location: Some("9 Pine St".into()), ..Default::default() };
    let profile = users.update_profile(&casey, update).await?;
    assert_eq!(profile.user.as_ref().map(|u| u.name.as_str()), Some("Casey C"));
    assert_eq!(profile.customer.as_ref().map(|c| c.location.as_str()), Some("9 Pine St"));

    let clash = ProfileUpdate { phone: Some("415550002".into()), ..Default::default() };
    assert!(matches!(users.update_profile(&other, clash).await, Err(ServiceError::Validation(_))));

    // 绕过前置检查直接写库：唯一约束冲突同样映射为校验错误
    let raw = user::ActiveModel { id: Set(other.user_id().unwrap_or_default()), phone: Set(Some("415550002".into())), ..Default::default() }
        .update(&db)
        .await
        .expect_err("unique phone");
    assert!(matches!(phone_update_error(raw), ServiceError::Validation(ref m) if m == "User with this phone number already exists"));
    assert!(matches!(phone_update_error(sea_orm::DbErr::Custom("boom".into())), ServiceError::Db(_)));

    let other_id = other.user_id().unwrap_or_default();
    assert!(matches!(users.deactivate(&casey, other_id).await, Err(ServiceError::Forbidden(_))));
    assert!(!users.deactivate(&other, other_id).await?.is_active);
    assert_eq!(users.list_customers(&admin()).await?.len(), 1);

    let page = users.list_users(&admin(), Pagination { page: 1, per_page: 1 }).await?;
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert!(matches!(users.list_users(&casey, Pagination::default()).await, Err(ServiceError::Forbidden(_))));
    Ok(())
}

#[tokio::test]
async fn catalog_and_professional_listing() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let catalog = CatalogService::new(db.clone());
    let new = |name: &str| NewService {
        name: name.into(),
        base_price: 25.0,
        description: None,
        estimated_time: 60,
        category: None,
        is_available: true,
    };
    let casey = seed_customer(&db, "casey@example.com").await?;
    assert!(matches!(catalog.create(&casey, new("Painting")).await, Err(ServiceError::Forbidden(_))));
    let painting = catalog.create(&admin(), new("Painting")).await?;
    assert!(matches!(catalog.create(&admin(), new("Painting")).await, Err(ServiceError::Validation(_))));
    assert_eq!(catalog.list().await?.len(), 1);

    let pros = ProfessionalService::new(db.clone());
    seed_professional(&db, "a@example.com", painting.id, true).await?;
    seed_professional(&db, "b@example.com", painting.id, false).await?;
    assert_eq!(pros.by_service(painting.id, None).await?.len(), 1);
    assert!(pros.by_service(painting.id, Some("99999")).await?.is_empty());
    assert_eq!(pros.list(&admin()).await?.len(), 2);
    assert!(matches!(pros.by_service(777, None).await, Err(ServiceError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn dashboard_counts() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let svc = seed_service(&db, "Plumbing").await?;
    let casey = seed_customer(&db, "casey@example.com").await?;
    seed_professional(&db, "a@example.com", svc.id, true).await?;
    seed_professional(&db, "b@example.com", svc.id, false).await?;

    let stats = dashboard_stats(&db, &admin()).await?;
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_customers, 1);
    assert_eq!(stats.total_professionals, 2);
    assert_eq!(stats.pending_verifications, 1);
    assert_eq!(stats.requests_by_status.get("REQUESTED"), Some(&0));
    assert!(matches!(dashboard_stats(&db, &casey).await, Err(ServiceError::Forbidden(_))));
    Ok(())
}
