use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use models::{catalog, customer, professional, user, user_credentials};

use crate::auth::domain::{AuthUser, Credentials, ProfileLink};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::uow::UnitOfWork;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_auth_user(u: user::Model) -> AuthUser {
    AuthUser { id: u.id, email: u.email, name: u.name, phone: u.phone, role: u.role, is_active: u.is_active }
}

fn to_credentials(c: user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_email(&self.db, email).await?.map(to_auth_user))
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_phone(&self.db, phone).await?.map(to_auth_user))
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?.map(to_auth_user))
    }

    async fn service_exists(&self, service_id: i32) -> Result<bool, AuthError> {
        let found = catalog::Entity::find_by_id(service_id)
            .filter(catalog::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn create_customer_account(&self, new_user: user::NewUser, password_hash: String, password_algorithm: String, new_customer: customer::NewCustomer) -> Result<(AuthUser, i32), AuthError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let u = user::create(uow.conn(), &new_user).await?;
            user_credentials::upsert_password(uow.conn(), u.id, password_hash, &password_algorithm).await?;
            let c = customer::create(uow.conn(), u.id, &new_customer).await?;
            Ok::<_, AuthError>((to_auth_user(u), c.id))
        }
        .await;
        uow.finish(result).await
    }

    async fn create_professional_account(&self, new_user: user::NewUser, password_hash: String, password_algorithm: String, new_pro: professional::NewProfessional) -> Result<(AuthUser, i32), AuthError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let u = user::create(uow.conn(), &new_user).await?;
            user_credentials::upsert_password(uow.conn(), u.id, password_hash, &password_algorithm).await?;
            let p = professional::create(uow.conn(), u.id, &new_pro).await?;
            Ok::<_, AuthError>((to_auth_user(u), p.id))
        }
        .await;
        uow.finish(result).await
    }

    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
        Ok(user_credentials::find_for_user(&self.db, user_id).await?.map(to_credentials))
    }

    async fn upsert_password(&self, user_id: i32, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(to_credentials(c))
    }

    async fn touch_last_login(&self, user_id: i32) -> Result<(), AuthError> {
        user::touch_last_login(&self.db, user_id).await?;
        Ok(())
    }

    async fn profile_link(&self, user_id: i32) -> Result<ProfileLink, AuthError> {
        if let Some(c) = customer::find_by_user(&self.db, user_id).await? {
            return Ok(ProfileLink::Customer { customer_id: c.id });
        }
        if let Some(p) = professional::find_by_user(&self.db, user_id).await? {
            return Ok(ProfileLink::Professional { professional_id: p.id, verified: p.is_verified });
        }
        Ok(ProfileLink::Missing)
    }
}
