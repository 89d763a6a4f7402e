//! Profile and account administration.

use chrono::Utc;
use models::{customer, professional, user, user::Role, validation};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::principal::Principal;
use crate::uow::UnitOfWork;

/// The caller's identity plus its role-specific row.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub role: Role,
    pub email: String,
    pub user: Option<user::Model>,
    pub customer: Option<customer::Model>,
    pub professional: Option<professional::Model>,
}

/// Fields a user may change on their own profile. Absent fields are left as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub pincode: Option<String>,
    pub bio: Option<String>,
    pub experience_years: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: customer::Model,
    pub user: Option<user::Model>,
}

#[derive(Clone)]
pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    pub async fn profile(&self, principal: &Principal) -> Result<Profile, ServiceError> {
        let Some(user_id) = principal.user_id() else {
            return Ok(Profile { role: Role::Admin, email: principal.email().to_string(), user: None, customer: None, professional: None });
        };
        let u = user::Entity::find_by_id(user_id).one(&self.db).await?.ok_or_else(|| ServiceError::not_found("User"))?;
        let (c, p) = match principal {
            Principal::Customer { customer_id, .. } => (customer::Entity::find_by_id(*customer_id).one(&self.db).await?, None),
            Principal::Professional { professional_id, .. } => (None, professional::Entity::find_by_id(*professional_id).one(&self.db).await?),
            Principal::Admin { .. } => (None, None),
        };
        Ok(Profile { role: u.role, email: u.email.clone(), user: Some(u), customer: c, professional: p })
    }

    #[instrument(skip(self, principal, update), fields(by = %principal.label()))]
    pub async fn update_profile(&self, principal: &Principal, update: ProfileUpdate) -> Result<Profile, ServiceError> {
        let user_id = principal.require_user()?;
        validate_update(principal, &update)?;

        let uow = UnitOfWork::begin(&self.db).await?;
        let result = apply_update(&uow, principal, user_id, &update).await;
        uow.finish(result).await?;
        info!(user_id, "profile_updated");
        self.profile(principal).await
    }

    pub async fn get_user(&self, principal: &Principal, id: i32) -> Result<user::Model, ServiceError> {
        principal.require_admin()?;
        user::Entity::find_by_id(id).one(&self.db).await?.ok_or_else(|| ServiceError::not_found("User"))
    }

    /// Soft-deactivate a user and its role row. Admins may deactivate anyone, users only themselves.
    #[instrument(skip(self, principal), fields(by = %principal.label()))]
    pub async fn deactivate(&self, principal: &Principal, id: i32) -> Result<user::Model, ServiceError> {
        if !principal.is_admin() && principal.user_id() != Some(id) {
            return Err(ServiceError::forbidden("Not allowed to deactivate this user"));
        }
        let updated = self.deactivate_inner(id).await?;
        info!(user_id = id, "user_deactivated");
        Ok(updated)
    }

    /// Admin block: same effect as deactivation, with a mandatory reason.
    #[instrument(skip(self, principal, reason), fields(by = %principal.label()))]
    pub async fn block(&self, principal: &Principal, id: i32, reason: &str) -> Result<user::Model, ServiceError> {
        principal.require_admin()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::validation("Reason for blocking must be provided"));
        }
        let updated = self.deactivate_inner(id).await?;
        warn!(user_id = id, admin = %principal.label(), reason, "user_blocked");
        Ok(updated)
    }

    pub async fn list_users(&self, principal: &Principal, pagination: Pagination) -> Result<Page<user::Model>, ServiceError> {
        principal.require_admin()?;
        let (idx, per_page) = pagination.normalize();
        let paginator = user::Entity::find().order_by_asc(user::Column::Id).paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(idx).await?;
        Ok(Page::new(items, idx, per_page, total))
    }

    pub async fn list_customers(&self, principal: &Principal) -> Result<Vec<CustomerView>, ServiceError> {
        principal.require_admin()?;
        let rows = customer::Entity::find()
            .filter(customer::Column::IsActive.eq(true))
            .order_by_asc(customer::Column::Id)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(customer, user)| CustomerView { customer, user }).collect())
    }

    async fn deactivate_inner(&self, id: i32) -> Result<user::Model, ServiceError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            user::Entity::find_by_id(id).one(uow.conn()).await?.ok_or_else(|| ServiceError::not_found("User"))?;
            let updated = user::deactivate(uow.conn(), id).await?;
            let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
            customer::Entity::update_many()
                .col_expr(customer::Column::IsActive, Expr::value(false))
                .col_expr(customer::Column::UpdatedAt, Expr::value(now))
                .filter(customer::Column::UserId.eq(id))
                .exec(uow.conn())
                .await?;
            professional::Entity::update_many()
                .col_expr(professional::Column::IsActive, Expr::value(false))
                .col_expr(professional::Column::UpdatedAt, Expr::value(now))
                .filter(professional::Column::UserId.eq(id))
                .exec(uow.conn())
                .await?;
            Ok::<_, ServiceError>(updated)
        }
        .await;
        uow.finish(result).await
    }
}

fn validate_update(principal: &Principal, update: &ProfileUpdate) -> Result<(), ServiceError> {
    if let Some(name) = &update.name {
        validation::validate_name(name)?;
    }
    if let Some(phone) = &update.phone {
        validation::validate_phone(phone)?;
    }
    if let Some(location) = &update.location {
        validation::validate_location(location)?;
    }
    if let Some(pin) = &update.pincode {
        validation::validate_pincode(pin)?;
    }
    let is_pro = matches!(principal, Principal::Professional { .. });
    if !is_pro && (update.bio.is_some() || update.experience_years.is_some()) {
        return Err(ServiceError::validation("bio and experience apply to professionals only"));
    }
    if let Some(years) = update.experience_years {
        professional::validate_experience(years)?;
    }
    Ok(())
}

const PHONE_TAKEN: &str = "User with this phone number already exists";

/// 并发更新绕过前置检查时，由唯一约束兜底
pub(crate) fn phone_update_error(e: DbErr) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::validation(PHONE_TAKEN),
        _ => ServiceError::from(e),
    }
}

async fn apply_update(uow: &UnitOfWork, principal: &Principal, user_id: i32, update: &ProfileUpdate) -> Result<(), ServiceError> {
    let conn = uow.conn();
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

    if let Some(phone) = &update.phone {
        if let Some(other) = user::find_by_phone(conn, phone).await? {
            if other.id != user_id {
                return Err(ServiceError::validation(PHONE_TAKEN));
            }
        }
    }

    let u = user::Entity::find_by_id(user_id).one(conn).await?.ok_or_else(|| ServiceError::not_found("User"))?;
    let mut um: user::ActiveModel = u.into();
    if let Some(name) = &update.name {
        um.name = Set(name.trim().to_string());
    }
    if let Some(phone) = &update.phone {
        um.phone = Set(Some(phone.clone()));
    }
    um.updated_at = Set(now);
    um.update(conn).await.map_err(phone_update_error)?;

    match principal {
        Principal::Customer { customer_id, .. } => {
            let c = customer::Entity::find_by_id(*customer_id).one(conn).await?.ok_or_else(|| ServiceError::not_found("Customer"))?;
            let mut cm: customer::ActiveModel = c.into();
            if let Some(location) = &update.location {
                cm.location = Set(location.trim().to_string());
            }
            if let Some(pin) = &update.pincode {
                cm.pincode = Set(Some(pin.clone()));
            }
            cm.updated_at = Set(now);
            cm.update(conn).await?;
        }
        Principal::Professional { professional_id, .. } => {
            let p = professional::Entity::find_by_id(*professional_id)
                .one(conn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Professional"))?;
            let mut pm: professional::ActiveModel = p.into();
            if let Some(location) = &update.location {
                pm.location = Set(location.trim().to_string());
            }
            if let Some(pin) = &update.pincode {
                pm.pincode = Set(Some(pin.clone()));
            }
            if let Some(bio) = &update.bio {
                pm.bio = Set(Some(bio.clone()));
            }
            if let Some(years) = update.experience_years {
                pm.experience_years = Set(years);
            }
            pm.updated_at = Set(now);
            pm.update(conn).await?;
        }
        Principal::Admin { .. } => {}
    }
    Ok(())
}
