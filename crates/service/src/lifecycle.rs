//! Service-request state machine.
//!
//! Every transition runs in its own [`UnitOfWork`] and applies its write as a
//! conditional update on the expected current state, so two callers racing on
//! the same row cannot both succeed: the loser sees zero affected rows and
//! gets the transition's validation error.
//!
//! Completion is the one multi-statement transition: status change, review
//! insert and the professional's rating update commit or roll back together.

use chrono::Utc;
use models::{
    catalog, customer, professional, review,
    service_request::{self, Column, Entity, NewServiceRequest, RequestStatus},
};
use sea_orm::{prelude::DateTimeWithTimeZone, sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::principal::Principal;
use crate::rating;
use crate::uow::UnitOfWork;

const RATING_RETRIES: usize = 3;

const NOT_AVAILABLE: &str = "Request is not available for acceptance";
const CANNOT_ASSIGN: &str = "Request cannot be assigned in current status";
const NOT_ASSIGNED: &str = "Request is not assigned";
const NOT_IN_PROGRESS: &str = "Request is not in progress";
const CANNOT_CANCEL: &str = "Request cannot be cancelled in current status";

/// Customer input when closing a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionInput {
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub review_comment: Option<String>,
}

#[derive(Clone)]
pub struct LifecycleEngine {
    db: DatabaseConnection,
}

impl LifecycleEngine {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    #[instrument(skip(self, principal, input), fields(service_id = input.service_id))]
    pub async fn create(&self, principal: &Principal, input: NewServiceRequest) -> Result<service_request::Model, ServiceError> {
        let customer_id = principal.require_customer()?;
        service_request::validate_new(&input)?;
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let conn = uow.conn();
            let svc = catalog::Entity::find_by_id(input.service_id)
                .filter(catalog::Column::IsActive.eq(true))
                .one(conn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Service"))?;
            if !svc.is_available {
                return Err(ServiceError::validation("Service is not available"));
            }
            customer::Entity::find_by_id(customer_id)
                .one(conn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Customer"))?;
            Ok::<_, ServiceError>(service_request::create(conn, customer_id, &input).await?)
        }
        .await;
        let created = uow.finish(result).await?;
        transitioned("create", created.id, principal);
        Ok(created)
    }

    /// Owning customer, assigned professional, or admin.
    pub async fn get(&self, principal: &Principal, id: i32) -> Result<service_request::Model, ServiceError> {
        let req = load(&self.db, id).await?;
        let visible = match principal {
            Principal::Admin { .. } => true,
            Principal::Customer { customer_id, .. } => req.customer_id == *customer_id,
            Principal::Professional { professional_id, .. } => req.professional_id == Some(*professional_id),
        };
        if !visible {
            return Err(ServiceError::forbidden("Unauthorized access"));
        }
        Ok(req)
    }

    pub async fn list_for_customer(&self, principal: &Principal) -> Result<Vec<service_request::Model>, ServiceError> {
        let customer_id = principal.require_customer()?;
        Ok(service_request::list_for_customer(&self.db, customer_id).await?)
    }

    pub async fn list_for_professional(&self, principal: &Principal) -> Result<Vec<service_request::Model>, ServiceError> {
        let professional_id = principal.require_professional()?;
        Ok(service_request::list_for_professional(&self.db, professional_id).await?)
    }

    /// Unassigned REQUESTED rows for the caller's own service.
    pub async fn list_available(&self, principal: &Principal) -> Result<Vec<service_request::Model>, ServiceError> {
        let professional_id = principal.require_verified_professional()?;
        let pro = professional::Entity::find_by_id(professional_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Professional"))?;
        self.available_for_service(pro.service_id).await
    }

    pub async fn available_for_service(&self, service_id: i32) -> Result<Vec<service_request::Model>, ServiceError> {
        Ok(service_request::list_available(&self.db, service_id).await?)
    }

    /// Admin direct assignment: only the professional's existence is checked.
    #[instrument(skip(self, principal))]
    pub async fn assign(&self, principal: &Principal, id: i32, professional_id: i32) -> Result<service_request::Model, ServiceError> {
        principal.require_admin()?;
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let conn = uow.conn();
            let req = load(conn, id).await?;
            if req.status != RequestStatus::Requested || req.professional_id.is_some() {
                return Err(ServiceError::validation(CANNOT_ASSIGN));
            }
            professional::Entity::find_by_id(professional_id)
                .one(conn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Professional not found".into()))?;
            if !claim(conn, id, professional_id).await? {
                return Err(ServiceError::validation(CANNOT_ASSIGN));
            }
            load(conn, id).await
        }
        .await;
        let updated = uow.finish(result).await?;
        transitioned("assign", id, principal);
        Ok(updated)
    }

    /// Professional self-accept: must be verified and offer the requested service.
    #[instrument(skip(self, principal))]
    pub async fn accept(&self, principal: &Principal, id: i32) -> Result<service_request::Model, ServiceError> {
        let professional_id = principal.require_professional()?;
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let conn = uow.conn();
            let req = load(conn, id).await?;
            if req.status != RequestStatus::Requested || req.professional_id.is_some() {
                return Err(ServiceError::validation(NOT_AVAILABLE));
            }
            let pro = professional::Entity::find_by_id(professional_id)
                .filter(professional::Column::IsVerified.eq(true))
                .one(conn)
                .await?
                .ok_or_else(|| ServiceError::validation("Professional not found or not verified"))?;
            if pro.service_id != req.service_id {
                return Err(ServiceError::validation("Professional does not provide the requested service"));
            }
            if !claim(conn, id, professional_id).await? {
                return Err(ServiceError::validation(NOT_AVAILABLE));
            }
            load(conn, id).await
        }
        .await;
        let updated = uow.finish(result).await?;
        transitioned("accept", id, principal);
        Ok(updated)
    }

    #[instrument(skip(self, principal))]
    pub async fn start(&self, principal: &Principal, id: i32) -> Result<service_request::Model, ServiceError> {
        let professional_id = principal.require_professional()?;
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let conn = uow.conn();
            let req = load(conn, id).await?;
            if req.professional_id != Some(professional_id) {
                return Err(ServiceError::forbidden("Only the assigned professional can start this service"));
            }
            if req.status != RequestStatus::Assigned {
                return Err(ServiceError::validation(NOT_ASSIGNED));
            }
            let res = Entity::update_many()
                .col_expr(Column::Status, Expr::value(RequestStatus::InProgress))
                .col_expr(Column::UpdatedAt, Expr::value(now()))
                .filter(Column::Id.eq(id))
                .filter(Column::Status.eq(RequestStatus::Assigned))
                .filter(Column::ProfessionalId.eq(professional_id))
                .exec(conn)
                .await?;
            if res.rows_affected == 0 {
                return Err(ServiceError::validation(NOT_ASSIGNED));
            }
            load(conn, id).await
        }
        .await;
        let updated = uow.finish(result).await?;
        transitioned("start", id, principal);
        Ok(updated)
    }

    /// Close the request; with a rating, also record a review and fold the
    /// score into the professional's rolling average.
    #[instrument(skip(self, principal, input), fields(rating = ?input.rating))]
    pub async fn complete(&self, principal: &Principal, id: i32, input: CompletionInput) -> Result<service_request::Model, ServiceError> {
        let customer_id = principal.require_customer()?;
        if let Some(score) = input.rating {
            review::validate_rating(score)?;
        }
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = complete_in(&uow, customer_id, id, &input).await;
        let updated = uow.finish(result).await?;
        transitioned("complete", id, principal);
        Ok(updated)
    }

    #[instrument(skip(self, principal))]
    pub async fn cancel(&self, principal: &Principal, id: i32) -> Result<service_request::Model, ServiceError> {
        let customer_id = principal.require_customer()?;
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let conn = uow.conn();
            let req = load(conn, id).await?;
            if req.customer_id != customer_id {
                return Err(ServiceError::forbidden("Only the customer can cancel this request"));
            }
            if !req.status.can_transition_to(RequestStatus::Cancelled) {
                return Err(ServiceError::validation(CANNOT_CANCEL));
            }
            let res = Entity::update_many()
                .col_expr(Column::Status, Expr::value(RequestStatus::Cancelled))
                .col_expr(Column::UpdatedAt, Expr::value(now()))
                .filter(Column::Id.eq(id))
                .filter(Column::Status.is_in(RequestStatus::cancellable()))
                .exec(conn)
                .await?;
            if res.rows_affected == 0 {
                return Err(ServiceError::validation(CANNOT_CANCEL));
            }
            load(conn, id).await
        }
        .await;
        let updated = uow.finish(result).await?;
        transitioned("cancel", id, principal);
        Ok(updated)
    }
}

fn now() -> DateTimeWithTimeZone { Utc::now().into() }

fn transitioned(transition: &str, request_id: i32, actor: &Principal) {
    common::metrics::record_transition(transition);
    info!(transition, request_id, actor = %actor.label(), "service_request_transition");
}

async fn load<C: ConnectionTrait>(conn: &C, id: i32) -> Result<service_request::Model, ServiceError> {
    Entity::find_by_id(id).one(conn).await?.ok_or_else(|| ServiceError::not_found("Service request"))
}

/// REQUESTED + unassigned -> ASSIGNED to `professional_id`. `false` if the row moved on.
async fn claim<C: ConnectionTrait>(conn: &C, id: i32, professional_id: i32) -> Result<bool, ServiceError> {
    let res = Entity::update_many()
        .col_expr(Column::ProfessionalId, Expr::value(professional_id))
        .col_expr(Column::Status, Expr::value(RequestStatus::Assigned))
        .col_expr(Column::UpdatedAt, Expr::value(now()))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(RequestStatus::Requested))
        .filter(Column::ProfessionalId.is_null())
        .exec(conn)
        .await?;
    Ok(res.rows_affected == 1)
}

async fn complete_in(uow: &UnitOfWork, customer_id: i32, id: i32, input: &CompletionInput) -> Result<service_request::Model, ServiceError> {
    let conn = uow.conn();
    let req = load(conn, id).await?;
    if req.customer_id != customer_id {
        return Err(ServiceError::forbidden("Only the customer can complete this request"));
    }
    if req.status != RequestStatus::InProgress {
        return Err(ServiceError::validation(NOT_IN_PROGRESS));
    }
    if input.rating.is_some() && req.professional_id.is_none() {
        return Err(ServiceError::validation("Cannot add review: No professional assigned"));
    }

    let ts = now();
    let res = Entity::update_many()
        .col_expr(Column::Status, Expr::value(RequestStatus::Completed))
        .col_expr(Column::CompletionDate, Expr::value(ts))
        .col_expr(Column::CustomerRemarks, Expr::value(input.remarks.clone()))
        .col_expr(Column::UpdatedAt, Expr::value(ts))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(RequestStatus::InProgress))
        .exec(conn)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::validation(NOT_IN_PROGRESS));
    }

    if let (Some(score), Some(professional_id)) = (input.rating, req.professional_id) {
        let new_review = review::NewReview {
            service_request_id: id,
            customer_id: req.customer_id,
            professional_id,
            rating: score,
            comment: input.review_comment.clone(),
        };
        review::create(conn, &new_review).await?;
        fold_rating(conn, professional_id, score).await?;
    }
    load(conn, id).await
}

/// Read-modify-write on the professional's counters, guarded by the
/// previously read `total_reviews`.
async fn fold_rating<C: ConnectionTrait>(conn: &C, professional_id: i32, score: i32) -> Result<(), ServiceError> {
    for attempt in 1..=RATING_RETRIES {
        let pro = professional::Entity::find_by_id(professional_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Professional"))?;
        let (new_rating, new_total) = rating::apply_score(pro.rating, pro.total_reviews, score)?;
        let res = professional::Entity::update_many()
            .col_expr(professional::Column::Rating, Expr::value(new_rating))
            .col_expr(professional::Column::TotalReviews, Expr::value(new_total))
            .col_expr(professional::Column::UpdatedAt, Expr::value(now()))
            .filter(professional::Column::Id.eq(professional_id))
            .filter(professional::Column::TotalReviews.eq(pro.total_reviews))
            .exec(conn)
            .await?;
        if res.rows_affected == 1 {
            return Ok(());
        }
        warn!(professional_id, attempt, "rating update raced, retrying");
    }
    Err(ServiceError::Db("professional rating changed concurrently".into()))
}
