use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use models::service_request::{self, NewServiceRequest};
use serde::Deserialize;
use service::lifecycle::CompletionInput;
use service::principal::Principal;

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, OptionalJson};
use crate::state::ServerState;

type RequestResult = Result<Json<service_request::Model>, JsonApiError>;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub professional_id: i32,
}

#[utoipa::path(post, path = "/api/service-requests", tag = "service-requests", request_body = crate::openapi::CreateServiceRequestDoc, responses((status = 201, description = "Created in REQUESTED"), (status = 400, description = "Bad Request"), (status = 403, description = "Customers only")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<NewServiceRequest>,
) -> Result<(StatusCode, Json<service_request::Model>), JsonApiError> {
    let created = state.lifecycle.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(State(state): State<ServerState>, Extension(principal): Extension<Principal>, ApiPath(id): ApiPath<i32>) -> RequestResult {
    Ok(Json(state.lifecycle.get(&principal, id).await?))
}

pub async fn list_customer(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<service_request::Model>>, JsonApiError> {
    Ok(Json(state.lifecycle.list_for_customer(&principal).await?))
}

pub async fn list_professional(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<service_request::Model>>, JsonApiError> {
    Ok(Json(state.lifecycle.list_for_professional(&principal).await?))
}

pub async fn list_available(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<service_request::Model>>, JsonApiError> {
    Ok(Json(state.lifecycle.list_available(&principal).await?))
}

pub async fn assign(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<AssignRequest>,
) -> RequestResult {
    Ok(Json(state.lifecycle.assign(&principal, id, body.professional_id).await?))
}

#[utoipa::path(post, path = "/api/service-requests/{id}/accept", tag = "service-requests", params(("id" = i32, Path, description = "Service request id")), responses((status = 200, description = "Now ASSIGNED to the caller"), (status = 400, description = "Not available"), (status = 403, description = "Verified professionals only")))]
pub async fn accept(State(state): State<ServerState>, Extension(principal): Extension<Principal>, ApiPath(id): ApiPath<i32>) -> RequestResult {
    // 接单入口要求已认证的专业人员
    principal.require_verified_professional()?;
    Ok(Json(state.lifecycle.accept(&principal, id).await?))
}

pub async fn start(State(state): State<ServerState>, Extension(principal): Extension<Principal>, ApiPath(id): ApiPath<i32>) -> RequestResult {
    Ok(Json(state.lifecycle.start(&principal, id).await?))
}

#[utoipa::path(post, path = "/api/service-requests/{id}/complete", tag = "service-requests", params(("id" = i32, Path, description = "Service request id")), request_body = crate::openapi::CompleteRequestDoc, responses((status = 200, description = "COMPLETED"), (status = 400, description = "Not in progress or bad rating")))]
pub async fn complete(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<i32>,
    OptionalJson(body): OptionalJson<CompletionInput>,
) -> RequestResult {
    // 空请求体表示不评分；无法解析的请求体直接拒绝，不能推进状态
    let input = body.unwrap_or_default();
    Ok(Json(state.lifecycle.complete(&principal, id, input).await?))
}

pub async fn cancel(State(state): State<ServerState>, Extension(principal): Extension<Principal>, ApiPath(id): ApiPath<i32>) -> RequestResult {
    Ok(Json(state.lifecycle.cancel(&principal, id).await?))
}
