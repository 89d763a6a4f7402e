//! Admin-only endpoints. Role checks live in the services; the export
//! handlers check here because the job registry is role-agnostic.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use common::types::MessageResponse;
use models::{catalog, professional_document, user};
use serde::{Deserialize, Serialize};
use service::jobs::export::{resolve_download, ExportStatus};
use service::jobs::ExportFilters;
use service::pagination::{Page, Pagination};
use service::principal::Principal;
use service::professionals::ProfessionalView;
use service::stats::{dashboard_stats, DashboardStats};
use service::users::CustomerView;
use tracing::info;

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, OptionalJson};
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ExportStarted {
    pub job_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

#[utoipa::path(get, path = "/api/admin/users", tag = "admin", params(("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "Page size, max 100")), responses((status = 200, description = "Page of users"), (status = 403, description = "Admins only")))]
pub async fn list_users(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(p): ApiQuery<Pagination>,
) -> Result<Json<Page<user::Model>>, JsonApiError> {
    Ok(Json(state.users.list_users(&principal, p).await?))
}

pub async fn block_user(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<BlockRequest>,
) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(state.users.block(&principal, id, &body.reason).await?))
}

pub async fn list_services(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<catalog::Model>>, JsonApiError> {
    principal.require_admin()?;
    Ok(Json(state.catalog.list().await?))
}

#[utoipa::path(post, path = "/api/admin/services", tag = "admin", request_body = crate::openapi::NewServiceDoc, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 403, description = "Admins only")))]
pub async fn create_service(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<catalog::NewService>,
) -> Result<(StatusCode, Json<catalog::Model>), JsonApiError> {
    let created = state.catalog.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(post, path = "/api/admin/professionals/verify/{id}", tag = "admin", params(("id" = i32, Path, description = "Professional id")), responses((status = 200, description = "Verified"), (status = 400, description = "No unverified documents"), (status = 404, description = "Unknown professional")))]
pub async fn verify_professional(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, JsonApiError> {
    let n = state.documents.verify(&principal, id).await?;
    Ok(Json(MessageResponse::new(format!("Professional verified successfully ({n} documents)"))))
}

pub async fn reject_professional(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, JsonApiError> {
    state.documents.reject(&principal, id).await?;
    Ok(Json(MessageResponse::new("Professional verification rejected")))
}

pub async fn reset_professional(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, JsonApiError> {
    state.documents.reset(&principal, id).await?;
    Ok(Json(MessageResponse::new("Professional verification reset")))
}

pub async fn list_professionals(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ProfessionalView>>, JsonApiError> {
    Ok(Json(state.professionals.list(&principal).await?))
}

pub async fn list_customers(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<CustomerView>>, JsonApiError> {
    Ok(Json(state.users.list_customers(&principal).await?))
}

pub async fn professional_documents(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Vec<professional_document::Model>>, JsonApiError> {
    principal.require_admin()?;
    Ok(Json(state.documents.list_for(&principal, id).await?))
}

#[utoipa::path(get, path = "/api/admin/dashboard", tag = "admin", responses((status = 200, description = "Counts"), (status = 403, description = "Admins only")))]
pub async fn dashboard(State(state): State<ServerState>, Extension(principal): Extension<Principal>) -> Result<Json<DashboardStats>, JsonApiError> {
    Ok(Json(dashboard_stats(&state.db, &principal).await?))
}

#[utoipa::path(post, path = "/api/admin/export/service-requests", tag = "admin", request_body = crate::openapi::ExportFiltersDoc, responses((status = 202, description = "Export job queued"), (status = 403, description = "Admins only")))]
pub async fn start_export(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    OptionalJson(body): OptionalJson<ExportFilters>,
) -> Result<(StatusCode, Json<ExportStarted>), JsonApiError> {
    principal.require_admin()?;
    let filters = body.unwrap_or_default();
    let job_id = state.exports.start(state.db.clone(), filters, state.export_dir.clone(), principal.label());
    info!(job_id = %job_id, "export_requested");
    Ok((StatusCode::ACCEPTED, Json(ExportStarted { job_id, status: "pending", message: "CSV export job started" })))
}

pub async fn export_status(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(job_id): ApiPath<String>,
) -> Result<Json<ExportStatus>, JsonApiError> {
    principal.require_admin()?;
    let job = state
        .exports
        .status(&job_id)
        .ok_or_else(|| JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", "Export job not found"))?;
    Ok(Json(ExportStatus::describe(&job_id, &job)))
}

pub async fn download_export(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiPath(filename): ApiPath<String>,
) -> Result<impl IntoResponse, JsonApiError> {
    principal.require_admin()?;
    let path = resolve_download(&state.export_dir, &filename).await?;
    let body = tokio::fs::read(&path).await.map_err(|e| JsonApiError::internal(e.to_string()))?;
    let disposition = format!("attachment; filename=\"{filename}\"");
    Ok(([(header::CONTENT_TYPE, "text/csv".to_string()), (header::CONTENT_DISPOSITION, disposition)], body))
}
