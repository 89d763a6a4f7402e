use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use models::professional_document;
use serde::Deserialize;
use service::documents::{UploadedDocument, UploadedFile};
use service::principal::Principal;
use service::professionals::ProfessionalView;
use service::users::{Profile, ProfileUpdate};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct PincodeQuery {
    pub pincode: Option<String>,
}

pub async fn get_profile(State(state): State<ServerState>, Extension(principal): Extension<Principal>) -> Result<Json<Profile>, JsonApiError> {
    principal.require_professional()?;
    Ok(Json(state.users.profile(&principal).await?))
}

pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Profile>, JsonApiError> {
    principal.require_professional()?;
    Ok(Json(state.users.update_profile(&principal, update).await?))
}

pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<i32>) -> Result<Json<ProfessionalView>, JsonApiError> {
    Ok(Json(state.professionals.get(id).await?))
}

#[utoipa::path(get, path = "/api/professionals/by-service/{service_id}", tag = "professionals", params(("service_id" = i32, Path, description = "Service id"), ("pincode" = Option<String>, Query, description = "Restrict to a pincode")), responses((status = 200, description = "Eligible professionals"), (status = 404, description = "Unknown service")))]
pub async fn by_service(
    State(state): State<ServerState>,
    ApiPath(service_id): ApiPath<i32>,
    ApiQuery(q): ApiQuery<PincodeQuery>,
) -> Result<Json<Vec<ProfessionalView>>, JsonApiError> {
    Ok(Json(state.professionals.by_service(service_id, q.pincode.as_deref()).await?))
}

/// Multipart form: one or more `documents` file fields and an optional `document_type` text field.
#[utoipa::path(post, path = "/api/professionals/documents", tag = "professionals", responses((status = 201, description = "Stored, pending verification"), (status = 400, description = "Rejected file")))]
pub async fn upload_documents(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Vec<UploadedDocument>>), JsonApiError> {
    principal.require_professional()?;
    let mut multipart = multipart.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
    let mut files = Vec::new();
    let mut document_type = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| JsonApiError::bad_request(e.body_text()))? {
        match field.name() {
            Some("document_type") => {
                document_type = Some(field.text().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?);
            }
            Some("documents") | Some("document") | Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| JsonApiError::bad_request(e.body_text()))?;
                files.push(UploadedFile { file_name, bytes: bytes.to_vec() });
            }
            _ => {}
        }
    }
    let docs = state.documents.upload(&principal, files, document_type).await?;
    Ok((StatusCode::CREATED, Json(docs)))
}

pub async fn list_documents(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<professional_document::Model>>, JsonApiError> {
    Ok(Json(state.documents.list_own(&principal).await?))
}
