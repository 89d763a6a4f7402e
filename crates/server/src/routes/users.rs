use axum::{
    extract::State,
    Extension, Json,
};
use models::user;
use service::principal::Principal;
use service::users::{Profile, ProfileUpdate};

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::ServerState;

pub async fn get_profile(State(state): State<ServerState>, Extension(principal): Extension<Principal>) -> Result<Json<Profile>, JsonApiError> {
    Ok(Json(state.users.profile(&principal).await?))
}

pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Profile>, JsonApiError> {
    Ok(Json(state.users.update_profile(&principal, update).await?))
}

pub async fn get_user(State(state): State<ServerState>, Extension(principal): Extension<Principal>, ApiPath(id): ApiPath<i32>) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(state.users.get_user(&principal, id).await?))
}

pub async fn deactivate(State(state): State<ServerState>, Extension(principal): Extension<Principal>, ApiPath(id): ApiPath<i32>) -> Result<Json<user::Model>, JsonApiError> {
    Ok(Json(state.users.deactivate(&principal, id).await?))
}
