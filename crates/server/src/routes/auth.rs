use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::types::MessageResponse;
use serde::{Deserialize, Serialize};
use service::auth::domain::{AuthSession, LoginInput, RegisterCustomerInput, RegisterProfessionalInput, Registration};
use service::principal::Principal;

use crate::errors::JsonApiError;
use crate::extract::{ApiJson};
use crate::middleware::AUTH_COOKIE;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, ApiJson(input): ApiJson<LoginInput>) -> Result<(CookieJar, Json<AuthSession>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let jar = jar.add(session_cookie(session.access_token.clone()));
    Ok((jar, Json(session)))
}

#[utoipa::path(post, path = "/api/auth/register/customer", tag = "auth", request_body = crate::openapi::RegisterCustomerRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request")))]
pub async fn register_customer(State(state): State<ServerState>, ApiJson(input): ApiJson<RegisterCustomerInput>) -> Result<(StatusCode, Json<Registration>), JsonApiError> {
    let reg = state.auth.register_customer(input).await?;
    Ok((StatusCode::CREATED, Json(reg)))
}

#[utoipa::path(post, path = "/api/auth/register/professional", tag = "auth", request_body = crate::openapi::RegisterProfessionalRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request")))]
pub async fn register_professional(State(state): State<ServerState>, ApiJson(input): ApiJson<RegisterProfessionalInput>) -> Result<(StatusCode, Json<Registration>), JsonApiError> {
    let reg = state.auth.register_professional(input).await?;
    Ok((StatusCode::CREATED, Json(reg)))
}

#[utoipa::path(post, path = "/api/auth/refresh", tag = "auth", request_body = crate::openapi::RefreshTokenRequest, responses((status = 200, description = "New access token"), (status = 401, description = "Unauthorized")))]
pub async fn refresh(State(state): State<ServerState>, ApiJson(input): ApiJson<RefreshRequest>) -> Result<Json<RefreshResponse>, JsonApiError> {
    let access_token = state.auth.refresh(&input.refresh_token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

pub async fn change_password(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, JsonApiError> {
    let user_id = principal.require_user()?;
    state.auth.change_password(user_id, &input.old_password, &input.new_password).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, Json(MessageResponse::new("Logged out")))
}
