use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::errors::JsonApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Bearer token from `Authorization`, falling back to the `auth_token` cookie.
fn bearer_token(req: &Request) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let h = h.to_str().map_err(|_| JsonApiError::unauthorized("Invalid Authorization header"))?;
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(JsonApiError::unauthorized("Invalid Authorization format (expect Bearer)")),
        };
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|v| !v.is_empty()))
}

/// 受保护路由：解析 access token 并把 Principal 放进请求扩展
pub async fn require_principal(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = bearer_token(&req)? else {
        warn!(path = %path, "missing Authorization header and auth_token cookie");
        return Err(JsonApiError::unauthorized("Authentication required"));
    };
    let principal = state.auth.resolve_principal(&token).await.map_err(|e| {
        warn!(path = %path, error = %e, "token validation failed");
        JsonApiError::from(e)
    })?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
