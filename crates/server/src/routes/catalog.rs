use axum::{extract::State, Json};
use models::catalog;

use crate::errors::JsonApiError;
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/services", tag = "catalog", responses((status = 200, description = "Active services")))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<catalog::Model>>, JsonApiError> {
    Ok(Json(state.catalog.list().await?))
}
