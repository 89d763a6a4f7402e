pub mod admin;
pub mod auth;
pub mod catalog;
pub mod professionals;
pub mod service_requests;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use common::types::Health;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::require_principal;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> (axum::http::StatusCode, String) {
    common::metrics::encode_metrics()
}

/// Build the full application router: public, authenticated and admin routes.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    // Public routes (health, metrics, login/register, docs)
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register/customer", post(auth::register_customer))
        .route("/api/auth/register/professional", post(auth::register_professional))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout));

    let upload = Router::new()
        .route("/api/professionals/documents", post(professionals::upload_documents).get(professionals::list_documents))
        .layer(DefaultBodyLimit::max(state.upload_body_limit));

    // Routes requiring a resolved principal
    let protected = Router::new()
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/users/profile", get(users::get_profile).put(users::update_profile))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id/deactivate", post(users::deactivate))
        .route("/api/professionals/profile", get(professionals::get_profile).put(professionals::update_profile))
        .route("/api/professionals/:id", get(professionals::get))
        .route("/api/professionals/by-service/:service_id", get(professionals::by_service))
        .merge(upload)
        .route("/api/services", get(catalog::list))
        .route("/api/service-requests", post(service_requests::create))
        .route("/api/service-requests/customer", get(service_requests::list_customer))
        .route("/api/service-requests/professional", get(service_requests::list_professional))
        .route("/api/service-requests/available", get(service_requests::list_available))
        .route("/api/service-requests/:id", get(service_requests::get))
        .route("/api/service-requests/:id/assign", post(service_requests::assign))
        .route("/api/service-requests/:id/accept", post(service_requests::accept))
        .route("/api/service-requests/:id/start", post(service_requests::start))
        .route("/api/service-requests/:id/complete", post(service_requests::complete))
        .route("/api/service-requests/:id/cancel", post(service_requests::cancel))
        .nest("/api/admin", admin_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_principal));

    public
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id/block", post(admin::block_user))
        .route("/services", get(admin::list_services).post(admin::create_service))
        .route("/professionals", get(admin::list_professionals))
        .route("/professionals/verify/:id", post(admin::verify_professional))
        .route("/professionals/reject/:id", post(admin::reject_professional))
        .route("/professionals/reset/:id", post(admin::reset_professional))
        .route("/professionals/:id/documents", get(admin::professional_documents))
        .route("/customers", get(admin::list_customers))
        .route("/dashboard", get(admin::dashboard))
        .route("/export/service-requests", post(admin::start_export))
        .route("/export/status/:job_id", get(admin::export_status))
        .route("/export/download/:filename", get(admin::download_export))
}
