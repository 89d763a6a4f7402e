use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct RefreshTokenRequest { pub refresh_token: String }

#[derive(ToSchema)]
pub struct RegisterCustomerRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub location: String,
    pub pincode: Option<String>,
}

#[derive(ToSchema)]
pub struct RegisterProfessionalRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub service_id: i32,
    pub experience_years: f64,
    pub bio: Option<String>,
    pub location: String,
    pub pincode: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateServiceRequestDoc {
    pub service_id: i32,
    pub location: String,
    /// Five digits
    pub pin_code: String,
    pub remarks: Option<String>,
}

#[derive(ToSchema)]
pub struct CompleteRequestDoc {
    /// 1 to 5; when present a review is recorded
    pub rating: Option<i32>,
    pub remarks: Option<String>,
    pub review_comment: Option<String>,
}

#[derive(ToSchema)]
pub struct NewServiceDoc {
    pub name: String,
    pub base_price: f64,
    pub description: Option<String>,
    /// Minutes
    pub estimated_time: i32,
    pub category: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(ToSchema)]
pub struct ExportFiltersDoc {
    /// YYYY-MM-DD, inclusive
    pub start_date: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub end_date: Option<String>,
    pub service_id: Option<i32>,
    pub professional_id: Option<i32>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::register_customer,
        crate::routes::auth::register_professional,
        crate::routes::auth::refresh,
        crate::routes::catalog::list,
        crate::routes::professionals::by_service,
        crate::routes::professionals::upload_documents,
        crate::routes::service_requests::create,
        crate::routes::service_requests::accept,
        crate::routes::service_requests::complete,
        crate::routes::admin::list_users,
        crate::routes::admin::create_service,
        crate::routes::admin::verify_professional,
        crate::routes::admin::dashboard,
        crate::routes::admin::start_export,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            RefreshTokenRequest,
            RegisterCustomerRequest,
            RegisterProfessionalRequest,
            CreateServiceRequestDoc,
            CompleteRequestDoc,
            NewServiceDoc,
            ExportFiltersDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "catalog"),
        (name = "professionals"),
        (name = "service-requests"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
