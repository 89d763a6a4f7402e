use models::user::Role;
use serde::{Deserialize, Serialize};

/// Customer sign-up payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCustomerInput {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub location: String,
    #[serde(default)]
    pub pincode: Option<String>,
}

/// Professional sign-up payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterProfessionalInput {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub service_id: i32,
    pub experience_years: f64,
    #[serde(default)]
    pub bio: Option<String>,
    pub location: String,
    #[serde(default)]
    pub pincode: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: i32,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Role-specific row attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileLink {
    Missing,
    Customer { customer_id: i32 },
    Professional { professional_id: i32, verified: bool },
}

/// Access + refresh pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub email: String,
    pub role: Role,
    pub user_id: Option<i32>,
    pub is_admin: bool,
    /// Only present for professionals.
    pub is_verified: Option<bool>,
}

/// Registration result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub user: AuthUser,
    pub customer_id: Option<i32>,
    pub professional_id: Option<i32>,
    pub tokens: TokenPair,
}
