use thiserror::Error;

use crate::auth::errors::AuthError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }

    pub fn db(e: impl std::fmt::Display) -> Self { Self::Db(e.to_string()) }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { Self::Db(e.to_string()) }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => ServiceError::Validation(m),
            AuthError::Conflict(m) => ServiceError::Validation(m),
            AuthError::NotFound => ServiceError::not_found("User"),
            AuthError::Unauthorized | AuthError::Inactive => ServiceError::Unauthorized(e.to_string()),
            AuthError::TokenError(m) => ServiceError::Unauthorized(m),
            AuthError::HashError(m) | AuthError::Repository(m) => ServiceError::Db(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::errors::ModelError;

    #[test]
    fn auth_errors_map_to_kinds() {
        assert!(matches!(ServiceError::from(AuthError::Unauthorized), ServiceError::Unauthorized(_)));
        assert!(matches!(ServiceError::from(AuthError::Conflict("Email already registered".into())), ServiceError::Validation(_)));
        assert!(matches!(ServiceError::from(AuthError::TokenError("expired".into())), ServiceError::Unauthorized(_)));
        assert!(matches!(ServiceError::from(AuthError::Repository("boom".into())), ServiceError::Db(_)));
    }

    #[test]
    fn model_errors_wrap() {
        let e: ServiceError = ModelError::validation("bad pin").into();
        assert!(matches!(e, ServiceError::Model(ModelError::Validation(_))));
        assert_eq!(ServiceError::not_found("Service").to_string(), "not found: Service not found");
    }
}
