//! The authenticated caller, resolved once per request.

use models::user::Role;
use serde::Serialize;

use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// Configured administrator; has no `users` row.
    Admin { email: String },
    Customer { user_id: i32, customer_id: i32, email: String },
    Professional { user_id: i32, professional_id: i32, email: String, verified: bool },
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Admin { .. } => Role::Admin,
            Principal::Customer { .. } => Role::Customer,
            Principal::Professional { .. } => Role::Professional,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::Admin { email } | Principal::Customer { email, .. } | Principal::Professional { email, .. } => email.as_str(),
        }
    }

    /// `None` for the administrator.
    pub fn user_id(&self) -> Option<i32> {
        match self {
            Principal::Admin { .. } => None,
            Principal::Customer { user_id, .. } | Principal::Professional { user_id, .. } => Some(*user_id),
        }
    }

    pub fn is_admin(&self) -> bool { matches!(self, Principal::Admin { .. }) }

    /// Stable identity string, stored e.g. as a document's `verified_by`.
    pub fn label(&self) -> String {
        match self {
            Principal::Admin { email } => format!("admin:{email}"),
            Principal::Customer { user_id, .. } => format!("customer:{user_id}"),
            Principal::Professional { user_id, .. } => format!("professional:{user_id}"),
        }
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() { Ok(()) } else { Err(ServiceError::forbidden("Admin access required")) }
    }

    /// Returns the customer id.
    pub fn require_customer(&self) -> Result<i32, ServiceError> {
        match self {
            Principal::Customer { customer_id, .. } => Ok(*customer_id),
            _ => Err(ServiceError::forbidden("Customer access required")),
        }
    }

    /// Returns the professional id.
    pub fn require_professional(&self) -> Result<i32, ServiceError> {
        match self {
            Principal::Professional { professional_id, .. } => Ok(*professional_id),
            _ => Err(ServiceError::forbidden("Professional access required")),
        }
    }

    pub fn require_verified_professional(&self) -> Result<i32, ServiceError> {
        match self {
            Principal::Professional { professional_id, verified: true, .. } => Ok(*professional_id),
            Principal::Professional { .. } => Err(ServiceError::forbidden("Your account must be verified to perform this action")),
            _ => Err(ServiceError::forbidden("Professional access required")),
        }
    }

    /// Any account backed by a `users` row.
    pub fn require_user(&self) -> Result<i32, ServiceError> {
        self.user_id().ok_or_else(|| ServiceError::forbidden("User account required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Principal { Principal::Admin { email: "admin@x.io".into() } }
    fn customer() -> Principal { Principal::Customer { user_id: 7, customer_id: 3, email: "c@x.io".into() } }
    fn pro(verified: bool) -> Principal {
        Principal::Professional { user_id: 9, professional_id: 4, email: "p@x.io".into(), verified }
    }

    #[test]
    fn guards_match_variants() {
        assert!(admin().require_admin().is_ok());
        assert!(customer().require_admin().is_err());
        assert_eq!(customer().require_customer().unwrap(), 3);
        assert!(pro(true).require_customer().is_err());
        assert_eq!(pro(false).require_professional().unwrap(), 4);
        assert!(admin().require_professional().is_err());
    }

    #[test]
    fn unverified_professional_is_forbidden() {
        assert!(matches!(pro(false).require_verified_professional(), Err(ServiceError::Forbidden(_))));
        assert_eq!(pro(true).require_verified_professional().unwrap(), 4);
    }

    #[test]
    fn admin_has_no_user_row() {
        assert_eq!(admin().user_id(), None);
        assert!(admin().require_user().is_err());
        assert_eq!(admin().role(), Role::Admin);
        assert_eq!(admin().label(), "admin:admin@x.io");
        assert_eq!(customer().label(), "customer:7");
    }
}
