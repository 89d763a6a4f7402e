use async_trait::async_trait;
use models::{customer::NewCustomer, professional::NewProfessional, user::NewUser};

use super::domain::{AuthUser, Credentials, ProfileLink};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
///
/// Account creation is a single call so an implementation can write the user,
/// its credentials and the role row atomically.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: i32) -> Result<Option<AuthUser>, AuthError>;
    async fn service_exists(&self, service_id: i32) -> Result<bool, AuthError>;

    async fn create_customer_account(&self, user: NewUser, password_hash: String, password_algorithm: String, customer: NewCustomer) -> Result<(AuthUser, i32), AuthError>;
    async fn create_professional_account(&self, user: NewUser, password_hash: String, password_algorithm: String, professional: NewProfessional) -> Result<(AuthUser, i32), AuthError>;

    async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: i32, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
    async fn touch_last_login(&self, user_id: i32) -> Result<(), AuthError>;
    async fn profile_link(&self, user_id: i32) -> Result<ProfileLink, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    pub struct MockAuthRepository {
        users: Mutex<HashMap<i32, AuthUser>>,            // key: user_id
        creds: Mutex<HashMap<i32, Credentials>>,         // key: user_id
        links: Mutex<HashMap<i32, ProfileLink>>,         // key: user_id
        logins: Mutex<HashMap<i32, u32>>,
        services: Mutex<HashSet<i32>>,
        next_id: Mutex<i32>,
    }

    impl Default for MockAuthRepository {
        fn default() -> Self {
            Self {
                users: Mutex::new(HashMap::new()),
                creds: Mutex::new(HashMap::new()),
                links: Mutex::new(HashMap::new()),
                logins: Mutex::new(HashMap::new()),
                // 默认存在 id=1 的服务
                services: Mutex::new(HashSet::from([1])),
                next_id: Mutex::new(0),
            }
        }
    }

    impl MockAuthRepository {
        pub fn set_active(&self, user_id: i32, active: bool) {
            if let Some(u) = self.users.lock().unwrap().get_mut(&user_id) {
                u.is_active = active;
            }
        }

        pub fn set_verified(&self, user_id: i32, verified: bool) {
            if let Some(ProfileLink::Professional { verified: v, .. }) = self.links.lock().unwrap().get_mut(&user_id) {
                *v = verified;
            }
        }

        pub fn login_count(&self, user_id: i32) -> u32 {
            self.logins.lock().unwrap().get(&user_id).copied().unwrap_or(0)
        }

        fn insert_user(&self, user: NewUser, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let email = user.email.trim().to_lowercase();
            if users.values().any(|u| u.email == email) {
                return Err(AuthError::Conflict("User with this email already exists".into()));
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let u = AuthUser { id: *next, email, name: user.name, phone: user.phone, role: user.role, is_active: true };
            users.insert(u.id, u.clone());
            self.creds.lock().unwrap().insert(u.id, Credentials { user_id: u.id, password_hash, password_algorithm });
            Ok(u)
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let email = email.trim().to_lowercase();
            Ok(self.users.lock().unwrap().values().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_phone(&self, phone: &str) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.lock().unwrap().values().find(|u| u.phone.as_deref() == Some(phone)).cloned())
        }

        async fn find_user_by_id(&self, id: i32) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn service_exists(&self, service_id: i32) -> Result<bool, AuthError> {
            Ok(self.services.lock().unwrap().contains(&service_id))
        }

        async fn create_customer_account(&self, user: NewUser, password_hash: String, password_algorithm: String, _customer: NewCustomer) -> Result<(AuthUser, i32), AuthError> {
            let u = self.insert_user(user, password_hash, password_algorithm)?;
            let customer_id = u.id + 1000;
            self.links.lock().unwrap().insert(u.id, ProfileLink::Customer { customer_id });
            Ok((u, customer_id))
        }

        async fn create_professional_account(&self, user: NewUser, password_hash: String, password_algorithm: String, _professional: NewProfessional) -> Result<(AuthUser, i32), AuthError> {
            let u = self.insert_user(user, password_hash, password_algorithm)?;
            let professional_id = u.id + 2000;
            self.links.lock().unwrap().insert(u.id, ProfileLink::Professional { professional_id, verified: false });
            Ok((u, professional_id))
        }

        async fn get_credentials(&self, user_id: i32) -> Result<Option<Credentials>, AuthError> {
            Ok(self.creds.lock().unwrap().get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: i32, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let c = Credentials { user_id, password_hash, password_algorithm };
            self.creds.lock().unwrap().insert(user_id, c.clone());
            Ok(c)
        }

        async fn touch_last_login(&self, user_id: i32) -> Result<(), AuthError> {
            *self.logins.lock().unwrap().entry(user_id).or_insert(0) += 1;
            Ok(())
        }

        async fn profile_link(&self, user_id: i32) -> Result<ProfileLink, AuthError> {
            Ok(self.links.lock().unwrap().get(&user_id).copied().unwrap_or(ProfileLink::Missing))
        }
    }
}
