use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use models::{customer, professional, user, user::Role, validation};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthSession, AuthUser, LoginInput, ProfileLink, RegisterCustomerInput, RegisterProfessionalInput, Registration};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::{Claims, TokenIssuer, TokenType, ADMIN_SUBJECT};
use crate::principal::Principal;

/// Configured administrator credentials; the admin is never stored as a user row.
#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
}

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub tokens: TokenIssuer,
    pub password_algorithm: String,
    pub admin: Option<AdminAccount>,
}

impl AuthConfig {
    pub fn from_app(cfg: &configs::AppConfig) -> Self {
        let admin = cfg.admin.is_enabled().then(|| AdminAccount {
            email: cfg.admin.email.trim().to_lowercase(),
            password: cfg.admin.password.clone(),
        });
        Self { tokens: TokenIssuer::from_config(&cfg.auth), password_algorithm: "argon2".into(), admin }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    pub fn tokens(&self) -> &TokenIssuer { &self.cfg.tokens }

    /// Register a customer account (user + credentials + customer row).
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository, token::TokenIssuer};
    /// use service::auth::domain::RegisterCustomerInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { tokens: TokenIssuer::new("secret", 60, 30), password_algorithm: "argon2".into(), admin: None });
    /// let input = RegisterCustomerInput { email: "user@example.com".into(), password: "Secret123".into(), name: "Test".into(), phone: None, location: "Main St".into(), pincode: Some("12345".into()) };
    /// let reg = tokio_test::block_on(svc.register_customer(input)).unwrap();
    /// assert_eq!(reg.user.email, "user@example.com");
    /// assert!(reg.customer_id.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register_customer(&self, input: RegisterCustomerInput) -> Result<Registration, AuthError> {
        let new_user = user::NewUser { email: input.email, name: input.name, phone: input.phone, role: Role::Customer };
        let new_customer = customer::NewCustomer { location: input.location, pincode: input.pincode };
        customer::validate_new(&new_customer)?;
        self.check_new_user(&new_user, &input.password).await?;

        let hash = self.hash_password(&input.password)?;
        let (u, customer_id) = self.repo
            .create_customer_account(new_user, hash, self.cfg.password_algorithm.clone(), new_customer)
            .await?;
        let tokens = self.cfg.tokens.issue_pair(&u.id.to_string(), &u.email, Role::Customer, false)?;
        info!(user_id = u.id, customer_id, email = %u.email, "customer_registered");
        Ok(Registration { user: u, customer_id: Some(customer_id), professional_id: None, tokens })
    }

    /// Register a professional account; it starts unverified.
    #[instrument(skip(self, input), fields(email = %input.email, service_id = input.service_id))]
    pub async fn register_professional(&self, input: RegisterProfessionalInput) -> Result<Registration, AuthError> {
        let new_user = user::NewUser { email: input.email, name: input.name, phone: input.phone, role: Role::Professional };
        let new_pro = professional::NewProfessional {
            service_id: input.service_id,
            experience_years: input.experience_years,
            bio: input.bio,
            location: input.location,
            pincode: input.pincode,
        };
        professional::validate_new(&new_pro)?;
        self.check_new_user(&new_user, &input.password).await?;
        if !self.repo.service_exists(new_pro.service_id).await? {
            return Err(AuthError::Validation("Service not found".into()));
        }

        let hash = self.hash_password(&input.password)?;
        let (u, professional_id) = self.repo
            .create_professional_account(new_user, hash, self.cfg.password_algorithm.clone(), new_pro)
            .await?;
        let tokens = self.cfg.tokens.issue_pair(&u.id.to_string(), &u.email, Role::Professional, false)?;
        info!(user_id = u.id, professional_id, email = %u.email, "professional_registered");
        Ok(Registration { user: u, customer_id: None, professional_id: Some(professional_id), tokens })
    }

    /// Authenticate the configured admin or a stored user and issue tokens.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig, AdminAccount}, repository::mock::MockAuthRepository, token::TokenIssuer};
    /// use service::auth::domain::LoginInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let admin = AdminAccount { email: "admin@example.com".into(), password: "Adm1nPass".into() };
    /// let svc = AuthService::new(repo, AuthConfig { tokens: TokenIssuer::new("secret", 60, 30), password_algorithm: "argon2".into(), admin: Some(admin) });
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "admin@example.com".into(), password: "Adm1nPass".into() })).unwrap();
    /// assert!(session.is_admin);
    /// assert!(session.user_id.is_none());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("Email and password are required".into()));
        }

        if let Some(admin) = &self.cfg.admin {
            if admin.email == email && admin.password == input.password {
                let tokens = self.cfg.tokens.issue_pair(ADMIN_SUBJECT, &admin.email, Role::Admin, false)?;
                info!(email = %admin.email, "admin_login");
                return Ok(AuthSession {
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token,
                    email: admin.email.clone(),
                    role: Role::Admin,
                    user_id: None,
                    is_admin: true,
                    is_verified: None,
                });
            }
        }

        let user = self.repo.find_user_by_email(&email).await?.ok_or(AuthError::Unauthorized)?;
        self.verify_password(user.id, &input.password).await?;
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        // last_login 记录失败不影响登录
        if let Err(e) = self.repo.touch_last_login(user.id).await {
            warn!(user_id = user.id, error = %e, "failed to record last_login");
        }

        let verified = self.professional_verified(user.id).await?;
        let tokens = self.cfg.tokens.issue_pair(&user.id.to_string(), &user.email, user.role, verified.unwrap_or(false))?;
        info!(user_id = user.id, role = %user.role, "user_login");
        Ok(AuthSession {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            email: user.email,
            role: user.role,
            user_id: Some(user.id),
            is_admin: false,
            is_verified: verified,
        })
    }

    /// Exchange a refresh token for a new access token.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.cfg.tokens.decode_as(refresh_token, TokenType::Refresh)?;
        match claims.user_id()? {
            None => {
                let admin = self.cfg.admin.as_ref().ok_or(AuthError::Unauthorized)?;
                self.cfg.tokens.issue(ADMIN_SUBJECT, &admin.email, Role::Admin, false, TokenType::Access)
            }
            Some(id) => {
                let user = self.repo.find_user_by_id(id).await?.ok_or(AuthError::NotFound)?;
                if !user.is_active {
                    return Err(AuthError::Inactive);
                }
                let verified = self.professional_verified(user.id).await?.unwrap_or(false);
                self.cfg.tokens.issue(&user.id.to_string(), &user.email, user.role, verified, TokenType::Access)
            }
        }
    }

    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(&self, user_id: i32, old_password: &str, new_password: &str) -> Result<(), AuthError> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::Validation("Password cannot be empty".into()));
        }
        self.repo.find_user_by_id(user_id).await?.ok_or(AuthError::NotFound)?;
        match self.verify_password(user_id, old_password).await {
            Ok(()) => {}
            Err(AuthError::Unauthorized) => return Err(AuthError::Validation("Invalid old password".into())),
            Err(e) => return Err(e),
        }
        validation::validate_password(new_password)?;
        let hash = self.hash_password(new_password)?;
        self.repo.upsert_password(user_id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id, "password_changed");
        Ok(())
    }

    /// Resolve a bearer access token into a [`Principal`].
    ///
    /// The professional verification flag is read from the store, not the token.
    pub async fn resolve_principal(&self, access_token: &str) -> Result<Principal, AuthError> {
        let claims = self.cfg.tokens.decode_as(access_token, TokenType::Access)?;
        self.principal_from_claims(&claims).await
    }

    pub async fn principal_from_claims(&self, claims: &Claims) -> Result<Principal, AuthError> {
        let Some(user_id) = claims.user_id()? else {
            let admin = self.cfg.admin.as_ref().ok_or(AuthError::Unauthorized)?;
            if admin.email != claims.email {
                return Err(AuthError::Unauthorized);
            }
            return Ok(Principal::Admin { email: admin.email.clone() });
        };

        let user = self.repo.find_user_by_id(user_id).await?.ok_or(AuthError::Unauthorized)?;
        if !user.is_active {
            return Err(AuthError::Inactive);
        }
        match (user.role, self.repo.profile_link(user.id).await?) {
            (Role::Customer, ProfileLink::Customer { customer_id }) => {
                Ok(Principal::Customer { user_id: user.id, customer_id, email: user.email })
            }
            (Role::Professional, ProfileLink::Professional { professional_id, verified }) => {
                Ok(Principal::Professional { user_id: user.id, professional_id, email: user.email, verified })
            }
            (role, link) => {
                warn!(user_id = user.id, %role, ?link, "user has no matching profile row");
                Err(AuthError::Unauthorized)
            }
        }
    }

    async fn check_new_user(&self, new_user: &user::NewUser, password: &str) -> Result<(), AuthError> {
        user::validate_new(new_user)?;
        validation::validate_password(password)?;
        let email = new_user.email.trim().to_lowercase();
        let is_admin_email = self.cfg.admin.as_ref().is_some_and(|a| a.email == email);
        if is_admin_email || self.repo.find_user_by_email(&email).await?.is_some() {
            debug!("user exists: {}", email);
            return Err(AuthError::Conflict("User with this email already exists".into()));
        }
        if let Some(phone) = &new_user.phone {
            if self.repo.find_user_by_phone(phone).await?.is_some() {
                return Err(AuthError::Conflict("User with this phone number already exists".into()));
            }
        }
        Ok(())
    }

    async fn verify_password(&self, user_id: i32, password: &str) -> Result<(), AuthError> {
        let cred = self.repo.get_credentials(user_id).await?.ok_or(AuthError::Unauthorized)?;
        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string())
    }

    async fn professional_verified(&self, user_id: i32) -> Result<Option<bool>, AuthError> {
        Ok(match self.repo.profile_link(user_id).await? {
            ProfileLink::Professional { verified, .. } => Some(verified),
            _ => None,
        })
    }
}
