//! HS256 bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use models::user::Role;
use serde::{Deserialize, Serialize};

use super::domain::TokenPair;
use super::errors::AuthError;

/// Subject used for the configured administrator.
pub const ADMIN_SUBJECT: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub verified: bool,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Numeric user id; `None` for the admin subject.
    pub fn user_id(&self) -> Result<Option<i32>, AuthError> {
        if self.role == Role::Admin {
            return Ok(None);
        }
        self.sub
            .parse::<i32>()
            .map(Some)
            .map_err(|_| AuthError::TokenError("invalid subject".into()))
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        }
    }

    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self::new(&cfg.jwt_secret, cfg.access_token_minutes, cfg.refresh_token_days)
    }

    pub fn issue(&self, sub: &str, email: &str, role: Role, verified: bool, typ: TokenType) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match typ {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            role,
            verified,
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| AuthError::TokenError(e.to_string()))
    }

    pub fn issue_pair(&self, sub: &str, email: &str, role: Role, verified: bool) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue(sub, email, role, verified, TokenType::Access)?,
            refresh_token: self.issue(sub, email, role, verified, TokenType::Refresh)?,
        })
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|d| d.claims)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    pub fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.typ != expected {
            return Err(AuthError::TokenError(format!("expected {:?} token", expected).to_lowercase()));
        }
        Ok(claims)
    }
}
