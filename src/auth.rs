/// Authentication primitives
///
/// Access tokens are short-lived HS256 JWTs. Refresh tokens are opaque
/// random strings; only their SHA-256 digest is stored, so a leaked
/// database cannot be used to mint sessions.
use std::sync::Arc;

use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::{Role, User};
use crate::repo;

/// Name of the cookie carrying the access token for browser clients
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const ACCESS_TOKEN_TYPE: &str = "access";

/// Signing keys and token lifetimes
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeys")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// JWT claims of an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user ID
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
}

impl AuthKeys {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Signs an access token for the user
    pub fn issue_access_token(&self, user: &User) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.get_id(),
            role: user.get_role(),
            hotel_id: user.get_hotel_id(),
            service_provider_id: user.get_service_provider_id(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verifies an access token and returns its claims
    ///
    /// ### Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is malformed, signed
    /// with another key, expired, or not an access token
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!("Rejected access token: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(ApiError::Unauthorized("Invalid or expired token".to_string()));
        }
        Ok(data.claims)
    }
}

/// Hashes a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| anyhow!("Failed to encode salt: {}", e))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Checks a password against a stored hash; malformed hashes never match
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Creates a new opaque refresh token (64 hex characters)
pub fn generate_refresh_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// The form a refresh token is stored in
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// The authenticated caller
///
/// Reads the access token from the `Authorization: Bearer` header, falling
/// back to the `access_token` cookie, and loads the user it names. Missing
/// or invalid tokens and deactivated accounts are rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
    Arc<AuthKeys>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(ACCESS_TOKEN_COOKIE)
                    .map(|cookie| cookie.value().to_string())
            })
            .ok_or_else(|| ApiError::Unauthorized("Missing access token".to_string()))?;

        let keys = Arc::<AuthKeys>::from_ref(state);
        let claims = keys.decode_access_token(&token)?;

        let pool = Arc::<DbPool>::from_ref(state);
        let user = repo::get_user(&pool, &claims.sub)?
            .filter(|user| user.get_is_active())
            .ok_or_else(|| ApiError::Unauthorized("Account is inactive".to_string()))?;

        Ok(AuthUser { user, claims })
    }
}

impl AuthUser {
    /// Fails with 403 unless the caller has the given role
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.user.get_role() == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Requires role {}", role)))
        }
    }

    /// The hotel a hotel admin manages
    pub fn require_hotel_admin(&self) -> Result<String, ApiError> {
        self.require_role(Role::HotelAdmin)?;
        self.user
            .get_hotel_id()
            .ok_or_else(|| ApiError::Forbidden("Account is not attached to a hotel".to_string()))
    }

    /// The provider a service provider account works for
    pub fn require_provider(&self) -> Result<String, ApiError> {
        self.require_role(Role::ServiceProvider)?;
        self.user
            .get_service_provider_id()
            .ok_or_else(|| ApiError::Forbidden("Account is not attached to a provider".to_string()))
    }

    /// The hotel a guest is staying at
    pub fn require_guest(&self) -> Result<String, ApiError> {
        self.require_role(Role::Guest)?;
        self.user
            .get_hotel_id()
            .ok_or_else(|| ApiError::Forbidden("Account is not attached to a hotel".to_string()))
    }
}
