use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{Role, User},
    repository::RepositoryState,
};

/// Tokens are valid for seven days from issuance.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims
///
/// The signed payload carried by every bearer token. `sub` is optional on the
/// decode path: a structurally valid token without a subject id is rejected
/// with a distinct error. The embedded `role` and `email` are informational
/// only; authorization always re-reads the identity from storage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID.
    #[serde(default)]
    pub sub: Option<Uuid>,
    pub email: String,
    pub role: Role,
    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: usize,
    /// Expiration timestamp (Unix epoch seconds).
    pub exp: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the output of the
/// REQUIRED auth policy. Field values come from the freshly loaded identity
/// row, not from the token, so role changes take effect immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// MaybeUser
///
/// The OPTIONAL auth policy: carries `Some(AuthUser)` when a valid token was
/// presented and `None` (anonymous) otherwise. Never rejects a request —
/// a missing, malformed, expired, or orphaned token all resolve to `None`.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

/// Extract the token from an `Authorization` header value of the exact form
/// `"Bearer <token>"`. Any other form counts as no token.
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ")
}

/// Sign a bearer token embedding the user's id, email, and role.
pub fn issue_token(config: &AppConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: Some(user.id),
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the decoded claims.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation).map(|data| data.claims)
}

/// resolve_identity
///
/// The shared resolution path behind both extractors, i.e. the REQUIRED
/// policy: bearer extraction, token verification, then an identity lookup so
/// the role is authoritative and deleted users are locked out immediately.
/// The OPTIONAL policy is this function with every error mapped to anonymous.
async fn resolve_identity(
    parts: &Parts,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<AuthUser, ApiError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = header_value
        .and_then(extract_bearer)
        .ok_or(ApiError::AccessTokenRequired)?;

    let claims = decode_token(config, token).map_err(|_| ApiError::InvalidToken)?;

    // Structurally valid token, but no subject to look up.
    let user_id = claims.sub.ok_or(ApiError::InvalidTokenFormat)?;

    let user = repo
        .get_user(user_id)
        .await?
        // Token outlived the account.
        .ok_or(ApiError::InvalidToken)?;

    Ok(AuthUser {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        resolve_identity(parts, &repo, &config).await
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        Ok(MaybeUser(resolve_identity(parts, &repo, &config).await.ok()))
    }
}
