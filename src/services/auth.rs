//! Access and refresh tokens.
//!
//! Access tokens are short-lived HS256 JWTs carrying the caller's id and
//! role. Refresh tokens are opaque UUIDs, one per user, kept in the
//! `sessions` table until they expire.

use crate::db::pool::{self, DbPool};
use crate::db::{sessions, users};
use crate::error::AppError;
use crate::models::{LoginResponse, Role, TokenPair};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token signing settings.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

/// JWT claims of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub role: Role,
    pub exp: i64,
}

pub fn issue_access_token(
    config: &AuthConfig,
    user_id: &str,
    role: Role,
) -> Result<String, AppError> {
    let claims = Claims {
        id: user_id.to_string(),
        role,
        exp: Utc::now().timestamp() + config.access_ttl_secs,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry of an access token and return its claims.
///
/// Tokens whose role is neither `admin` nor `user` fail to decode.
pub fn verify_access_token(config: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    if token.is_empty() {
        return Err(AppError::authentication("Token is missing"));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    if data.claims.id.is_empty() {
        return Err(AppError::authentication("Token is not valid"));
    }

    Ok(data.claims)
}

/// Record the user's admin flag and hand out a token pair.
///
/// A still valid refresh token is returned again; a missing or expired one
/// is replaced.
pub async fn login_as(
    pool: &DbPool,
    config: &AuthConfig,
    user_id: &str,
    is_admin: bool,
) -> Result<LoginResponse, AppError> {
    let now = Utc::now().timestamp();
    let mut tx = pool::begin_write(pool).await?;

    if !users::set_is_admin(&mut *tx, user_id, is_admin, now).await? {
        return Err(AppError::user_not_found(user_id));
    }

    let refresh_token = match sessions::find_session(&mut *tx, user_id).await? {
        Some(session) if !session.is_expired(now) => session.token,
        _ => {
            let token = uuid::Uuid::new_v4().to_string();
            sessions::upsert_session(&mut *tx, user_id, &token, now + config.refresh_ttl_secs)
                .await?;
            log::debug!("[auth] Issued new refresh token for {}", user_id);
            token
        }
    };

    tx.commit().await?;

    let role = Role::from_admin_flag(is_admin);
    let access_token = issue_access_token(config, user_id, role)?;

    log::info!("[auth] Login for {} as {}", user_id, role);

    Ok(LoginResponse {
        user_id: user_id.to_string(),
        role,
        tokens: TokenPair {
            access_token,
            refresh_token,
        },
    })
}

/// Issue a fresh access token against the user's stored refresh token.
///
/// The role comes from the user row, so a demoted admin gets a `user` token.
/// An expired refresh token is deleted and the call fails with
/// `Authentication`.
pub async fn refresh(
    pool: &DbPool,
    config: &AuthConfig,
    user_id: &str,
) -> Result<TokenPair, AppError> {
    let now = Utc::now().timestamp();
    let mut tx = pool::begin_write(pool).await?;

    let session = sessions::find_session(&mut *tx, user_id)
        .await?
        .ok_or_else(|| AppError::authentication("Refresh token expired"))?;

    if session.is_expired(now) {
        sessions::delete_session(&mut *tx, user_id, &session.token).await?;
        tx.commit().await?;
        log::warn!("[auth] Refresh token expired for {}", user_id);
        return Err(AppError::authentication("Refresh token expired"));
    }

    let user = users::find_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))?;

    tx.commit().await?;

    let access_token = issue_access_token(config, user_id, Role::from_admin_flag(user.is_admin))?;

    log::info!("[auth] Refreshed access token for {}", user_id);

    Ok(TokenPair {
        access_token,
        refresh_token: session.token,
    })
}
