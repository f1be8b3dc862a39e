//! Refresh-token session and token response models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::Role;

/// Stored refresh token for a user.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: String,
    pub token: String,
    /// Expiry (Unix).
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response for a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub role: Role,
    #[serde(flatten)]
    pub tokens: TokenPair,
}
