//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::pull_request::PullRequestShort;

/// Caller role carried in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Self::Admin
        } else {
            Self::User
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A user row.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: String,
    pub username: String,
    /// Team the user belongs to.
    pub team_name: String,
    /// Only active users author or review pull requests.
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            team_name: user.team_name,
            is_active: user.is_active,
        }
    }
}

/// Pull requests a user is currently reviewing.
#[derive(Debug, Clone, Serialize)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}
