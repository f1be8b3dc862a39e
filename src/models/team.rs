//! Team model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Team {
    pub team_name: String,
    pub created_at: i64,
}

/// A team member as submitted when creating a team and as listed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// A team with its members.
#[derive(Debug, Clone, Serialize)]
pub struct TeamWithMembers {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}
