//! Team administration: create a team with its members, list a team.

use crate::db::pool::{self, DbPool};
use crate::db::teams;
use crate::error::AppError;
use crate::models::{TeamMember, TeamWithMembers};
use chrono::Utc;

/// Create a team and upsert its members into it, atomically.
///
/// Members that already exist are moved into the new team with the
/// submitted username and active flag.
pub async fn create_team(
    pool: &DbPool,
    team_name: &str,
    members: Vec<TeamMember>,
) -> Result<TeamWithMembers, AppError> {
    if team_name.trim().is_empty() {
        return Err(AppError::invalid_input_field("team_name is required", "team_name"));
    }
    if members.is_empty() {
        return Err(AppError::invalid_input_field(
            "at least one member is required",
            "members",
        ));
    }
    if let Some(member) = members.iter().find(|m| m.user_id.trim().is_empty()) {
        return Err(AppError::invalid_input_field(
            format!("member '{}' has no user_id", member.username),
            "members",
        ));
    }

    let mut tx = pool::begin_write(pool).await?;

    if teams::find_team(&mut *tx, team_name).await?.is_some() {
        return Err(AppError::team_already_exists(team_name));
    }

    let now = Utc::now().timestamp();
    teams::insert_team(&mut *tx, team_name, now).await?;
    for member in &members {
        teams::upsert_member(&mut *tx, team_name, member, now).await?;
    }

    tx.commit().await?;

    log::info!("[team] Created {} with {} members", team_name, members.len());

    Ok(TeamWithMembers {
        team_name: team_name.to_string(),
        members,
    })
}

/// Fetch a team and its members, ordered by username.
pub async fn get_team(pool: &DbPool, team_name: &str) -> Result<TeamWithMembers, AppError> {
    let mut conn = pool.acquire().await?;

    let team = teams::find_team(&mut *conn, team_name)
        .await?
        .ok_or_else(|| AppError::team_not_found(team_name))?;
    let members = teams::members_of(&mut *conn, &team.team_name).await?;

    Ok(TeamWithMembers {
        team_name: team.team_name,
        members,
    })
}
