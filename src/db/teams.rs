//! Team queries.

use crate::error::AppError;
use crate::models::{Team, TeamMember};
use sqlx::SqliteConnection;

pub async fn find_team(conn: &mut SqliteConnection, team_name: &str) -> Result<Option<Team>, AppError> {
    let team = sqlx::query_as::<_, Team>(
        "SELECT team_name, created_at FROM teams WHERE team_name = ?",
    )
    .bind(team_name)
    .fetch_optional(conn)
    .await?;

    Ok(team)
}

pub async fn insert_team(
    conn: &mut SqliteConnection,
    team_name: &str,
    now: i64,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO teams (team_name, created_at) VALUES (?, ?)")
        .bind(team_name)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(())
}

/// Insert a member into the team, or move an existing user into it.
pub async fn upsert_member(
    conn: &mut SqliteConnection,
    team_name: &str,
    member: &TeamMember,
    now: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, username, team_name, is_active, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE
        SET username = excluded.username,
            team_name = excluded.team_name,
            is_active = excluded.is_active,
            updated_at = ?
        "#,
    )
    .bind(&member.user_id)
    .bind(&member.username)
    .bind(team_name)
    .bind(member.is_active)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Members of a team, ordered by username.
pub async fn members_of(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Vec<TeamMember>, AppError> {
    let members = sqlx::query_as::<_, TeamMember>(
        r#"
        SELECT user_id, username, is_active
        FROM users
        WHERE team_name = ?
        ORDER BY username, user_id
        "#,
    )
    .bind(team_name)
    .fetch_all(conn)
    .await?;

    Ok(members)
}
