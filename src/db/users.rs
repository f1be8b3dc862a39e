//! User queries, including the reviewer candidate pool.

use crate::error::AppError;
use crate::models::{PullRequestShort, User};
use sqlx::SqliteConnection;

const USER_COLUMNS: &str =
    "user_id, username, team_name, is_active, is_admin, created_at, updated_at";

/// Look up a user by id.
pub async fn find_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE user_id = ?",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(user)
}

/// Team of a user, regardless of the active flag.
pub async fn team_of(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<String>, AppError> {
    let team: Option<String> = sqlx::query_scalar("SELECT team_name FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

    Ok(team)
}

/// Team of a user, only if the user is active.
pub async fn active_team_of(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<String>, AppError> {
    let team: Option<String> =
        sqlx::query_scalar("SELECT team_name FROM users WHERE user_id = ? AND is_active = 1")
            .bind(user_id)
            .fetch_optional(conn)
            .await?;

    Ok(team)
}

/// Active members of `team_name`, minus the ids in `excluding`.
///
/// Ordered by user id so that the caller's random selection is the only
/// source of variation.
pub async fn active_team_members(
    conn: &mut SqliteConnection,
    team_name: &str,
    excluding: &[&str],
) -> Result<Vec<String>, AppError> {
    let mut sql = String::from("SELECT user_id FROM users WHERE team_name = ? AND is_active = 1");
    if !excluding.is_empty() {
        let placeholders = vec!["?"; excluding.len()].join(", ");
        sql.push_str(&format!(" AND user_id NOT IN ({})", placeholders));
    }
    sql.push_str(" ORDER BY user_id");

    let mut query = sqlx::query_scalar::<_, String>(&sql).bind(team_name);
    for id in excluding {
        query = query.bind(*id);
    }

    Ok(query.fetch_all(conn).await?)
}

/// All users, ordered by id.
pub async fn list_users(conn: &mut SqliteConnection) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY user_id",
        USER_COLUMNS
    ))
    .fetch_all(conn)
    .await?;

    Ok(users)
}

/// Set the active flag. Returns the updated user, or `None` if unknown.
pub async fn set_is_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
    now: i64,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_active = ?, updated_at = ? WHERE user_id = ? RETURNING {}",
        USER_COLUMNS
    ))
    .bind(is_active)
    .bind(now)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(user)
}

/// Set the admin flag. Returns `false` if the user is unknown.
pub async fn set_is_admin(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_admin: bool,
    now: i64,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE users SET is_admin = ?, updated_at = ? WHERE user_id = ?")
        .bind(is_admin)
        .bind(now)
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Pull requests on which the user is currently a reviewer.
pub async fn reviews_of(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<PullRequestShort>, AppError> {
    let prs = sqlx::query_as::<_, PullRequestShort>(
        r#"
        SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
        FROM pr_reviewers r
        JOIN pull_requests pr ON r.pull_request_id = pr.pull_request_id
        WHERE r.reviewer_id = ?
        ORDER BY pr.created_at, pr.pull_request_id
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(prs)
}
