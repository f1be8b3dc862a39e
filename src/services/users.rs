//! User lookups and flag updates.

use crate::db::pool::DbPool;
use crate::db::users;
use crate::error::AppError;
use crate::models::{Role, UserResponse, UserReviews};
use chrono::Utc;

pub async fn list_users(pool: &DbPool) -> Result<Vec<UserResponse>, AppError> {
    let mut conn = pool.acquire().await?;
    let users = users::list_users(&mut *conn).await?;
    Ok(users.into_iter().map(UserResponse::from).collect())
}

/// Toggle whether a user may author or review pull requests.
///
/// Existing reviewer assignments are left alone; an inactive user simply
/// stops being a candidate for new ones.
pub async fn set_is_active(
    pool: &DbPool,
    user_id: &str,
    is_active: bool,
) -> Result<UserResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let user = users::set_is_active(&mut *conn, user_id, is_active, Utc::now().timestamp())
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))?;

    log::info!("[user] {} is_active={}", user_id, is_active);

    Ok(UserResponse::from(user))
}

/// Pull requests the user is currently assigned to review.
pub async fn get_review_assignments(
    pool: &DbPool,
    user_id: &str,
) -> Result<UserReviews, AppError> {
    let mut conn = pool.acquire().await?;
    let pull_requests = users::reviews_of(&mut *conn, user_id).await?;

    Ok(UserReviews {
        user_id: user_id.to_string(),
        pull_requests,
    })
}

pub async fn role_of(pool: &DbPool, user_id: &str) -> Result<Role, AppError> {
    let mut conn = pool.acquire().await?;
    let user = users::find_user(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))?;
    Ok(Role::from_admin_flag(user.is_admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{NewPullRequest, TeamMember};
    use crate::services::{pull_requests, teams};
    use tempfile::tempdir;

    #[tokio::test]
    async fn set_is_active_updates_and_reports_unknown_users() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
        teams::create_team(
            &pool,
            "backend",
            vec![TeamMember {
                user_id: "u1".into(),
                username: "Alice".into(),
                is_active: true,
            }],
        )
        .await
        .unwrap();

        let user = set_is_active(&pool, "u1", false).await.unwrap();
        assert!(!user.is_active);
        assert_eq!(user.team_name, "backend");

        assert!(matches!(
            set_is_active(&pool, "ghost", true).await,
            Err(AppError::UserNotFound { .. })
        ));
        assert_eq!(role_of(&pool, "u1").await.unwrap(), Role::User);
    }

    #[tokio::test]
    async fn review_assignments_follow_reviewer_rows() {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
        let members = ["a", "r"]
            .iter()
            .map(|id| TeamMember {
                user_id: id.to_string(),
                username: id.to_string(),
                is_active: true,
            })
            .collect();
        teams::create_team(&pool, "backend", members).await.unwrap();
        pull_requests::create_pull_request(
            &pool,
            NewPullRequest {
                pull_request_id: "pr-1".into(),
                pull_request_name: "Add X".into(),
                author_id: "a".into(),
            },
        )
        .await
        .unwrap();

        let reviews = get_review_assignments(&pool, "r").await.unwrap();
        assert_eq!(reviews.pull_requests.len(), 1);
        assert_eq!(reviews.pull_requests[0].pull_request_id, "pr-1");
        assert_eq!(reviews.pull_requests[0].status, "OPEN");

        assert!(get_review_assignments(&pool, "a")
            .await
            .unwrap()
            .pull_requests
            .is_empty());
    }
}
