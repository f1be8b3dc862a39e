//! Pull request lifecycle engine.
//!
//! A pull request moves `OPEN -> MERGED` and never back. While it is open,
//! its reviewer set can be changed one reviewer at a time.
//!
//! Each operation runs its precondition reads and its writes inside one
//! `BEGIN IMMEDIATE` transaction. Any early return drops the transaction,
//! which rolls it back, so a half-written PR or a half-swapped reviewer set is
//! never visible. Nothing here retries; that is left to the caller.

use crate::db::pool::{self, DbPool};
use crate::db::{pull_requests, users};
use crate::error::AppError;
use crate::models::{NewPullRequest, PullRequestDetail, ReassignOutcome};
use crate::services::reviewer_selector;
use chrono::Utc;

/// Create a pull request and assign up to two reviewers from the author's team.
///
/// Fails with `PrAlreadyExists` if the id is taken, then `UserNotFound` if the
/// author is unknown or inactive.
pub async fn create_pull_request(
    pool: &DbPool,
    input: NewPullRequest,
) -> Result<PullRequestDetail, AppError> {
    let mut tx = pool::begin_write(pool).await?;

    if pull_requests::pr_exists(&mut *tx, &input.pull_request_id).await? {
        return Err(AppError::pr_already_exists(&input.pull_request_id));
    }

    let team = users::active_team_of(&mut *tx, &input.author_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(&input.author_id))?;

    let candidates =
        users::active_team_members(&mut *tx, &team, &[input.author_id.as_str()]).await?;
    let reviewers =
        reviewer_selector::select_initial_reviewers(candidates, &mut rand::thread_rng());

    let now = Utc::now().timestamp();
    let pr = pull_requests::insert_pull_request(&mut *tx, &input, now).await?;
    for reviewer_id in &reviewers {
        pull_requests::insert_reviewer(&mut *tx, &pr.pull_request_id, reviewer_id, now).await?;
    }

    tx.commit().await?;

    log::info!(
        "[pr] Created {} by {} in team {} with reviewers {:?}",
        pr.pull_request_id,
        pr.author_id,
        team,
        reviewers
    );

    Ok(pr.with_reviewers(reviewers))
}

/// Merge a pull request.
///
/// Merging an already merged pull request is a no-op that returns it as
/// stored, with its original merge timestamp.
pub async fn merge_pull_request(
    pool: &DbPool,
    pull_request_id: &str,
) -> Result<PullRequestDetail, AppError> {
    let mut tx = pool::begin_write(pool).await?;

    let pr = pull_requests::find_pull_request(&mut *tx, pull_request_id)
        .await?
        .ok_or_else(|| AppError::pr_not_found(pull_request_id))?;

    let pr = if pr.is_merged() {
        log::debug!("[pr] {} already merged", pull_request_id);
        pr
    } else {
        let now = Utc::now().timestamp();
        let merged = pull_requests::mark_merged(&mut *tx, pull_request_id, now)
            .await?
            .ok_or_else(|| {
                AppError::database_with_op("pull request left OPEN state mid-merge", "merge")
            })?;
        log::info!("[pr] Merged {}", pull_request_id);
        merged
    };

    let reviewers = pull_requests::reviewer_ids(&mut *tx, pull_request_id).await?;

    tx.commit().await?;

    Ok(pr.with_reviewers(reviewers))
}

/// Replace one reviewer of an open pull request with a random teammate of
/// the author.
///
/// Preconditions are checked in order, first failure wins: `PrNotFound`,
/// `PrMerged`, `ReviewerNotAssigned`, `UserNotFound` (author no longer
/// resolves), `NoCandidateAvailable`.
///
/// Candidates are active members of the author's team other than the author
/// and anyone already reviewing the pull request, including the reviewer
/// being replaced.
pub async fn reassign_reviewer(
    pool: &DbPool,
    pull_request_id: &str,
    old_reviewer_id: &str,
) -> Result<ReassignOutcome, AppError> {
    let mut tx = pool::begin_write(pool).await?;

    let pr = pull_requests::find_pull_request(&mut *tx, pull_request_id)
        .await?
        .ok_or_else(|| AppError::pr_not_found(pull_request_id))?;

    if pr.is_merged() {
        return Err(AppError::pr_merged(pull_request_id));
    }

    let current = pull_requests::reviewer_ids(&mut *tx, pull_request_id).await?;
    if !current.iter().any(|id| id == old_reviewer_id) {
        return Err(AppError::reviewer_not_assigned(
            pull_request_id,
            old_reviewer_id,
        ));
    }

    let team = users::team_of(&mut *tx, &pr.author_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(&pr.author_id))?;

    let mut excluding: Vec<&str> = vec![pr.author_id.as_str()];
    excluding.extend(current.iter().map(String::as_str));
    let candidates = users::active_team_members(&mut *tx, &team, &excluding).await?;

    let new_reviewer_id =
        reviewer_selector::select_replacement(&candidates, &mut rand::thread_rng())
            .ok_or_else(|| AppError::no_candidate(pull_request_id))?;

    let now = Utc::now().timestamp();
    if !pull_requests::delete_reviewer(&mut *tx, pull_request_id, old_reviewer_id).await? {
        return Err(AppError::reviewer_not_assigned(
            pull_request_id,
            old_reviewer_id,
        ));
    }
    pull_requests::insert_reviewer(&mut *tx, pull_request_id, &new_reviewer_id, now).await?;

    let reviewers = pull_requests::reviewer_ids(&mut *tx, pull_request_id).await?;

    tx.commit().await?;

    log::info!(
        "[pr] Reassigned {} on {} to {}",
        old_reviewer_id,
        pull_request_id,
        new_reviewer_id
    );

    Ok(ReassignOutcome {
        pr: pr.with_reviewers(reviewers),
        replaced_by: new_reviewer_id,
    })
}

/// Fetch a pull request with its current reviewers.
pub async fn get_pull_request(
    pool: &DbPool,
    pull_request_id: &str,
) -> Result<PullRequestDetail, AppError> {
    let mut conn = pool.acquire().await?;

    let pr = pull_requests::find_pull_request(&mut *conn, pull_request_id)
        .await?
        .ok_or_else(|| AppError::pr_not_found(pull_request_id))?;
    let reviewers = pull_requests::reviewer_ids(&mut *conn, pull_request_id).await?;

    Ok(pr.with_reviewers(reviewers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::PullRequestStatus;
    use tempfile::{tempdir, TempDir};

    async fn setup() -> (TempDir, DbPool) {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
        (dir, pool)
    }

    async fn add_user(pool: &DbPool, team: &str, user_id: &str, active: bool) {
        sqlx::query("INSERT OR IGNORE INTO teams (team_name) VALUES (?)")
            .bind(team)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO users (user_id, username, team_name, is_active) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(team)
        .bind(active)
        .execute(pool)
        .await
        .unwrap();
    }

    fn new_pr(id: &str, author: &str) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: id.to_string(),
            pull_request_name: format!("PR {}", id),
            author_id: author.to_string(),
        }
    }

    #[tokio::test]
    async fn create_skips_inactive_teammates() {
        let (_dir, pool) = setup().await;
        add_user(&pool, "backend", "a", true).await;
        add_user(&pool, "backend", "r1", true).await;
        add_user(&pool, "backend", "off", false).await;
        add_user(&pool, "frontend", "f1", true).await;

        let pr = create_pull_request(&pool, new_pr("pr-1", "a")).await.unwrap();

        assert_eq!(pr.status, PullRequestStatus::Open);
        assert_eq!(pr.assigned_reviewers, vec!["r1".to_string()]);
        assert!(pr.merged_at.is_none());
    }

    #[tokio::test]
    async fn create_rejects_inactive_author() {
        let (_dir, pool) = setup().await;
        add_user(&pool, "backend", "a", false).await;
        add_user(&pool, "backend", "r1", true).await;

        let err = create_pull_request(&pool, new_pr("pr-1", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound { .. }));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pull_requests")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn duplicate_check_precedes_author_check() {
        let (_dir, pool) = setup().await;
        add_user(&pool, "backend", "a", true).await;
        create_pull_request(&pool, new_pr("pr-1", "a")).await.unwrap();

        let err = create_pull_request(&pool, new_pr("pr-1", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PrAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn merge_sets_timestamp_once() {
        let (_dir, pool) = setup().await;
        add_user(&pool, "backend", "a", true).await;
        add_user(&pool, "backend", "r1", true).await;
        create_pull_request(&pool, new_pr("pr-1", "a")).await.unwrap();

        let first = merge_pull_request(&pool, "pr-1").await.unwrap();
        let second = merge_pull_request(&pool, "pr-1").await.unwrap();

        assert_eq!(first.status, PullRequestStatus::Merged);
        assert!(first.merged_at.unwrap() > 0);
        assert_eq!(second.status, PullRequestStatus::Merged);
        assert_eq!(first.merged_at, second.merged_at);
        assert_eq!(second.assigned_reviewers, vec!["r1".to_string()]);
    }

    #[tokio::test]
    async fn merge_unknown_pr_fails() {
        let (_dir, pool) = setup().await;
        let err = merge_pull_request(&pool, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::PrNotFound { .. }));
    }

    #[tokio::test]
    async fn reassign_unknown_reviewer_on_unknown_pr_reports_pr_first() {
        let (_dir, pool) = setup().await;
        let err = reassign_reviewer(&pool, "nope", "nobody").await.unwrap_err();
        assert!(matches!(err, AppError::PrNotFound { .. }));
    }

    #[tokio::test]
    async fn reassign_never_picks_author_or_current_reviewers() {
        let (_dir, pool) = setup().await;
        for id in ["a", "r1", "r2", "r3"] {
            add_user(&pool, "backend", id, true).await;
        }
        let pr = create_pull_request(&pool, new_pr("pr-1", "a")).await.unwrap();
        let old = pr.assigned_reviewers[0].clone();
        let kept = pr.assigned_reviewers[1].clone();

        let outcome = reassign_reviewer(&pool, "pr-1", &old).await.unwrap();

        assert_ne!(outcome.replaced_by, "a");
        assert_ne!(outcome.replaced_by, old);
        assert_ne!(outcome.replaced_by, kept);
        let mut reviewers = outcome.pr.assigned_reviewers.clone();
        reviewers.sort();
        let mut expected = vec![kept, outcome.replaced_by.clone()];
        expected.sort();
        assert_eq!(reviewers, expected);
    }

    #[tokio::test]
    async fn get_pull_request_reflects_reviewers() {
        let (_dir, pool) = setup().await;
        add_user(&pool, "backend", "a", true).await;
        add_user(&pool, "backend", "r1", true).await;
        create_pull_request(&pool, new_pr("pr-1", "a")).await.unwrap();

        let pr = get_pull_request(&pool, "pr-1").await.unwrap();
        assert_eq!(pr.author_id, "a");
        assert_eq!(pr.assigned_reviewers, vec!["r1".to_string()]);

        assert!(matches!(
            get_pull_request(&pool, "missing").await,
            Err(AppError::PrNotFound { .. })
        ));
    }
}
