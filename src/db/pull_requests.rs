//! Pull request and reviewer assignment queries.
//!
//! The lifecycle engine calls these inside a single write transaction; none
//! of them commit on their own.

use crate::error::AppError;
use crate::models::{NewPullRequest, PrReviewer, PullRequest};
use sqlx::SqliteConnection;

pub async fn pr_exists(conn: &mut SqliteConnection, pull_request_id: &str) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = ?)",
    )
    .bind(pull_request_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

pub async fn find_pull_request(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Option<PullRequest>, AppError> {
    let pr = sqlx::query_as::<_, PullRequest>(
        r#"
        SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE pull_request_id = ?
        "#,
    )
    .bind(pull_request_id)
    .fetch_optional(conn)
    .await?;

    Ok(pr)
}

/// Insert a new OPEN pull request.
///
/// A primary-key clash is reported as `PrAlreadyExists`.
pub async fn insert_pull_request(
    conn: &mut SqliteConnection,
    input: &NewPullRequest,
    now: i64,
) -> Result<PullRequest, AppError> {
    let result = sqlx::query_as::<_, PullRequest>(
        r#"
        INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at)
        VALUES (?, ?, ?, 'OPEN', ?)
        RETURNING pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        "#,
    )
    .bind(&input.pull_request_id)
    .bind(&input.pull_request_name)
    .bind(&input.author_id)
    .bind(now)
    .fetch_one(conn)
    .await;

    match result {
        Ok(pr) => Ok(pr),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::pr_already_exists(&input.pull_request_id))
        }
        Err(err) => Err(err.into()),
    }
}

/// Flip an OPEN pull request to MERGED. Returns the updated row, or `None`
/// if it was not OPEN.
pub async fn mark_merged(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    now: i64,
) -> Result<Option<PullRequest>, AppError> {
    let pr = sqlx::query_as::<_, PullRequest>(
        r#"
        UPDATE pull_requests
        SET status = 'MERGED', merged_at = ?
        WHERE pull_request_id = ? AND status = 'OPEN'
        RETURNING pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        "#,
    )
    .bind(now)
    .bind(pull_request_id)
    .fetch_optional(conn)
    .await?;

    Ok(pr)
}

pub async fn insert_reviewer(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
    now: i64,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO pr_reviewers (pull_request_id, reviewer_id, assigned_at) VALUES (?, ?, ?)",
    )
    .bind(pull_request_id)
    .bind(reviewer_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Remove one assignment. Returns whether a row was deleted.
pub async fn delete_reviewer(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM pr_reviewers WHERE pull_request_id = ? AND reviewer_id = ?")
        .bind(pull_request_id)
        .bind(reviewer_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Current assignments, oldest first.
pub async fn list_reviewers(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<PrReviewer>, AppError> {
    let reviewers = sqlx::query_as::<_, PrReviewer>(
        r#"
        SELECT pull_request_id, reviewer_id, assigned_at
        FROM pr_reviewers
        WHERE pull_request_id = ?
        ORDER BY assigned_at, reviewer_id
        "#,
    )
    .bind(pull_request_id)
    .fetch_all(conn)
    .await?;

    Ok(reviewers)
}

/// Current reviewer ids.
pub async fn reviewer_ids(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<String>, AppError> {
    let reviewers = list_reviewers(conn, pull_request_id).await?;
    Ok(reviewers.into_iter().map(|r| r.reviewer_id).collect())
}
