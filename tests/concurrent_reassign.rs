//! Concurrency tests for reviewer reassignment.
//!
//! Racing writers on the same pull request must serialize: two attempts to
//! replace the same reviewer produce one success and one
//! `ReviewerNotAssigned`, and the reviewer set never ends up with a
//! duplicate or a missing row.

use pr_reviewer_lib::db;
use pr_reviewer_lib::db::pool::DbPool;
use pr_reviewer_lib::error::AppError;
use pr_reviewer_lib::models::{NewPullRequest, TeamMember};
use pr_reviewer_lib::services::{pull_requests, teams};
use std::collections::HashSet;
use tempfile::{tempdir, TempDir};

async fn setup(member_ids: &[&str]) -> (TempDir, DbPool) {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("race.db")).await.unwrap();
    let members = member_ids
        .iter()
        .map(|id| TeamMember {
            user_id: id.to_string(),
            username: id.to_string(),
            is_active: true,
        })
        .collect();
    teams::create_team(&pool, "backend", members).await.unwrap();
    (dir, pool)
}

fn new_pr(id: &str) -> NewPullRequest {
    NewPullRequest {
        pull_request_id: id.to_string(),
        pull_request_name: "Race".to_string(),
        author_id: "a".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_reassignments_of_same_reviewer() {
    let (_dir, pool) = setup(&["a", "r1", "r2", "r3", "r4", "r5"]).await;

    for round in 0..10 {
        let id = format!("pr-{}", round);
        let pr = pull_requests::create_pull_request(&pool, new_pr(&id))
            .await
            .unwrap();
        let target = pr.assigned_reviewers[0].clone();

        let first = tokio::spawn({
            let (pool, id, target) = (pool.clone(), id.clone(), target.clone());
            async move { pull_requests::reassign_reviewer(&pool, &id, &target).await }
        });
        let second = tokio::spawn({
            let (pool, id, target) = (pool.clone(), id.clone(), target.clone());
            async move { pull_requests::reassign_reviewer(&pool, &id, &target).await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let not_assigned = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::ReviewerNotAssigned { .. })))
            .count();
        assert_eq!(successes, 1, "round {}: {:?}", round, results);
        assert_eq!(not_assigned, 1, "round {}: {:?}", round, results);

        let stored = pull_requests::get_pull_request(&pool, &id).await.unwrap();
        let reviewers: HashSet<&str> =
            stored.assigned_reviewers.iter().map(String::as_str).collect();
        assert_eq!(stored.assigned_reviewers.len(), 2);
        assert_eq!(reviewers.len(), 2);
        assert!(!reviewers.contains(target.as_str()));
        assert!(!reviewers.contains("a"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_creates_with_same_id() {
    let (_dir, pool) = setup(&["a", "r1", "r2"]).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { pull_requests::create_pull_request(&pool, new_pr("pr-1")).await })
        })
        .collect();

    let mut created = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::PrAlreadyExists { .. }) => duplicates += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(duplicates, 3);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pr_reviewers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 2);
}
