//! Pull request model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of a pull request. `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl From<&str> for PullRequestStatus {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Merged => write!(f, "MERGED"),
        }
    }
}

/// A pull request row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PullRequest {
    /// Caller-supplied identifier.
    pub pull_request_id: String,

    /// PR title.
    pub pull_request_name: String,

    /// Authoring user.
    pub author_id: String,

    /// Current status: `OPEN` or `MERGED`.
    pub status: String,

    /// Creation timestamp (Unix).
    pub created_at: i64,

    /// Merge timestamp (Unix, if merged).
    pub merged_at: Option<i64>,
}

impl PullRequest {
    /// Parse the status string into an enum.
    pub fn status_enum(&self) -> PullRequestStatus {
        PullRequestStatus::from(self.status.as_str())
    }

    pub fn is_merged(&self) -> bool {
        self.status_enum() == PullRequestStatus::Merged
    }

    /// Attach the current reviewer list.
    pub fn with_reviewers(self, assigned_reviewers: Vec<String>) -> PullRequestDetail {
        PullRequestDetail {
            status: self.status_enum(),
            pull_request_id: self.pull_request_id,
            pull_request_name: self.pull_request_name,
            author_id: self.author_id,
            assigned_reviewers,
            created_at: self.created_at,
            merged_at: self.merged_at,
        }
    }
}

/// Input for creating a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

/// A pull request together with its current reviewers.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestDetail {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    /// Reviewer ids; order is not significant.
    pub assigned_reviewers: Vec<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<i64>,
}

/// Short listing form used for a reviewer's queue.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

/// Result of swapping one reviewer for another.
#[derive(Debug, Clone, Serialize)]
pub struct ReassignOutcome {
    pub pr: PullRequestDetail,
    /// The newly assigned reviewer.
    pub replaced_by: String,
}
