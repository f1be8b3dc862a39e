//! Application error types.
//!
//! Every engine operation returns one of these variants. They are
//! serializable so the HTTP layer (and tests) can inspect a stable shape.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by services and mapped to HTTP
/// responses by the server layer.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// A pull request with this identifier already exists.
    #[error("PR id already exists")]
    PrAlreadyExists { pull_request_id: String },

    /// User does not exist, or is inactive where an active user is required.
    #[error("user not found")]
    UserNotFound { user_id: String },

    /// Pull request identifier is unknown.
    #[error("pull request not found")]
    PrNotFound { pull_request_id: String },

    /// Reviewer changes were attempted on a merged pull request.
    #[error("cannot reassign on merged PR")]
    PrMerged { pull_request_id: String },

    /// The reviewer to replace is not assigned to the pull request.
    #[error("reviewer is not assigned to this PR")]
    ReviewerNotAssigned {
        pull_request_id: String,
        reviewer_id: String,
    },

    /// No active teammate is left to take over a review.
    #[error("no active replacement candidate in team")]
    NoCandidateAvailable { pull_request_id: String },

    /// Team name is already taken.
    #[error("team_name already exists")]
    TeamAlreadyExists { team_name: String },

    /// Team does not exist.
    #[error("resource not found")]
    TeamNotFound { team_name: String },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Missing, malformed or expired credentials.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Authenticated caller lacks the required role.
    #[error("Insufficient permissions")]
    Forbidden,

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn pr_already_exists(pull_request_id: impl Into<String>) -> Self {
        Self::PrAlreadyExists {
            pull_request_id: pull_request_id.into(),
        }
    }

    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn pr_not_found(pull_request_id: impl Into<String>) -> Self {
        Self::PrNotFound {
            pull_request_id: pull_request_id.into(),
        }
    }

    pub fn pr_merged(pull_request_id: impl Into<String>) -> Self {
        Self::PrMerged {
            pull_request_id: pull_request_id.into(),
        }
    }

    pub fn reviewer_not_assigned(
        pull_request_id: impl Into<String>,
        reviewer_id: impl Into<String>,
    ) -> Self {
        Self::ReviewerNotAssigned {
            pull_request_id: pull_request_id.into(),
            reviewer_id: reviewer_id.into(),
        }
    }

    pub fn no_candidate(pull_request_id: impl Into<String>) -> Self {
        Self::NoCandidateAvailable {
            pull_request_id: pull_request_id.into(),
        }
    }

    pub fn team_already_exists(team_name: impl Into<String>) -> Self {
        Self::TeamAlreadyExists {
            team_name: team_name.into(),
        }
    }

    pub fn team_not_found(team_name: impl Into<String>) -> Self {
        Self::TeamNotFound {
            team_name: team_name.into(),
        }
    }

    /// Create a database error with optional operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PrAlreadyExists { .. } => "PR_EXISTS",
            Self::UserNotFound { .. } | Self::PrNotFound { .. } | Self::TeamNotFound { .. } => {
                "NOT_FOUND"
            }
            Self::PrMerged { .. } => "PR_MERGED",
            Self::ReviewerNotAssigned { .. } => "NOT_ASSIGNED",
            Self::NoCandidateAvailable { .. } => "NO_CANDIDATE",
            Self::TeamAlreadyExists { .. } => "TEAM_EXISTS",
            Self::Authentication { .. } => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Database { .. } | Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether this error hides an infrastructure failure from the caller.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::Internal { .. })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::authentication("Token expired"),
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::authentication("Token is not valid"),
            _ => Self::internal(format!("token error: {}", err)),
        }
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}
