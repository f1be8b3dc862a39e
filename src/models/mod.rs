//! Data models for the application.
//!
//! These models represent the core entities stored in the SQLite database
//! and the shapes returned over HTTP.
//!
//! Row models derive FromRow for SQLx queries; response models derive Serialize.

pub mod pr_reviewer;
pub mod pull_request;
pub mod session;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pr_reviewer::PrReviewer;
pub use pull_request::{
    NewPullRequest, PullRequest, PullRequestDetail, PullRequestShort, PullRequestStatus,
    ReassignOutcome,
};
pub use session::{LoginResponse, Session, TokenPair};
pub use team::{Team, TeamMember, TeamWithMembers};
pub use user::{Role, User, UserResponse, UserReviews};
