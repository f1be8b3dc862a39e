//! Reviewer assignment model.

use serde::Serialize;
use sqlx::FromRow;

/// One current reviewer of a pull request.
///
/// Rows are inserted at creation and swapped one-for-one on reassignment;
/// they are never updated in place.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrReviewer {
    pub pull_request_id: String,
    pub reviewer_id: String,
    /// When the reviewer was assigned (Unix).
    pub assigned_at: i64,
}
