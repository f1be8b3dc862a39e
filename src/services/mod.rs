//! Business logic on top of the database layer.

pub mod auth;
pub mod pull_requests;
pub mod reviewer_selector;
pub mod teams;
pub mod users;
