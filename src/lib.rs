//! Pull request reviewer assignment service.
//!
//! Tracks pull requests within teams, assigns reviewers at random from the
//! author's active teammates, and keeps the reviewer set consistent across
//! merges and reassignments. The HTTP surface lives in [`server`]; the
//! lifecycle rules live in [`services::pull_requests`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
