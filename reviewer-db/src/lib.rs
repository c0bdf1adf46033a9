//! Database layer for the PR reviewer service
//!
//! SQLite-backed implementations of the repository traits from
//! `reviewer-core`: teams, users, pull requests and reviewer assignments.

pub mod connection;
pub mod error;
pub mod repos;
mod schema;

pub use connection::{Database, DatabaseConfig};
pub use error::{DbError, Result};
pub use repos::{PullRequestRepository, TeamRepository, UserRepository};

impl Database {
    /// Get the team repository
    pub fn teams(&self) -> TeamRepository {
        TeamRepository::new(self.pool().clone())
    }

    /// Get the user repository
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool().clone())
    }

    /// Get the pull request repository
    pub fn pull_requests(&self) -> PullRequestRepository {
        PullRequestRepository::new(self.pool().clone())
    }
}
