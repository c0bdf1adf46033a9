//! Row types and their mapping onto the domain model

use chrono::{DateTime, Utc};
use reviewer_core::{PrStatus, PullRequest, PullRequestShort, User};

use crate::error::{DbError, Result};

/// Column list shared by every user query
pub(crate) const USER_COLUMNS: &str = "user_id, username, team_name, is_active";

/// Column list shared by every pull request query
pub(crate) const PR_COLUMNS: &str =
    "pull_request_id, pull_request_name, author_id, status, created_at, merged_at";

/// Row from `users`
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            username: row.username,
            team_name: row.team_name,
            is_active: row.is_active,
        }
    }
}

/// Row from `pull_requests`
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PullRequestRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRow {
    /// Combine with the reviewer relation into a hydrated pull request
    pub fn into_pull_request(self, assigned_reviewers: Vec<String>) -> Result<PullRequest> {
        Ok(PullRequest {
            status: parse_status(&self.status)?,
            id: self.pull_request_id,
            name: self.pull_request_name,
            author_id: self.author_id,
            assigned_reviewers,
            created_at: self.created_at,
            merged_at: self.merged_at,
        })
    }
}

/// Projection of `pull_requests` used in reviewer listings
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PullRequestShortRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl TryFrom<PullRequestShortRow> for PullRequestShort {
    type Error = DbError;

    fn try_from(row: PullRequestShortRow) -> Result<Self> {
        Ok(PullRequestShort {
            status: parse_status(&row.status)?,
            id: row.pull_request_id,
            name: row.pull_request_name,
            author_id: row.author_id,
        })
    }
}

pub(crate) fn parse_status(raw: &str) -> Result<PrStatus> {
    raw.parse()
        .map_err(|_| DbError::InvalidData(format!("Unknown pull request status '{}'", raw)))
}
