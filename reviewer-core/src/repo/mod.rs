//! Repository contracts consumed by the use cases.
//!
//! Implementations translate store failures into [`crate::Error`] at this
//! boundary: uniqueness violations become `TeamExists`/`PrExists`, missing
//! rows become `NotFound`, and everything else becomes `Storage`.

pub mod memory;

use async_trait::async_trait;

use crate::models::{PullRequest, PullRequestShort, StatusCounts, Team, User};
use crate::Result;

/// Team persistence
#[async_trait]
pub trait TeamRepo: Send + Sync {
    /// Create an empty team.
    ///
    /// Fails with `TeamExists` if the name is taken. Must rely on the store's
    /// uniqueness guarantee, not on a prior lookup.
    async fn create_team(&self, team_name: &str) -> Result<()>;

    /// Get a team and its members ordered by user id.
    async fn get_team_with_members(&self, team_name: &str) -> Result<(Team, Vec<User>)>;

    /// Insert or update users by user id and attach them to the team.
    ///
    /// No-op on an empty slice.
    async fn upsert_users_to_team(&self, team_name: &str, users: &[User]) -> Result<()>;
}

/// User persistence
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, user_id: &str) -> Result<User>;

    /// Set the active flag and return the updated user.
    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User>;

    /// Random sample of at most `limit` active users in the team whose ids
    /// are not in `exclude_ids`.
    ///
    /// The order of the result is unspecified; callers must not rely on it.
    async fn list_active_in_team_except(
        &self,
        team_name: &str,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<User>>;
}

/// Pull request persistence
#[async_trait]
pub trait PrRepo: Send + Sync {
    /// Atomically insert an open pull request together with its reviewers.
    ///
    /// Fails with `PrExists` if the id is taken.
    async fn create_pr_with_reviewers(
        &self,
        pr: &PullRequest,
        reviewers: &[String],
    ) -> Result<PullRequest>;

    async fn get_by_id_for_update(&self, pr_id: &str) -> Result<PullRequest>;

    /// Reviewer ids in assignment order
    async fn get_assigned_reviewers(&self, pr_id: &str) -> Result<Vec<String>>;

    /// Atomically swap `old_id` for `new_id` in the reviewer set.
    async fn replace_reviewer(&self, pr_id: &str, old_id: &str, new_id: &str)
        -> Result<PullRequest>;

    /// Mark as merged. `merged_at` is only written the first time.
    async fn set_merged(&self, pr_id: &str) -> Result<PullRequest>;

    /// Pull requests the user currently reviews, newest first
    async fn list_by_reviewer(&self, reviewer_id: &str) -> Result<Vec<PullRequestShort>>;

    async fn stats_by_status(&self) -> Result<StatusCounts>;
}
