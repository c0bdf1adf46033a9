//! Pull request lifecycle and reviewer assignment
//!
//! Reviewers are drawn from active members of a team. Creation takes up to
//! [`MAX_REVIEWERS`] from the author's team and accepts fewer. Reassignment
//! must find exactly one substitute from the old reviewer's team or fail.

use std::sync::Arc;

use crate::models::{PullRequest, StatusCounts};
use crate::repo::{PrRepo, UserRepo};
use crate::{Error, Result};

/// Reviewers assigned when a pull request is created
pub const MAX_REVIEWERS: usize = 2;

/// Candidates fetched when looking for a single replacement reviewer
pub const REASSIGN_CANDIDATE_POOL: usize = 20;

/// Pull request use case
#[derive(Clone)]
pub struct PrUsecase {
    users: Arc<dyn UserRepo>,
    prs: Arc<dyn PrRepo>,
}

impl PrUsecase {
    pub fn new(users: Arc<dyn UserRepo>, prs: Arc<dyn PrRepo>) -> Self {
        Self { users, prs }
    }

    /// Create an open pull request with up to two reviewers from the
    /// author's team.
    pub async fn create_pr(&self, pr_id: &str, name: &str, author_id: &str) -> Result<PullRequest> {
        let author = self.users.get_by_id(author_id).await?;

        let exclude = [author.user_id.clone()];
        let candidates = self
            .users
            .list_active_in_team_except(&author.team_name, &exclude, MAX_REVIEWERS)
            .await?;

        let reviewers: Vec<String> = candidates
            .into_iter()
            .map(|c| c.user_id)
            .filter(|id| *id != author.user_id)
            .take(MAX_REVIEWERS)
            .collect();

        let pr = PullRequest::new(pr_id, name, author_id);
        let created = self.prs.create_pr_with_reviewers(&pr, &reviewers).await?;

        tracing::info!(
            pr_id = %created.id,
            author = %created.author_id,
            reviewers = ?created.assigned_reviewers,
            "Pull request created"
        );

        Ok(created)
    }

    /// Replace `old_reviewer_id` with another active member of their team.
    ///
    /// Returns the updated pull request and the id of the new reviewer.
    pub async fn reassign(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String)> {
        let pr = self.prs.get_by_id_for_update(pr_id).await?;

        if pr.status.is_terminal() {
            return Err(Error::PrMerged(pr_id.to_string()));
        }

        let assigned = self.prs.get_assigned_reviewers(pr_id).await?;
        if !assigned.iter().any(|r| r == old_reviewer_id) {
            return Err(Error::NotAssigned {
                pr_id: pr_id.to_string(),
                user_id: old_reviewer_id.to_string(),
            });
        }

        let old_reviewer = self.users.get_by_id(old_reviewer_id).await?;

        let mut exclude = assigned.clone();
        exclude.push(pr.author_id.clone());

        let candidates = self
            .users
            .list_active_in_team_except(&old_reviewer.team_name, &exclude, REASSIGN_CANDIDATE_POOL)
            .await?;

        // The store filter is not trusted to be exhaustive; re-check in memory
        let next = candidates
            .into_iter()
            .map(|c| c.user_id)
            .find(|id| {
                id != old_reviewer_id && *id != pr.author_id && !assigned.contains(id)
            })
            .ok_or_else(|| Error::NoCandidate(pr_id.to_string()))?;

        let updated = self
            .prs
            .replace_reviewer(pr_id, old_reviewer_id, &next)
            .await?;

        tracing::info!(
            pr_id = %pr_id,
            old_reviewer = %old_reviewer_id,
            new_reviewer = %next,
            "Reviewer reassigned"
        );

        Ok((updated, next))
    }

    /// Mark the pull request as merged.
    ///
    /// Merging an already merged pull request succeeds and keeps the
    /// original `merged_at`.
    pub async fn merge(&self, pr_id: &str) -> Result<PullRequest> {
        let merged = self.prs.set_merged(pr_id).await?;
        tracing::info!(pr_id = %pr_id, merged_at = ?merged.merged_at, "Pull request merged");
        Ok(merged)
    }

    pub async fn stats_by_status(&self) -> Result<StatusCounts> {
        self.prs.stats_by_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrStatus, User};
    use crate::repo::memory::MemoryStore;
    use crate::repo::TeamRepo;
    use crate::ErrorKind;
    use std::collections::HashSet;

    async fn setup(members: &[User]) -> (PrUsecase, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.create_team("core").await.unwrap();
        store.upsert_users_to_team("core", members).await.unwrap();
        (PrUsecase::new(store.clone(), store.clone()), store)
    }

    fn core_members() -> Vec<User> {
        vec![
            User::new("u1", "Alice", "core"),
            User::new("u2", "Bob", "core"),
            User::new("u3", "Carol", "core").with_active(false),
        ]
    }

    fn big_team(n: usize) -> Vec<User> {
        (1..=n)
            .map(|i| User::new(format!("u{}", i), format!("User {}", i), "core"))
            .collect()
    }

    #[tokio::test]
    async fn test_create_pr_skips_inactive_and_author() {
        let (uc, _) = setup(&core_members()).await;

        let pr = uc.create_pr("pr1", "fix", "u1").await.unwrap();
        assert_eq!(pr.status, PrStatus::Open);
        assert_eq!(pr.assigned_reviewers, vec!["u2".to_string()]);
        assert!(pr.merged_at.is_none());
    }

    #[tokio::test]
    async fn test_create_pr_assigns_two_distinct_reviewers() {
        let (uc, _) = setup(&big_team(6)).await;

        for i in 0..20 {
            let pr = uc
                .create_pr(&format!("pr{}", i), "feature", "u1")
                .await
                .unwrap();
            let set: HashSet<_> = pr.assigned_reviewers.iter().collect();
            assert_eq!(pr.assigned_reviewers.len(), 2);
            assert_eq!(set.len(), 2);
            assert!(!pr.has_reviewer("u1"));
        }
    }

    #[tokio::test]
    async fn test_create_pr_without_teammates() {
        let (uc, _) = setup(&[
            User::new("solo", "Solo", "core"),
            User::new("away", "Away", "core").with_active(false),
        ])
        .await;

        let pr = uc.create_pr("pr1", "lonely", "solo").await.unwrap();
        assert!(pr.assigned_reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_create_pr_unknown_author() {
        let (uc, _) = setup(&core_members()).await;
        let err = uc.create_pr("pr1", "fix", "ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_pr_duplicate_id() {
        let (uc, _) = setup(&core_members()).await;
        uc.create_pr("pr1", "fix", "u1").await.unwrap();

        let err = uc.create_pr("pr1", "other name", "u2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrExists);
    }

    #[tokio::test]
    async fn test_reassign_picks_fresh_reviewer() {
        let (uc, _) = setup(&big_team(6)).await;
        let pr = uc.create_pr("pr1", "feature", "u1").await.unwrap();
        let before = pr.assigned_reviewers.clone();
        let old = before[0].clone();

        let (updated, new_id) = uc.reassign("pr1", &old).await.unwrap();

        assert_eq!(updated.assigned_reviewers.len(), before.len());
        assert!(!updated.has_reviewer(&old));
        assert!(updated.has_reviewer(&new_id));
        assert_ne!(new_id, "u1");
        assert!(!before.contains(&new_id));
        // The untouched reviewer is still there
        assert!(updated.has_reviewer(&before[1]));
    }

    #[tokio::test]
    async fn test_reassign_no_candidate() {
        let (uc, _) = setup(&core_members()).await;
        uc.create_pr("pr1", "fix", "u1").await.unwrap();

        let err = uc.reassign("pr1", "u2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCandidate);
    }

    #[tokio::test]
    async fn test_reassign_merged_pr_leaves_reviewers() {
        let (uc, store) = setup(&big_team(4)).await;
        let pr = uc.create_pr("pr1", "feature", "u1").await.unwrap();
        uc.merge("pr1").await.unwrap();

        let err = uc
            .reassign("pr1", &pr.assigned_reviewers[0])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrMerged);

        let after = store.get_assigned_reviewers("pr1").await.unwrap();
        assert_eq!(after, pr.assigned_reviewers);
    }

    #[tokio::test]
    async fn test_reassign_not_assigned() {
        let (uc, _) = setup(&core_members()).await;
        uc.create_pr("pr1", "fix", "u1").await.unwrap();

        let err = uc.reassign("pr1", "u3").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAssigned);
    }

    #[tokio::test]
    async fn test_reassign_missing_pr() {
        let (uc, _) = setup(&core_members()).await;
        let err = uc.reassign("nope", "u2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reassign_unresolvable_reviewer() {
        let (uc, store) = setup(&core_members()).await;
        // A reviewer id that no user record backs
        store
            .create_pr_with_reviewers(&PullRequest::new("pr1", "fix", "u1"), &["ghost".into()])
            .await
            .unwrap();

        let err = uc.reassign("pr1", "ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reassign_draws_from_old_reviewers_team() {
        let (uc, store) = setup(&[
            User::new("u1", "Alice", "core"),
            User::new("u2", "Bob", "core"),
        ])
        .await;
        uc.create_pr("pr1", "fix", "u1").await.unwrap();

        // Bob moves to infra, where Dan is the only other active member
        store.create_team("infra").await.unwrap();
        store
            .upsert_users_to_team(
                "infra",
                &[User::new("u2", "Bob", "infra"), User::new("u4", "Dan", "infra")],
            )
            .await
            .unwrap();

        let (updated, new_id) = uc.reassign("pr1", "u2").await.unwrap();
        assert_eq!(new_id, "u4");
        assert_eq!(updated.assigned_reviewers, vec!["u4".to_string()]);
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let (uc, _) = setup(&core_members()).await;
        uc.create_pr("pr1", "fix", "u1").await.unwrap();

        let first = uc.merge("pr1").await.unwrap();
        let second = uc.merge("pr1").await.unwrap();

        assert_eq!(first.status, PrStatus::Merged);
        assert_eq!(second.status, PrStatus::Merged);
        assert!(first.merged_at.is_some());
        assert_eq!(first.merged_at, second.merged_at);
        assert_eq!(first.assigned_reviewers, second.assigned_reviewers);
    }

    #[tokio::test]
    async fn test_merge_unknown_pr() {
        let (uc, _) = setup(&core_members()).await;
        let err = uc.merge("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_stats_cover_both_statuses() {
        let (uc, _) = setup(&core_members()).await;

        let empty = uc.stats_by_status().await.unwrap();
        assert_eq!(empty.open, 0);
        assert_eq!(empty.merged, 0);

        uc.create_pr("pr1", "a", "u1").await.unwrap();
        uc.create_pr("pr2", "b", "u1").await.unwrap();
        uc.create_pr("pr3", "c", "u2").await.unwrap();
        uc.merge("pr2").await.unwrap();

        let stats = uc.stats_by_status().await.unwrap();
        assert_eq!(stats.open, 2);
        assert_eq!(stats.merged, 1);
        assert_eq!(stats.total(), 3);
    }
}
