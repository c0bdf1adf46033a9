//! In-memory implementation of the repository contracts.
//!
//! All state lives in a single `RwLock` and is lost on restart. Every trait
//! method takes the lock once, so each call is atomic with respect to the
//! others, matching the one-transaction-per-call behaviour of the SQL store.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;

use super::{PrRepo, TeamRepo, UserRepo};
use crate::models::{PrStatus, PullRequest, PullRequestShort, StatusCounts, Team, User};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct State {
    teams: BTreeSet<String>,
    users: BTreeMap<String, User>,
    /// Pull requests in insertion order
    prs: Vec<PullRequest>,
}

impl State {
    fn pr(&self, pr_id: &str) -> Result<&PullRequest> {
        self.prs
            .iter()
            .find(|pr| pr.id == pr_id)
            .ok_or_else(|| Error::NotFound(format!("pull request '{}'", pr_id)))
    }

    fn pr_mut(&mut self, pr_id: &str) -> Result<&mut PullRequest> {
        self.prs
            .iter_mut()
            .find(|pr| pr.id == pr_id)
            .ok_or_else(|| Error::NotFound(format!("pull request '{}'", pr_id)))
    }
}

/// Process-local store implementing [`TeamRepo`], [`UserRepo`] and [`PrRepo`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepo for MemoryStore {
    async fn create_team(&self, team_name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.teams.insert(team_name.to_string()) {
            return Err(Error::TeamExists(team_name.to_string()));
        }
        Ok(())
    }

    async fn get_team_with_members(&self, team_name: &str) -> Result<(Team, Vec<User>)> {
        let state = self.state.read().await;
        if !state.teams.contains(team_name) {
            return Err(Error::NotFound(format!("team '{}'", team_name)));
        }

        // BTreeMap iteration is already ordered by user id
        let members = state
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .collect();

        Ok((Team::new(team_name), members))
    }

    async fn upsert_users_to_team(&self, team_name: &str, users: &[User]) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        if !state.teams.contains(team_name) {
            return Err(Error::NotFound(format!("team '{}'", team_name)));
        }

        for user in users {
            let stored = User {
                team_name: team_name.to_string(),
                ..user.clone()
            };
            state.users.insert(stored.user_id.clone(), stored);
        }

        Ok(())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn get_by_id(&self, user_id: &str) -> Result<User> {
        let state = self.state.read().await;
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user '{}'", user_id)))
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| Error::NotFound(format!("user '{}'", user_id)))?;
        user.is_active = is_active;
        Ok(user.clone())
    }

    async fn list_active_in_team_except(
        &self,
        team_name: &str,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut eligible: Vec<User> = state
            .users
            .values()
            .filter(|u| u.team_name == team_name && u.is_active)
            .filter(|u| !exclude_ids.contains(&u.user_id))
            .cloned()
            .collect();

        eligible.shuffle(&mut rand::thread_rng());
        eligible.truncate(limit);
        Ok(eligible)
    }
}

#[async_trait]
impl PrRepo for MemoryStore {
    async fn create_pr_with_reviewers(
        &self,
        pr: &PullRequest,
        reviewers: &[String],
    ) -> Result<PullRequest> {
        let mut state = self.state.write().await;
        if state.prs.iter().any(|p| p.id == pr.id) {
            return Err(Error::PrExists(pr.id.clone()));
        }

        let stored = PullRequest {
            status: PrStatus::Open,
            assigned_reviewers: reviewers.to_vec(),
            merged_at: None,
            ..pr.clone()
        };
        state.prs.push(stored.clone());
        Ok(stored)
    }

    async fn get_by_id_for_update(&self, pr_id: &str) -> Result<PullRequest> {
        let state = self.state.read().await;
        state.pr(pr_id).cloned()
    }

    async fn get_assigned_reviewers(&self, pr_id: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .prs
            .iter()
            .find(|pr| pr.id == pr_id)
            .map(|pr| pr.assigned_reviewers.clone())
            .unwrap_or_default())
    }

    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_id: &str,
        new_id: &str,
    ) -> Result<PullRequest> {
        let mut state = self.state.write().await;
        let pr = state.pr_mut(pr_id)?;
        if pr.has_reviewer(new_id) {
            return Err(Error::Storage(format!(
                "reviewer '{}' already assigned to '{}'",
                new_id, pr_id
            )));
        }
        pr.assigned_reviewers.retain(|r| r != old_id);
        pr.assigned_reviewers.push(new_id.to_string());
        Ok(pr.clone())
    }

    async fn set_merged(&self, pr_id: &str) -> Result<PullRequest> {
        let mut state = self.state.write().await;
        let pr = state.pr_mut(pr_id)?;
        pr.status = PrStatus::Merged;
        pr.merged_at.get_or_insert_with(Utc::now);
        Ok(pr.clone())
    }

    async fn list_by_reviewer(&self, reviewer_id: &str) -> Result<Vec<PullRequestShort>> {
        let state = self.state.read().await;
        // Reverse insertion order breaks ties between equal timestamps
        let mut prs: Vec<&PullRequest> = state
            .prs
            .iter()
            .rev()
            .filter(|pr| pr.has_reviewer(reviewer_id))
            .collect();
        prs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(prs.into_iter().map(PullRequest::to_short).collect())
    }

    async fn stats_by_status(&self) -> Result<StatusCounts> {
        let state = self.state.read().await;
        let mut counts = StatusCounts::default();
        for pr in &state.prs {
            counts.add(pr.status, 1);
        }
        Ok(counts)
    }
}
