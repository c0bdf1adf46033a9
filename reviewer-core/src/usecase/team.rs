//! Team creation and lookup

use std::sync::Arc;

use crate::models::{Team, User};
use crate::repo::TeamRepo;
use crate::Result;

/// Team management use case
#[derive(Clone)]
pub struct TeamUsecase {
    teams: Arc<dyn TeamRepo>,
}

impl TeamUsecase {
    pub fn new(teams: Arc<dyn TeamRepo>) -> Self {
        Self { teams }
    }

    /// Create a team and upsert its members.
    ///
    /// The returned member list is everything now attached to the team,
    /// which can include users upserted by earlier calls.
    pub async fn create_team(&self, team_name: &str, members: &[User]) -> Result<Team> {
        self.teams.create_team(team_name).await?;
        self.teams.upsert_users_to_team(team_name, members).await?;

        tracing::info!(team = %team_name, members = members.len(), "Team created");

        self.get_team(team_name).await
    }

    /// Get a team with its members ordered by user id
    pub async fn get_team(&self, team_name: &str) -> Result<Team> {
        let (mut team, members) = self.teams.get_team_with_members(team_name).await?;
        team.members = members;
        Ok(team)
    }
}
