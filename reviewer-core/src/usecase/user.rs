//! User activity and review listings

use std::sync::Arc;

use crate::models::{PullRequestShort, User};
use crate::repo::{PrRepo, UserRepo};
use crate::Result;

/// User management use case
#[derive(Clone)]
pub struct UserUsecase {
    users: Arc<dyn UserRepo>,
    prs: Arc<dyn PrRepo>,
}

impl UserUsecase {
    pub fn new(users: Arc<dyn UserRepo>, prs: Arc<dyn PrRepo>) -> Self {
        Self { users, prs }
    }

    /// Toggle whether the user can be picked as a reviewer
    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let user = self.users.set_active(user_id, is_active).await?;
        tracing::info!(user_id = %user_id, is_active, "User activity updated");
        Ok(user)
    }

    /// Pull requests the user is reviewing, newest first.
    ///
    /// An unknown user id yields an empty list rather than `NotFound`.
    pub async fn get_reviews(&self, user_id: &str) -> Result<Vec<PullRequestShort>> {
        self.prs.list_by_reviewer(user_id).await
    }
}
