//! User repository

use async_trait::async_trait;
use chrono::Utc;
use reviewer_core::{Error, Result, User, UserRepo};
use sqlx::SqlitePool;

use crate::error::storage;
use crate::schema::{UserRow, USER_COLUMNS};

/// Repository for user records
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for UserRepository {
    async fn get_by_id(&self, user_id: &str) -> Result<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE user_id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .map(User::from)
        .ok_or_else(|| Error::NotFound(format!("user '{}'", user_id)))
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE user_id = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user '{}'", user_id)));
        }

        self.get_by_id(user_id).await
    }

    async fn list_active_in_team_except(
        &self,
        team_name: &str,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<User>> {
        let mut query = format!(
            "SELECT {} FROM users WHERE team_name = ? AND is_active = 1",
            USER_COLUMNS
        );

        if !exclude_ids.is_empty() {
            let placeholders = vec!["?"; exclude_ids.len()].join(", ");
            query.push_str(&format!(" AND user_id NOT IN ({})", placeholders));
        }

        query.push_str(" ORDER BY RANDOM() LIMIT ?");

        let mut q = sqlx::query_as::<_, UserRow>(&query).bind(team_name);
        for id in exclude_ids {
            q = q.bind(id);
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = q
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
