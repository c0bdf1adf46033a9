//! Team repository

use async_trait::async_trait;
use chrono::Utc;
use reviewer_core::{Error, Result, Team, TeamRepo, User};
use sqlx::SqlitePool;

use crate::error::{is_foreign_key_violation, is_unique_violation, storage};
use crate::schema::{UserRow, USER_COLUMNS};

/// Repository for teams and their membership
#[derive(Clone)]
pub struct TeamRepository {
    pool: SqlitePool,
}

impl TeamRepository {
    /// Create a new team repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn exists(&self, team_name: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = ?)")
            .bind(team_name)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }
}

#[async_trait]
impl TeamRepo for TeamRepository {
    async fn create_team(&self, team_name: &str) -> Result<()> {
        // The primary key decides; no lookup beforehand
        sqlx::query("INSERT INTO teams (team_name, created_at) VALUES (?, ?)")
            .bind(team_name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::TeamExists(team_name.to_string())
                } else {
                    storage(e)
                }
            })?;

        Ok(())
    }

    async fn get_team_with_members(&self, team_name: &str) -> Result<(Team, Vec<User>)> {
        if !self.exists(team_name).await? {
            return Err(Error::NotFound(format!("team '{}'", team_name)));
        }

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE team_name = ? ORDER BY user_id",
            USER_COLUMNS
        ))
        .bind(team_name)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok((
            Team::new(team_name),
            rows.into_iter().map(User::from).collect(),
        ))
    }

    async fn upsert_users_to_team(&self, team_name: &str, users: &[User]) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for user in users {
            sqlx::query(
                r#"
                INSERT INTO users (user_id, username, team_name, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (user_id) DO UPDATE
                   SET username = excluded.username,
                       team_name = excluded.team_name,
                       is_active = excluded.is_active,
                       updated_at = excluded.updated_at
                "#,
            )
            .bind(&user.user_id)
            .bind(&user.username)
            .bind(team_name)
            .bind(user.is_active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    Error::NotFound(format!("team '{}'", team_name))
                } else {
                    storage(e)
                }
            })?;
        }

        tx.commit().await.map_err(storage)?;

        tracing::debug!(team = %team_name, count = users.len(), "Users upserted");
        Ok(())
    }
}
