//! Pull request repository, including the reviewer relation

use async_trait::async_trait;
use chrono::Utc;
use reviewer_core::{
    Error, PrRepo, PrStatus, PullRequest, PullRequestShort, Result, StatusCounts,
};
use sqlx::SqlitePool;

use crate::error::{is_unique_violation, storage, DbError};
use crate::schema::{parse_status, PullRequestRow, PullRequestShortRow, PR_COLUMNS};

/// Repository for pull requests and their reviewers
#[derive(Clone)]
pub struct PullRequestRepository {
    pool: SqlitePool,
}

impl PullRequestRepository {
    /// Create a new pull request repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn exists(&self, pr_id: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = ?)",
        )
        .bind(pr_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)
    }

    /// Load a pull request with its reviewers
    async fn get_by_id(&self, pr_id: &str) -> Result<PullRequest> {
        let row = sqlx::query_as::<_, PullRequestRow>(&format!(
            "SELECT {} FROM pull_requests WHERE pull_request_id = ?",
            PR_COLUMNS
        ))
        .bind(pr_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or_else(|| Error::NotFound(format!("pull request '{}'", pr_id)))?;

        let reviewers = self.get_assigned_reviewers(pr_id).await?;
        Ok(row.into_pull_request(reviewers)?)
    }
}

#[async_trait]
impl PrRepo for PullRequestRepository {
    async fn create_pr_with_reviewers(
        &self,
        pr: &PullRequest,
        reviewers: &[String],
    ) -> Result<PullRequest> {
        // Cheap early exit; the primary key below is what actually decides
        if self.exists(&pr.id).await? {
            return Err(Error::PrExists(pr.id.clone()));
        }

        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(
            r#"
            INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pr.id)
        .bind(&pr.name)
        .bind(&pr.author_id)
        .bind(PrStatus::Open.as_str())
        .bind(pr.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::PrExists(pr.id.clone())
            } else {
                storage(e)
            }
        })?;

        let assigned_at = Utc::now();
        for reviewer_id in reviewers {
            sqlx::query(
                "INSERT INTO pr_reviewers (pull_request_id, reviewer_id, assigned_at) VALUES (?, ?, ?)",
            )
            .bind(&pr.id)
            .bind(reviewer_id)
            .bind(assigned_at)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;

        self.get_by_id(&pr.id).await
    }

    async fn get_by_id_for_update(&self, pr_id: &str) -> Result<PullRequest> {
        self.get_by_id(pr_id).await
    }

    async fn get_assigned_reviewers(&self, pr_id: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT reviewer_id FROM pr_reviewers WHERE pull_request_id = ? ORDER BY rowid",
        )
        .bind(pr_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)
    }

    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_id: &str,
        new_id: &str,
    ) -> Result<PullRequest> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query("DELETE FROM pr_reviewers WHERE pull_request_id = ? AND reviewer_id = ?")
            .bind(pr_id)
            .bind(old_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        sqlx::query(
            "INSERT INTO pr_reviewers (pull_request_id, reviewer_id, assigned_at) VALUES (?, ?, ?)",
        )
        .bind(pr_id)
        .bind(new_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        self.get_by_id(pr_id).await
    }

    async fn set_merged(&self, pr_id: &str) -> Result<PullRequest> {
        sqlx::query(
            r#"
            UPDATE pull_requests
               SET status = ?, merged_at = COALESCE(merged_at, ?)
             WHERE pull_request_id = ?
            "#,
        )
        .bind(PrStatus::Merged.as_str())
        .bind(Utc::now())
        .bind(pr_id)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        self.get_by_id(pr_id).await
    }

    async fn list_by_reviewer(&self, reviewer_id: &str) -> Result<Vec<PullRequestShort>> {
        let rows = sqlx::query_as::<_, PullRequestShortRow>(
            r#"
            SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
              FROM pull_requests pr
              JOIN pr_reviewers r ON r.pull_request_id = pr.pull_request_id
             WHERE r.reviewer_id = ?
             ORDER BY pr.created_at DESC, pr.rowid DESC
            "#,
        )
        .bind(reviewer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter()
            .map(|row| PullRequestShort::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn stats_by_status(&self) -> Result<StatusCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM pull_requests GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let count = u64::try_from(count)
                .map_err(|_| DbError::InvalidData(format!("Negative count for {}", status)))?;
            counts.add(parse_status(&status)?, count);
        }

        Ok(counts)
    }
}
