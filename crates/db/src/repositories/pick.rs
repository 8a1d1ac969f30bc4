use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::{info, warn};

use scuderia_core::domain::pick::{
    Pick, PickRejection, PickSelection, PickStats, SaveOutcome, UserId,
};

use super::{PickStore, RepositoryError};
use crate::DbPool;

/// SQLite-backed store. The `driver` column is UNIQUE, so a conflicting claim
/// fails inside the same statement that would write it. Writers from this
/// process are also queued on `writer` so they never contend for the SQLite
/// write lock.
pub struct SqlPickStore {
    pool: DbPool,
    writer: Mutex<()>,
}

impl SqlPickStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, writer: Mutex::new(()) }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Picks ordered by their last change, most recent first.
    pub async fn get_picks_by_recency(&self) -> Result<Vec<Pick>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, ea_username, team, driver, created_at, updated_at
             FROM user_picks ORDER BY updated_at DESC, pick_seq DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_pick).collect()
    }
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid {column} `{value}`: {error}")))
}

fn row_to_pick(row: &sqlx::sqlite::SqliteRow) -> Result<Pick, RepositoryError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ea_username: Option<String> =
        row.try_get("ea_username").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let team: String = row.try_get("team").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let driver: String =
        row.try_get("driver").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Pick {
        user_id: UserId(user_id),
        team,
        driver,
        ea_username,
        created_at: parse_timestamp("created_at", &created_at_str)?,
        updated_at: parse_timestamp("updated_at", &updated_at_str)?,
    })
}

#[async_trait::async_trait]
impl PickStore for SqlPickStore {
    async fn save(&self, selection: PickSelection) -> Result<SaveOutcome, RepositoryError> {
        let _writer = self.writer.lock().await;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO user_picks (user_id, ea_username, team, driver, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 team = excluded.team,
                 driver = excluded.driver,
                 ea_username = COALESCE(excluded.ea_username, user_picks.ea_username),
                 updated_at = excluded.updated_at
             RETURNING user_id, ea_username, team, driver, created_at, updated_at",
        )
        .bind(selection.user_id.as_str())
        .bind(&selection.ea_username)
        .bind(&selection.team)
        .bind(&selection.driver)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                let pick = row_to_pick(&row)?;
                info!(
                    event_name = "pick.save.accepted",
                    user_id = %pick.user_id,
                    team = %pick.team,
                    driver = %pick.driver,
                    "pick stored"
                );
                Ok(SaveOutcome::Accepted(pick))
            }
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                info!(
                    event_name = "pick.save.driver_taken",
                    user_id = %selection.user_id,
                    driver = %selection.driver,
                    "driver already claimed by another user"
                );
                Ok(SaveOutcome::Rejected(PickRejection::DriverTaken { driver: selection.driver }))
            }
            Err(error) => {
                warn!(
                    event_name = "pick.save.storage_failure",
                    user_id = %selection.user_id,
                    error = %error,
                    "pick save failed"
                );
                Err(error.into())
            }
        }
    }

    async fn get_user_pick(&self, user_id: &UserId) -> Result<Option<Pick>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, ea_username, team, driver, created_at, updated_at
             FROM user_picks WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_pick).transpose()
    }

    async fn get_all_picks(&self) -> Result<Vec<Pick>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, ea_username, team, driver, created_at, updated_at
             FROM user_picks ORDER BY pick_seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_pick).collect()
    }

    async fn get_selected_drivers(&self) -> Result<HashSet<String>, RepositoryError> {
        let drivers: Vec<String> =
            sqlx::query_scalar("SELECT driver FROM user_picks").fetch_all(&self.pool).await?;
        Ok(drivers.into_iter().collect())
    }

    async fn stats(&self) -> Result<PickStats, RepositoryError> {
        let (total, teams, drivers): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT team), COUNT(DISTINCT driver) FROM user_picks",
        )
        .fetch_one(&self.pool)
        .await?;

        let to_count = |value: i64| {
            u64::try_from(value)
                .map_err(|_| RepositoryError::Decode(format!("negative count `{value}`")))
        };

        Ok(PickStats {
            total_picks: to_count(total)?,
            unique_teams: to_count(teams)?,
            unique_drivers: to_count(drivers)?,
        })
    }

    async fn clear(&self) -> Result<u64, RepositoryError> {
        let _writer = self.writer.lock().await;
        let removed = sqlx::query("DELETE FROM user_picks").execute(&self.pool).await?;
        info!(
            event_name = "pick.store.cleared",
            removed = removed.rows_affected(),
            "all picks removed"
        );
        Ok(removed.rows_affected())
    }
}
