use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use scuderia_core::domain::pick::{
    Pick, PickRejection, PickSelection, PickStats, SaveOutcome, UserId,
};

use super::{PickStore, RepositoryError};

#[derive(Default)]
struct PickTable {
    // Creation order; a re-selection updates its row in place.
    rows: Vec<Pick>,
    by_user: HashMap<UserId, usize>,
    by_driver: HashMap<String, UserId>,
}

/// Process-local store. The write lock covers both the driver check and the
/// write, so concurrent saves are applied one at a time.
#[derive(Default)]
pub struct InMemoryPickStore {
    table: RwLock<PickTable>,
}

impl InMemoryPickStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PickStore for InMemoryPickStore {
    async fn save(&self, selection: PickSelection) -> Result<SaveOutcome, RepositoryError> {
        let mut table = self.table.write().await;

        if let Some(owner) = table.by_driver.get(&selection.driver) {
            if owner != &selection.user_id {
                info!(
                    event_name = "pick.save.driver_taken",
                    user_id = %selection.user_id,
                    driver = %selection.driver,
                    "driver already claimed by another user"
                );
                return Ok(SaveOutcome::Rejected(PickRejection::DriverTaken {
                    driver: selection.driver,
                }));
            }
        }

        let now = Utc::now();
        let pick = match table.by_user.get(&selection.user_id).copied() {
            Some(index) => {
                let previous_driver = table.rows[index].driver.clone();
                table.by_driver.remove(&previous_driver);

                let row = &mut table.rows[index];
                row.team = selection.team;
                row.driver = selection.driver;
                if selection.ea_username.is_some() {
                    row.ea_username = selection.ea_username;
                }
                row.updated_at = now;
                row.clone()
            }
            None => {
                let pick = Pick {
                    user_id: selection.user_id,
                    team: selection.team,
                    driver: selection.driver,
                    ea_username: selection.ea_username,
                    created_at: now,
                    updated_at: now,
                };
                let index = table.rows.len();
                table.by_user.insert(pick.user_id.clone(), index);
                table.rows.push(pick.clone());
                pick
            }
        };
        table.by_driver.insert(pick.driver.clone(), pick.user_id.clone());

        info!(
            event_name = "pick.save.accepted",
            user_id = %pick.user_id,
            team = %pick.team,
            driver = %pick.driver,
            "pick stored"
        );
        Ok(SaveOutcome::Accepted(pick))
    }

    async fn get_user_pick(&self, user_id: &UserId) -> Result<Option<Pick>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.by_user.get(user_id).map(|index| table.rows[*index].clone()))
    }

    async fn get_all_picks(&self) -> Result<Vec<Pick>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.clone())
    }

    async fn get_selected_drivers(&self) -> Result<HashSet<String>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.by_driver.keys().cloned().collect())
    }

    async fn stats(&self) -> Result<PickStats, RepositoryError> {
        let table = self.table.read().await;
        let unique_teams: HashSet<&str> =
            table.rows.iter().map(|pick| pick.team.as_str()).collect();

        Ok(PickStats {
            total_picks: table.rows.len() as u64,
            unique_teams: unique_teams.len() as u64,
            unique_drivers: table.by_driver.len() as u64,
        })
    }

    async fn clear(&self) -> Result<u64, RepositoryError> {
        let mut table = self.table.write().await;
        let removed = table.rows.len() as u64;
        *table = PickTable::default();

        info!(event_name = "pick.store.cleared", removed, "all picks removed");
        Ok(removed)
    }
}
