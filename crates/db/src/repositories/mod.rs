use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use scuderia_core::domain::pick::{Pick, PickSelection, PickStats, SaveOutcome, UserId};
use scuderia_core::errors::ApplicationError;

pub mod memory;
pub mod pick;

pub use memory::InMemoryPickStore;
pub use pick::SqlPickStore;

/// Storage failure. A driver already owned by someone else is not an error;
/// it comes back as [`SaveOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

/// Single source of truth for current picks and arbiter of driver uniqueness.
///
/// `save` is atomic with respect to other `save` and `clear` calls on the same
/// store. Reads never observe a half-applied write.
#[async_trait]
pub trait PickStore: Send + Sync {
    async fn save(&self, selection: PickSelection) -> Result<SaveOutcome, RepositoryError>;

    async fn get_user_pick(&self, user_id: &UserId) -> Result<Option<Pick>, RepositoryError>;

    /// All picks in the order they were first created.
    async fn get_all_picks(&self) -> Result<Vec<Pick>, RepositoryError>;

    async fn get_selected_drivers(&self) -> Result<HashSet<String>, RepositoryError>;

    async fn stats(&self) -> Result<PickStats, RepositoryError>;

    /// Removes every pick and returns how many were removed.
    async fn clear(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
impl<T> PickStore for std::sync::Arc<T>
where
    T: PickStore + ?Sized,
{
    async fn save(&self, selection: PickSelection) -> Result<SaveOutcome, RepositoryError> {
        (**self).save(selection).await
    }

    async fn get_user_pick(&self, user_id: &UserId) -> Result<Option<Pick>, RepositoryError> {
        (**self).get_user_pick(user_id).await
    }

    async fn get_all_picks(&self) -> Result<Vec<Pick>, RepositoryError> {
        (**self).get_all_picks().await
    }

    async fn get_selected_drivers(&self) -> Result<HashSet<String>, RepositoryError> {
        (**self).get_selected_drivers().await
    }

    async fn stats(&self) -> Result<PickStats, RepositoryError> {
        (**self).stats().await
    }

    async fn clear(&self) -> Result<u64, RepositoryError> {
        (**self).clear().await
    }
}
