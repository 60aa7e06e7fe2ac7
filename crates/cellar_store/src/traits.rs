//! Cellar store trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{NewWine, WinePatch, WineRecord};
use tokio::sync::broadcast;

use crate::{CellarSnapshot, StoreResult};

/// Trait for wine record storage.
///
/// Records are scoped to an owning identity. After every successful mutation
/// the store publishes a full, freshly ordered snapshot of the affected
/// owner's collection on the channel returned by [`CellarStore::subscribe`].
/// A subscriber that lags may miss intermediate snapshots; the latest one it
/// receives always reflects the current state.
#[async_trait]
pub trait CellarStore: Send + Sync {
    /// Creates a new wine record. The store assigns the id.
    async fn create_wine(
        &self,
        owner_id: &str,
        created_at: DateTime<Utc>,
        wine: NewWine,
    ) -> StoreResult<WineRecord>;

    /// Gets a wine record by id.
    async fn get_wine(&self, id: &str) -> StoreResult<Option<WineRecord>>;

    /// Lists an owner's wine records, newest first.
    async fn list_wines(&self, owner_id: &str) -> StoreResult<Vec<WineRecord>>;

    /// Applies a partial update to a wine record. Fields absent from the
    /// patch are untouched; an unknown id is an error.
    async fn patch_wine(&self, id: &str, patch: &WinePatch) -> StoreResult<()>;

    /// Deletes a wine record. Deleting an id that does not exist succeeds.
    async fn delete_wine(&self, id: &str) -> StoreResult<()>;

    /// Subscribes to snapshot updates for an owner's collection.
    fn subscribe(&self, owner_id: &str) -> broadcast::Receiver<CellarSnapshot>;
}
