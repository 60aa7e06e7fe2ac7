//! In-memory cellar store implementation.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{NewWine, WinePatch, WineRecord};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::{CellarSnapshot, CellarStore, SnapshotBroadcaster, StoreError, StoreResult};

/// In-memory cellar store. Primary backend for tests and usable for
/// ephemeral runs; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCellarStore {
    wines: Arc<RwLock<HashMap<String, WineRecord>>>,
    broadcaster: SnapshotBroadcaster,
}

impl MemoryCellarStore {
    /// Creates a new in-memory cellar store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn snapshot(&self, owner_id: &str) -> Vec<WineRecord> {
        let wines = self.wines.read().await;
        let mut records: Vec<WineRecord> = wines
            .values()
            .filter(|w| w.owner_id == owner_id)
            .cloned()
            .collect();
        // Newest first, stable tie-break on id so the order is deterministic
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    async fn publish_snapshot(&self, owner_id: &str) {
        let records = self.snapshot(owner_id).await;
        self.broadcaster.publish(owner_id, records);
    }
}

#[async_trait]
impl CellarStore for MemoryCellarStore {
    async fn create_wine(
        &self,
        owner_id: &str,
        created_at: DateTime<Utc>,
        wine: NewWine,
    ) -> StoreResult<WineRecord> {
        let record = wine.into_record(Uuid::new_v4().to_string(), owner_id, created_at);
        {
            let mut wines = self.wines.write().await;
            wines.insert(record.id.clone(), record.clone());
        }
        self.publish_snapshot(owner_id).await;
        Ok(record)
    }

    async fn get_wine(&self, id: &str) -> StoreResult<Option<WineRecord>> {
        let wines = self.wines.read().await;
        Ok(wines.get(id).cloned())
    }

    async fn list_wines(&self, owner_id: &str) -> StoreResult<Vec<WineRecord>> {
        Ok(self.snapshot(owner_id).await)
    }

    async fn patch_wine(&self, id: &str, patch: &WinePatch) -> StoreResult<()> {
        let owner_id = {
            let mut wines = self.wines.write().await;
            let record = wines
                .get_mut(id)
                .ok_or_else(|| StoreError::not_found("Wine", id))?;
            patch.apply_to(record);
            record.owner_id.clone()
        };
        self.publish_snapshot(&owner_id).await;
        Ok(())
    }

    async fn delete_wine(&self, id: &str) -> StoreResult<()> {
        let removed = {
            let mut wines = self.wines.write().await;
            wines.remove(id)
        };
        match removed {
            Some(record) => self.publish_snapshot(&record.owner_id).await,
            None => debug!(wine_id = %id, "Delete of missing wine ignored"),
        }
        Ok(())
    }

    fn subscribe(&self, owner_id: &str) -> broadcast::Receiver<CellarSnapshot> {
        self.broadcaster.subscribe(owner_id)
    }
}
