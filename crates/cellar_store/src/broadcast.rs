//! Snapshot broadcasting for live cellar mirrors.

use std::{collections::HashMap, sync::RwLock};

use entities::WineRecord;
use tokio::sync::broadcast;

/// Capacity for snapshot broadcast channels. Laggards re-list instead of
/// replaying history, so the buffer stays small.
const CHANNEL_CAPACITY: usize = 16;

/// A full snapshot of one owner's collection, newest record first.
#[derive(Debug, Clone)]
pub struct CellarSnapshot {
    /// Identity the snapshot belongs to.
    pub owner_id: String,
    /// The owner's records in store order.
    pub records: Vec<WineRecord>,
}

/// Broadcaster for per-owner cellar snapshots.
#[derive(Debug)]
pub struct SnapshotBroadcaster {
    /// Map of owner_id to broadcast sender
    senders: RwLock<HashMap<String, broadcast::Sender<CellarSnapshot>>>,
}

impl SnapshotBroadcaster {
    /// Create a new snapshot broadcaster
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to snapshots for a specific owner
    pub fn subscribe(&self, owner_id: &str) -> broadcast::Receiver<CellarSnapshot> {
        let mut senders = self.senders.write().unwrap();

        // Get or create sender for this owner
        let sender = senders
            .entry(owner_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);

        sender.subscribe()
    }

    /// Publish a snapshot for an owner
    pub fn publish(&self, owner_id: &str, records: Vec<WineRecord>) {
        let senders = self.senders.read().unwrap();

        if let Some(sender) = senders.get(owner_id) {
            let snapshot = CellarSnapshot {
                owner_id: owner_id.to_string(),
                records,
            };

            // Ignore send errors (no subscribers)
            let _ = sender.send(snapshot);
        }
    }

    /// Get the subscriber count for an owner
    pub fn subscriber_count(&self, owner_id: &str) -> usize {
        let senders = self.senders.read().unwrap();

        senders
            .get(owner_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Cleanup channels with no subscribers
    pub fn cleanup_empty_channels(&self) {
        let mut senders = self.senders.write().unwrap();
        senders.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for SnapshotBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use entities::NewWine;

    use super::*;

    fn record(owner: &str, name: &str) -> WineRecord {
        NewWine::new(name).into_record(format!("wine-{name}"), owner, Utc::now())
    }

    #[test]
    fn test_subscribe_and_publish() {
        let broadcaster = SnapshotBroadcaster::new();

        let mut receiver = broadcaster.subscribe("user-1");

        broadcaster.publish("user-1", vec![record("user-1", "Barbera")]);

        // Use try_recv since publish happens synchronously
        let snapshot = receiver.try_recv().unwrap();
        assert_eq!(snapshot.owner_id, "user-1");
        assert_eq!(snapshot.records.len(), 1);
    }

    #[test]
    fn test_multiple_subscribers() {
        let broadcaster = SnapshotBroadcaster::new();

        let mut rx1 = broadcaster.subscribe("user-1");
        let mut rx2 = broadcaster.subscribe("user-1");

        assert_eq!(broadcaster.subscriber_count("user-1"), 2);

        broadcaster.publish("user-1", Vec::new());

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_no_cross_owner_snapshots() {
        let broadcaster = SnapshotBroadcaster::new();

        let mut rx1 = broadcaster.subscribe("user-1");
        let _rx2 = broadcaster.subscribe("user-2");

        broadcaster.publish("user-2", vec![record("user-2", "Gavi")]);

        // rx1 should not receive the snapshot
        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn test_cleanup_drops_unwatched_channels() {
        let broadcaster = SnapshotBroadcaster::new();

        let rx = broadcaster.subscribe("user-1");
        drop(rx);

        broadcaster.cleanup_empty_channels();
        assert_eq!(broadcaster.subscriber_count("user-1"), 0);
    }
}
