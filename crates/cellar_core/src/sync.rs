//! Live cellar synchronization.

use std::sync::{Arc, Mutex};

use auth::Identity;
use cellar_store::{CellarStore, StoreResult};
use chrono::Utc;
use entities::{NewWine, WinePatch, WineRecord};
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Live mirror of the active identity's wine collection.
///
/// `CellarSync` owns one store subscription at a time. Changing the active
/// identity tears the previous subscription down before the new one is
/// established; a snapshot that arrives from a torn-down subscription is
/// discarded, never installed. While nobody is signed in the mirror is
/// empty and mutations are ignored with a warning.
///
/// Handles are cheap to clone and share one mirror.
#[derive(Clone)]
pub struct CellarSync {
    shared: Arc<SyncShared>,
}

struct SyncShared {
    store: Arc<dyn CellarStore>,
    mirror: watch::Sender<Vec<WineRecord>>,
    state: Mutex<SyncState>,
}

#[derive(Default)]
struct SyncState {
    /// Bumped on every identity change; snapshots carry the generation they
    /// were subscribed under and are dropped on mismatch.
    generation: u64,
    session: Option<OwnerSession>,
}

struct OwnerSession {
    identity: Identity,
    pump: JoinHandle<()>,
}

impl CellarSync {
    /// Creates a synchronization core over the given store. No identity is
    /// active until [`CellarSync::set_identity`] is called.
    pub fn new(store: Arc<dyn CellarStore>) -> Self {
        Self {
            shared: Arc::new(SyncShared {
                store,
                mirror: watch::channel(Vec::new()).0,
                state: Mutex::new(SyncState::default()),
            }),
        }
    }

    /// Switches the active identity.
    ///
    /// The previous subscription is cancelled and the mirror cleared before
    /// anything else happens, so records never leak across identities. With
    /// `Some`, a new subscription is established and the mirror converges on
    /// that identity's collection; with `None` the mirror stays empty.
    pub fn set_identity(&self, identity: Option<Identity>) {
        let mut state = self.shared.state.lock().unwrap();
        state.generation += 1;
        let generation = state.generation;

        if let Some(previous) = state.session.take() {
            previous.pump.abort();
            debug!(user_id = %previous.identity.id, "Cellar subscription torn down");
        }

        self.shared.mirror.send_replace(Vec::new());

        match identity {
            Some(identity) => {
                info!(user_id = %identity.id, "Cellar subscription starting");
                let pump = tokio::spawn(run_pump(
                    self.shared.clone(),
                    identity.id.clone(),
                    generation,
                ));
                state.session = Some(OwnerSession { identity, pump });
            }
            None => debug!("No identity active, cellar mirror stays empty"),
        }
    }

    /// Drives [`CellarSync::set_identity`] from a session's identity channel.
    pub fn watch_identity(
        &self,
        mut identities: watch::Receiver<Option<Identity>>,
    ) -> JoinHandle<()> {
        let sync = self.clone();
        tokio::spawn(async move {
            loop {
                let identity = identities.borrow_and_update().clone();
                sync.set_identity(identity);
                if identities.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Returns the identity the mirror is currently scoped to.
    pub fn current_identity(&self) -> Option<Identity> {
        let state = self.shared.state.lock().unwrap();
        state.session.as_ref().map(|s| s.identity.clone())
    }

    /// Returns a receiver observing every mirror update.
    pub fn watch(&self) -> watch::Receiver<Vec<WineRecord>> {
        self.shared.mirror.subscribe()
    }

    /// Returns the current mirror contents, in store order.
    pub fn records(&self) -> Vec<WineRecord> {
        self.shared.mirror.borrow().clone()
    }

    /// Creates a wine for the active identity, stamping the owner and the
    /// creation time. Without an identity this is a warned no-op.
    pub async fn add_wine(&self, wine: NewWine) -> StoreResult<()> {
        let Some(identity) = self.current_identity() else {
            warn!("Wine create ignored: nobody is signed in");
            return Ok(());
        };
        let record = self
            .shared
            .store
            .create_wine(&identity.id, Utc::now(), wine)
            .await?;
        debug!(wine_id = %record.id, "Wine created");
        Ok(())
    }

    /// Applies a partial update to a wine. Without an identity this is a
    /// warned no-op.
    pub async fn update_wine(&self, id: &str, patch: &WinePatch) -> StoreResult<()> {
        if self.current_identity().is_none() {
            warn!(wine_id = %id, "Wine update ignored: nobody is signed in");
            return Ok(());
        }
        self.shared.store.patch_wine(id, patch).await
    }

    /// Adjusts a wine's bottle count by `delta`, clamping at zero. A wine
    /// that is no longer in the mirror is a warned no-op: it vanished
    /// between render and click.
    pub async fn adjust_quantity(&self, id: &str, delta: i64) -> StoreResult<()> {
        if self.current_identity().is_none() {
            warn!(wine_id = %id, "Quantity adjust ignored: nobody is signed in");
            return Ok(());
        }
        let quantity = self
            .records()
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.quantity);
        let Some(quantity) = quantity else {
            warn!(wine_id = %id, "Quantity adjust ignored: wine not in mirror");
            return Ok(());
        };

        let adjusted = (i64::from(quantity) + delta).clamp(0, i64::from(u32::MAX)) as u32;
        self.shared
            .store
            .patch_wine(id, &WinePatch::new().with_quantity(adjusted))
            .await
    }

    /// Deletes a wine. Deleting an id that no longer exists still succeeds.
    /// Without an identity this is a warned no-op.
    pub async fn delete_wine(&self, id: &str) -> StoreResult<()> {
        if self.current_identity().is_none() {
            warn!(wine_id = %id, "Wine delete ignored: nobody is signed in");
            return Ok(());
        }
        self.shared.store.delete_wine(id).await
    }
}

/// Feeds store snapshots into the mirror until the subscription is torn
/// down. Subscribes before the initial fetch so a mutation between the two
/// surfaces as a redundant snapshot rather than a lost one.
async fn run_pump(shared: Arc<SyncShared>, owner_id: String, generation: u64) {
    let mut updates = shared.store.subscribe(&owner_id);

    match shared.store.list_wines(&owner_id).await {
        Ok(records) => install_snapshot(&shared, generation, records),
        Err(e) => warn!(owner_id = %owner_id, error = %e, "Initial cellar fetch failed"),
    }

    loop {
        match updates.recv().await {
            Ok(snapshot) => install_snapshot(&shared, generation, snapshot.records),
            Err(RecvError::Lagged(skipped)) => {
                warn!(owner_id = %owner_id, skipped, "Cellar subscription lagged, refetching");
                match shared.store.list_wines(&owner_id).await {
                    Ok(records) => install_snapshot(&shared, generation, records),
                    Err(e) => {
                        warn!(owner_id = %owner_id, error = %e, "Refetch after lag failed")
                    }
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Installs a snapshot into the mirror unless its subscription has been
/// torn down in the meantime.
fn install_snapshot(shared: &SyncShared, generation: u64, records: Vec<WineRecord>) {
    let state = shared.state.lock().unwrap();
    if state.generation != generation {
        debug!("Discarding snapshot from a torn-down subscription");
        return;
    }
    shared.mirror.send_replace(records);
}
