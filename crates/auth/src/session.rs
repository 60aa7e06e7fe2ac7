//! Current-identity session tracking

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::Identity;

/// Tracks the identity currently signed in to this process.
///
/// At most one identity is active at a time; signing in replaces whoever was
/// signed in before. Observers call [`IdentitySession::watch`] to react to
/// sign-in and sign-out, the synchronization core uses this to re-scope its
/// live subscription on every change.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl IdentitySession {
    /// Creates a session with nobody signed in.
    pub fn new() -> Self {
        Self {
            current: Arc::new(watch::channel(None).0),
        }
    }

    /// Signs an identity in, replacing any previous one.
    pub fn sign_in(&self, identity: Identity) {
        info!(
            user_id = %identity.id,
            name = %identity.display_name(),
            "Identity signed in"
        );
        self.current.send_replace(Some(identity));
    }

    /// Signs the current identity out.
    pub fn sign_out(&self) {
        let previous = self.current.borrow().clone();
        if let Some(identity) = previous {
            info!(user_id = %identity.id, "Identity signed out");
        }
        self.current.send_replace(None);
    }

    /// Returns the currently signed-in identity, if any.
    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Returns a receiver that observes identity changes.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

impl Default for IdentitySession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let session = IdentitySession::new();
        assert!(session.current().is_none());

        session.sign_in(Identity::new("user-1").with_name("Ada"));
        assert_eq!(session.current().unwrap().id, "user-1");

        session.sign_out();
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_watchers_observe_changes() {
        let session = IdentitySession::new();
        let mut rx = session.watch();

        session.sign_in(Identity::new("user-1"));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|i| i.id.clone()),
            Some("user-1".to_string())
        );

        session.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_replaces_previous_identity() {
        let session = IdentitySession::new();

        session.sign_in(Identity::new("user-a"));
        session.sign_in(Identity::new("user-b"));

        assert_eq!(session.current().unwrap().id, "user-b");
    }
}
