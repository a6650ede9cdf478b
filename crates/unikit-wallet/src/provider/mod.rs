//! Interchangeable sources of wallet backends.
//!
//! A provider owns a set of adapters, tracks which one is selected and
//! publishes the selected adapter's session through a `watch` channel. The
//! engine only talks to `WalletProvider`, so a local adapter registry and a
//! relay session can be swapped at runtime.

pub mod local;
pub mod relay;

pub use local::{AdapterFactory, LocalRegistryProvider};
pub use relay::RelayProvider;

use crate::adapter::{lock, AdapterHandle, BackendAdapter, SessionState};
use crate::error::WalletError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use unikit_types::{BackendDescriptor, BackendId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderKind {
    LocalRegistry,
    Relay,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalRegistry => write!(f, "local registry"),
            Self::Relay => write!(f, "relay"),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn list_backends(&self) -> Vec<BackendDescriptor>;

    fn adapter(&self, id: &BackendId) -> Option<AdapterHandle>;

    /// Make `id` the connect target.
    async fn select(&self, id: &BackendId) -> Result<(), WalletError>;

    fn selected(&self) -> Option<BackendId>;

    /// Connect the selected adapter.
    async fn connect(&self) -> Result<(), WalletError>;

    /// Release the selected adapter's session.
    async fn disconnect(&self) -> Result<(), WalletError>;

    fn current_session(&self) -> SessionState;

    /// Changes of the selected adapter's session.
    fn session(&self) -> watch::Receiver<SessionState>;
}

// =============================================================================
// Session publishing
// =============================================================================

/// Mirrors one adapter's session into a `watch` channel. A background task
/// forwards the adapter's events; it is aborted on `follow`, `clear` and drop.
pub(crate) struct SessionPublisher {
    tx: watch::Sender<SessionState>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl SessionPublisher {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self {
            tx,
            forwarder: Mutex::new(None),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Publish the current session of `adapter`.
    pub(crate) fn refresh(&self, adapter: &AdapterHandle) {
        publish(&self.tx, SessionState::of(adapter.as_ref()));
    }

    /// Start forwarding `adapter`'s events. Must run inside a tokio runtime.
    pub(crate) fn follow(&self, adapter: AdapterHandle) {
        let mut events = adapter.subscribe();
        self.refresh(&adapter);

        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        log::debug!("{} session event: {:?}", adapter.id(), event);
                        publish(&tx, SessionState::of(adapter.as_ref()));
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        log::debug!("session forwarder lagged by {} events", n);
                        publish(&tx, SessionState::of(adapter.as_ref()));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(old) = lock(&self.forwarder).replace(task) {
            old.abort();
        }
    }

    pub(crate) fn clear(&self) {
        if let Some(old) = lock(&self.forwarder).take() {
            old.abort();
        }
        publish(&self.tx, SessionState::default());
    }
}

impl Drop for SessionPublisher {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.forwarder).take() {
            task.abort();
        }
    }
}

fn publish(tx: &watch::Sender<SessionState>, state: SessionState) {
    tx.send_if_modified(|current| {
        if *current == state {
            return false;
        }
        *current = state;
        true
    });
}
