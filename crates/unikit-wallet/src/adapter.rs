//! Backend adapter interface.
//!
//! Every concrete wallet backend (extension signer, deep-link launcher,
//! relay session, proxy) implements `BackendAdapter`. Adapters report state
//! through plain getters and push changes through a broadcast event hub.

use crate::error::WalletError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use unikit_types::{BackendDescriptor, BackendId, Readiness};

/// Capacity of each adapter's event channel.
const EVENT_CAPACITY: usize = 32;

/// Adapter lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// Session established with this public address.
    Connect(String),
    /// Session ended, locally or by the backend.
    Disconnect,
    /// Non-fatal backend error.
    Error(String),
    /// Readiness changed (e.g. an extension finished injecting).
    ReadyStateChange(Readiness),
}

/// Reactive "current session" value published by providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub public_address: Option<String>,
    pub is_connected: bool,
    pub is_connecting: bool,
}

impl SessionState {
    pub fn of(adapter: &dyn BackendAdapter) -> Self {
        let public_address = adapter.public_address();
        Self {
            is_connected: adapter.is_connected() && public_address.is_some(),
            is_connecting: adapter.is_connecting(),
            public_address,
        }
    }

    /// Connected with a known address.
    pub fn is_active(&self) -> bool {
        self.is_connected && self.public_address.is_some()
    }
}

#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn descriptor(&self) -> BackendDescriptor;

    fn id(&self) -> BackendId {
        self.descriptor().id
    }

    fn readiness(&self) -> Readiness {
        self.descriptor().readiness
    }

    fn public_address(&self) -> Option<String>;

    fn is_connecting(&self) -> bool;

    fn is_connected(&self) -> bool {
        self.public_address().is_some()
    }

    async fn connect(&self) -> Result<(), WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent>;
}

pub type AdapterHandle = Arc<dyn BackendAdapter>;

// =============================================================================
// Event hub
// =============================================================================

/// Broadcast sender shared by an adapter and its subscribers.
#[derive(Debug, Clone)]
pub struct AdapterEvents {
    tx: broadcast::Sender<AdapterEvent>,
}

impl Default for AdapterEvents {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }
}

impl AdapterEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send to current subscribers. No subscribers is not an error.
    pub fn emit(&self, event: AdapterEvent) {
        log::debug!("adapter event: {:?}", event);
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.tx.subscribe()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<String>);

    #[async_trait]
    impl BackendAdapter for Fixed {
        fn descriptor(&self) -> BackendDescriptor {
            BackendDescriptor::new("Fixed", "icon", "https://fixed.example", Readiness::Installed)
        }
        fn public_address(&self) -> Option<String> {
            self.0.clone()
        }
        fn is_connecting(&self) -> bool {
            false
        }
        async fn connect(&self) -> Result<(), WalletError> {
            Ok(())
        }
        async fn disconnect(&self) -> Result<(), WalletError> {
            Ok(())
        }
        fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
            AdapterEvents::new().subscribe()
        }
    }

    #[test]
    fn test_session_state_of() {
        let idle = SessionState::of(&Fixed(None));
        assert_eq!(idle, SessionState::default());
        assert!(!idle.is_active());

        let live = SessionState::of(&Fixed(Some("addr".into())));
        assert!(live.is_active());
        assert_eq!(live.public_address.as_deref(), Some("addr"));
    }

    #[test]
    fn test_default_id_and_readiness() {
        let a = Fixed(None);
        assert_eq!(a.id(), "Fixed");
        assert_eq!(a.readiness(), Readiness::Installed);
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let hub = AdapterEvents::new();
        hub.emit(AdapterEvent::Disconnect);
        let mut rx = hub.subscribe();
        hub.emit(AdapterEvent::Connect("addr".into()));
        assert_eq!(rx.recv().await.unwrap(), AdapterEvent::Connect("addr".into()));
    }
}
