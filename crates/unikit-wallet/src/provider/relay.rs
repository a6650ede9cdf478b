//! Provider whose only backend is a relay session.

use super::{ProviderKind, SessionPublisher, WalletProvider};
use crate::adapter::{lock, AdapterHandle, BackendAdapter, SessionState};
use crate::error::WalletError;
use crate::relay::RelayAdapter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use unikit_types::{BackendDescriptor, BackendId, Readiness};

pub struct RelayProvider {
    adapter: AdapterHandle,
    relay: Option<Arc<RelayAdapter>>,
    selected: AtomicBool,
    publisher: SessionPublisher,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl RelayProvider {
    /// Provider over any relay-backed adapter, e.g. a branded proxy.
    pub fn new(adapter: AdapterHandle) -> Self {
        Self {
            adapter,
            relay: None,
            selected: AtomicBool::new(false),
            publisher: SessionPublisher::new(),
            watcher: Mutex::new(None),
        }
    }

    /// Provider over a relay adapter. Once connected, the relay session is
    /// polled so wallet-side drops reach the session observable.
    pub fn hosted(relay: Arc<RelayAdapter>) -> Self {
        Self::branded(relay.clone(), relay)
    }

    /// Provider over `entry`, an adapter backed by `relay` such as one built
    /// with [`RelayAdapter::branded_entry`]. The relay session is polled
    /// while connected, same as [`RelayProvider::hosted`].
    pub fn branded(relay: Arc<RelayAdapter>, entry: AdapterHandle) -> Self {
        let mut provider = Self::new(entry);
        provider.relay = Some(relay);
        provider
    }

    pub fn relay_adapter(&self) -> &AdapterHandle {
        &self.adapter
    }

    fn start_watch(&self) {
        if let Some(relay) = &self.relay {
            let mut watcher = lock(&self.watcher);
            if watcher.is_none() {
                *watcher = Some(relay.watch());
            }
        }
    }

    fn stop_watch(&self) {
        if let Some(task) = lock(&self.watcher).take() {
            task.abort();
        }
    }
}

impl Drop for RelayProvider {
    fn drop(&mut self) {
        self.stop_watch();
    }
}

#[async_trait]
impl WalletProvider for RelayProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Relay
    }

    fn list_backends(&self) -> Vec<BackendDescriptor> {
        let d = self.adapter.descriptor();
        if d.readiness == Readiness::Unsupported {
            return Vec::new();
        }
        vec![d]
    }

    fn adapter(&self, id: &BackendId) -> Option<AdapterHandle> {
        if &self.adapter.id() == id {
            Some(self.adapter.clone())
        } else {
            None
        }
    }

    async fn select(&self, id: &BackendId) -> Result<(), WalletError> {
        if &self.adapter.id() != id {
            return Err(WalletError::UnknownBackend(id.clone()));
        }
        if !self.selected.swap(true, Ordering::SeqCst) {
            self.publisher.follow(self.adapter.clone());
        }
        Ok(())
    }

    fn selected(&self) -> Option<BackendId> {
        if self.selected.load(Ordering::SeqCst) {
            Some(self.adapter.id())
        } else {
            None
        }
    }

    async fn connect(&self) -> Result<(), WalletError> {
        if !self.selected.load(Ordering::SeqCst) {
            return Err(WalletError::Other("no backend selected".into()));
        }
        let result = self.adapter.connect().await;
        self.publisher.refresh(&self.adapter);
        if result.is_ok() {
            self.start_watch();
        }
        result
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.stop_watch();
        let result = self.adapter.disconnect().await;
        self.publisher.refresh(&self.adapter);
        result
    }

    fn current_session(&self) -> SessionState {
        if self.selected.load(Ordering::SeqCst) {
            SessionState::of(self.adapter.as_ref())
        } else {
            SessionState::default()
        }
    }

    fn session(&self) -> watch::Receiver<SessionState> {
        self.publisher.subscribe()
    }
}
