//! Provider over a local registry of independent adapters.

use super::{ProviderKind, SessionPublisher, WalletProvider};
use crate::adapter::{lock, AdapterHandle, BackendAdapter, SessionState};
use crate::error::WalletError;
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::watch;
use unikit_types::{BackendDescriptor, BackendId, Readiness};

/// Fallible adapter constructor. Failures are dropped from the registry.
pub type AdapterFactory = Box<dyn FnOnce() -> Result<AdapterHandle, WalletError> + Send>;

pub struct LocalRegistryProvider {
    adapters: Vec<AdapterHandle>,
    auto_connect: bool,
    selected: Mutex<Option<AdapterHandle>>,
    publisher: SessionPublisher,
}

impl LocalRegistryProvider {
    /// With `auto_connect`, selecting a ready adapter also connects it.
    pub fn new(adapters: Vec<AdapterHandle>, auto_connect: bool) -> Self {
        Self {
            adapters,
            auto_connect,
            selected: Mutex::new(None),
            publisher: SessionPublisher::new(),
        }
    }

    pub fn from_factories(factories: Vec<AdapterFactory>, auto_connect: bool) -> Self {
        let mut adapters = Vec::with_capacity(factories.len());
        for (i, factory) in factories.into_iter().enumerate() {
            match factory() {
                Ok(adapter) => adapters.push(adapter),
                Err(e) => log::warn!("dropping backend #{}: {}", i, e),
            }
        }
        Self::new(adapters, auto_connect)
    }

    pub fn adapters(&self) -> &[AdapterHandle] {
        &self.adapters
    }

    fn selected_adapter(&self) -> Result<AdapterHandle, WalletError> {
        lock(&self.selected)
            .clone()
            .ok_or_else(|| WalletError::Other("no backend selected".into()))
    }
}

#[async_trait]
impl WalletProvider for LocalRegistryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalRegistry
    }

    fn list_backends(&self) -> Vec<BackendDescriptor> {
        self.adapters.iter().map(|a| a.descriptor()).collect()
    }

    fn adapter(&self, id: &BackendId) -> Option<AdapterHandle> {
        self.adapters.iter().find(|a| &a.id() == id).cloned()
    }

    async fn select(&self, id: &BackendId) -> Result<(), WalletError> {
        let adapter = self
            .adapter(id)
            .ok_or_else(|| WalletError::UnknownBackend(id.clone()))?;

        let changed = {
            let mut selected = lock(&self.selected);
            let changed = selected.as_ref().map(|a| a.id()) != Some(id.clone());
            *selected = Some(adapter.clone());
            changed
        };
        if changed {
            log::debug!("selected {}", id);
            self.publisher.follow(adapter.clone());
        }

        if self.auto_connect && adapter.readiness() != Readiness::NotDetected {
            self.connect().await?;
        }
        Ok(())
    }

    fn selected(&self) -> Option<BackendId> {
        lock(&self.selected).as_ref().map(|a| a.id())
    }

    async fn connect(&self) -> Result<(), WalletError> {
        let adapter = self.selected_adapter()?;
        let result = adapter.connect().await;
        self.publisher.refresh(&adapter);
        result
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let adapter = self.selected_adapter()?;
        let result = adapter.disconnect().await;
        self.publisher.refresh(&adapter);
        result
    }

    fn current_session(&self) -> SessionState {
        match lock(&self.selected).as_ref() {
            Some(adapter) => SessionState::of(adapter.as_ref()),
            None => SessionState::default(),
        }
    }

    fn session(&self) -> watch::Receiver<SessionState> {
        self.publisher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterEvent, AdapterEvents};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    struct Mock {
        id: &'static str,
        readiness: Readiness,
        address: Mutex<Option<String>>,
        connects: AtomicUsize,
        events: AdapterEvents,
    }

    impl Mock {
        fn new(id: &'static str, readiness: Readiness) -> Arc<Self> {
            Arc::new(Self {
                id,
                readiness,
                address: Mutex::new(None),
                connects: AtomicUsize::new(0),
                events: AdapterEvents::new(),
            })
        }
    }

    #[async_trait]
    impl BackendAdapter for Mock {
        fn descriptor(&self) -> BackendDescriptor {
            BackendDescriptor::new(self.id, "icon", "https://example.com", self.readiness)
        }
        fn public_address(&self) -> Option<String> {
            lock(&self.address).clone()
        }
        fn is_connecting(&self) -> bool {
            false
        }
        async fn connect(&self) -> Result<(), WalletError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let addr = format!("{}-addr", self.id);
            *lock(&self.address) = Some(addr.clone());
            self.events.emit(AdapterEvent::Connect(addr));
            Ok(())
        }
        async fn disconnect(&self) -> Result<(), WalletError> {
            *lock(&self.address) = None;
            self.events.emit(AdapterEvent::Disconnect);
            Ok(())
        }
        fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
            self.events.subscribe()
        }
    }

    #[test]
    fn test_from_factories_drops_failures() {
        let factories: Vec<AdapterFactory> = vec![
            Box::new(|| Ok(Mock::new("A", Readiness::Installed) as AdapterHandle)),
            Box::new(|| -> Result<AdapterHandle, WalletError> {
                Err(WalletError::Other("extension crashed".into()))
            }),
            Box::new(|| Ok(Mock::new("B", Readiness::Loadable) as AdapterHandle)),
        ];
        let provider = LocalRegistryProvider::from_factories(factories, false);
        let ids: Vec<BackendId> = provider.list_backends().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![BackendId::from("A"), BackendId::from("B")]);
    }

    #[tokio::test]
    async fn test_select_without_auto_connect() {
        let a = Mock::new("A", Readiness::Installed);
        let b = Mock::new("B", Readiness::Installed);
        let provider = LocalRegistryProvider::new(
            vec![a.clone() as AdapterHandle, b.clone() as AdapterHandle],
            false,
        );

        provider.select(&BackendId::from("A")).await.unwrap();
        assert_eq!(provider.selected(), Some(BackendId::from("A")));
        assert_eq!(a.connects.load(Ordering::SeqCst), 0);

        provider.connect().await.unwrap();
        assert_eq!(a.connects.load(Ordering::SeqCst), 1);
        assert_eq!(b.connects.load(Ordering::SeqCst), 0);
        assert!(provider.current_session().is_active());
        assert!(provider.session().borrow().is_active());

        assert!(matches!(
            provider.select(&BackendId::from("Z")).await,
            Err(WalletError::UnknownBackend(_))
        ));
    }

    #[tokio::test]
    async fn test_select_with_auto_connect() {
        let a = Mock::new("A", Readiness::Installed);
        let ghost = Mock::new("Ghost", Readiness::NotDetected);
        let provider = LocalRegistryProvider::new(
            vec![a.clone() as AdapterHandle, ghost.clone() as AdapterHandle],
            true,
        );

        provider.select(&BackendId::from("A")).await.unwrap();
        assert_eq!(a.connects.load(Ordering::SeqCst), 1);

        provider.select(&BackendId::from("Ghost")).await.unwrap();
        assert_eq!(ghost.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_follows_external_disconnect() {
        let a = Mock::new("A", Readiness::Installed);
        let provider = LocalRegistryProvider::new(vec![a.clone() as AdapterHandle], false);
        provider.select(&BackendId::from("A")).await.unwrap();
        provider.connect().await.unwrap();

        let mut rx = provider.session();
        assert!(rx.borrow_and_update().is_active());

        // The wallet drops the session on its own.
        a.disconnect().await.unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow().is_active());
        assert!(!provider.current_session().is_active());
    }

    #[tokio::test]
    async fn test_connect_requires_selection() {
        let provider = LocalRegistryProvider::new(vec![], false);
        assert!(provider.connect().await.is_err());
        assert_eq!(provider.current_session(), SessionState::default());
    }
}
