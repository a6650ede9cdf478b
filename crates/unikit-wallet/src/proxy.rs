//! Re-present one backend as a different named entry.
//!
//! A proxy overrides presentation fields (id, name, icon, url) and optionally
//! the connect routine. Everything else, including `disconnect` and the event
//! stream, goes straight to the base adapter so consumers of the proxy see the
//! base's session changes.

use crate::adapter::{AdapterEvent, AdapterHandle, BackendAdapter};
use crate::error::WalletError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::broadcast;
use unikit_types::{BackendDescriptor, BackendId};

/// Replacement connect routine. Receives the base adapter.
pub type ConnectHook =
    Arc<dyn Fn(AdapterHandle) -> BoxFuture<'static, Result<(), WalletError>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ProxyOverrides {
    pub id: Option<BackendId>,
    pub display_name: Option<String>,
    pub icon: Option<String>,
    pub url: Option<String>,
    pub connect: Option<ConnectHook>,
}

impl std::fmt::Debug for ProxyOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyOverrides")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("icon", &self.icon)
            .field("url", &self.url)
            .field("connect", &self.connect.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

pub struct ProxyAdapter {
    base: AdapterHandle,
    overrides: ProxyOverrides,
}

impl ProxyAdapter {
    pub fn new(base: AdapterHandle, overrides: ProxyOverrides) -> Self {
        Self { base, overrides }
    }

    pub fn builder(base: AdapterHandle) -> ProxyBuilder {
        ProxyBuilder {
            base,
            overrides: ProxyOverrides::default(),
        }
    }

    pub fn base(&self) -> &AdapterHandle {
        &self.base
    }
}

/// Wrap `base` with `overrides`.
pub fn proxy(base: AdapterHandle, overrides: ProxyOverrides) -> AdapterHandle {
    Arc::new(ProxyAdapter::new(base, overrides))
}

#[async_trait]
impl BackendAdapter for ProxyAdapter {
    fn descriptor(&self) -> BackendDescriptor {
        let mut d = self.base.descriptor();
        if let Some(name) = &self.overrides.display_name {
            d.display_name = name.clone();
            d.id = BackendId::from(name.as_str());
        }
        if let Some(id) = &self.overrides.id {
            d.id = id.clone();
        }
        if let Some(icon) = &self.overrides.icon {
            d.icon = icon.clone();
        }
        if let Some(url) = &self.overrides.url {
            d.url = url.clone();
        }
        d
    }

    fn public_address(&self) -> Option<String> {
        self.base.public_address()
    }

    fn is_connecting(&self) -> bool {
        self.base.is_connecting()
    }

    fn is_connected(&self) -> bool {
        self.base.is_connected()
    }

    async fn connect(&self) -> Result<(), WalletError> {
        match &self.overrides.connect {
            Some(hook) => hook(self.base.clone()).await,
            None => self.base.connect().await,
        }
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.base.disconnect().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.base.subscribe()
    }
}

/// Builder for `ProxyAdapter`.
pub struct ProxyBuilder {
    base: AdapterHandle,
    overrides: ProxyOverrides,
}

impl ProxyBuilder {
    pub fn id(mut self, id: impl Into<BackendId>) -> Self {
        self.overrides.id = Some(id.into());
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.overrides.display_name = Some(name.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.overrides.icon = Some(icon.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.overrides.url = Some(url.into());
        self
    }

    pub fn connect<F>(mut self, hook: F) -> Self
    where
        F: Fn(AdapterHandle) -> BoxFuture<'static, Result<(), WalletError>> + Send + Sync + 'static,
    {
        self.overrides.connect = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> ProxyAdapter {
        ProxyAdapter::new(self.base, self.overrides)
    }

    pub fn handle(self) -> AdapterHandle {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{lock, AdapterEvents};
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use unikit_types::Readiness;

    struct Base {
        address: Mutex<Option<String>>,
        connects: AtomicUsize,
        events: AdapterEvents,
    }

    impl Base {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                address: Mutex::new(None),
                connects: AtomicUsize::new(0),
                events: AdapterEvents::new(),
            })
        }
    }

    #[async_trait]
    impl BackendAdapter for Base {
        fn descriptor(&self) -> BackendDescriptor {
            BackendDescriptor::new("Relay", "relay-icon", "https://reown.com", Readiness::Loadable)
        }
        fn public_address(&self) -> Option<String> {
            lock(&self.address).clone()
        }
        fn is_connecting(&self) -> bool {
            false
        }
        async fn connect(&self) -> Result<(), WalletError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            *lock(&self.address) = Some("base-addr".into());
            self.events.emit(AdapterEvent::Connect("base-addr".into()));
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
    fn test_name_override_becomes_id() {
        let base = Base::new();
        let p = ProxyAdapter::builder(base).display_name("Jupiter Mobile").icon("jup").build();
        let d = p.descriptor();
        assert_eq!(d.id, "Jupiter Mobile");
        assert_eq!(d.display_name, "Jupiter Mobile");
        assert_eq!(d.icon, "jup");
        assert_eq!(d.url, "https://reown.com");
        assert_eq!(d.readiness, Readiness::Loadable);
    }

    #[test]
    fn test_explicit_id_wins() {
        let p = proxy(
            Base::new(),
            ProxyOverrides {
                id: Some("jup-mobile".into()),
                display_name: Some("Jupiter Mobile".into()),
                ..Default::default()
            },
        );
        assert_eq!(p.id(), "jup-mobile");
        assert_eq!(p.descriptor().display_name, "Jupiter Mobile");
    }

    #[tokio::test]
    async fn test_connect_hook_then_base_disconnect() {
        let base = Base::new();
        let hooked = Arc::new(AtomicUsize::new(0));
        let counter = hooked.clone();
        let p = ProxyAdapter::builder(base.clone())
            .display_name("Branded")
            .connect(move |inner| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    inner.connect().await
                }
                .boxed()
            })
            .handle();

        let mut events = p.subscribe();
        p.connect().await.unwrap();
        assert_eq!(hooked.load(Ordering::SeqCst), 1);
        assert_eq!(base.connects.load(Ordering::SeqCst), 1);
        assert_eq!(p.public_address().as_deref(), Some("base-addr"));
        assert!(p.is_connected());

        p.disconnect().await.unwrap();
        assert_eq!(base.public_address(), None);
        assert!(!p.is_connected());
        assert_eq!(events.recv().await.unwrap(), AdapterEvent::Connect("base-addr".into()));
        assert_eq!(events.recv().await.unwrap(), AdapterEvent::Disconnect);
    }

    #[tokio::test]
    async fn test_base_events_reach_proxy_subscribers() {
        let base = Base::new();
        let p = proxy(base.clone(), ProxyOverrides::default());
        let mut events = p.subscribe();
        base.disconnect().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), AdapterEvent::Disconnect);
    }
}
