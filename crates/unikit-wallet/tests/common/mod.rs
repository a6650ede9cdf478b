//! Shared test doubles for the engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use unikit_types::{BackendDescriptor, Readiness};
use unikit_wallet::{
    AdapterEvent, AdapterEvents, AdapterHandle, BackendAdapter, ChannelNotifier, ConnectionEngine,
    EngineConfig, KeyValueStore, LocalRegistryProvider, MemoryStore, NotificationEvent,
    RecencyStore, StoreError, WalletError, WalletProvider,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scriptable backend: succeeds with `<id>-addr` unless built failing.
pub struct MockAdapter {
    descriptor: BackendDescriptor,
    address: Mutex<Option<String>>,
    fail: AtomicBool,
    delay: Duration,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    events: AdapterEvents,
}

impl MockAdapter {
    pub fn new(id: &str, readiness: Readiness) -> Arc<Self> {
        Self::build(id, readiness, false, Duration::ZERO)
    }

    pub fn failing(id: &str, readiness: Readiness) -> Arc<Self> {
        Self::build(id, readiness, true, Duration::ZERO)
    }

    pub fn slow(id: &str, readiness: Readiness, delay: Duration) -> Arc<Self> {
        Self::build(id, readiness, false, delay)
    }

    fn build(id: &str, readiness: Readiness, fail: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            descriptor: BackendDescriptor::new(
                id,
                "data:image/svg+xml;base64,AA==",
                &format!("https://{}.example", id.to_lowercase()),
                readiness,
            ),
            address: Mutex::new(None),
            fail: AtomicBool::new(fail),
            delay,
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            events: AdapterEvents::new(),
        })
    }

    pub fn address_for(id: &str) -> String {
        format!("{}-addr", id)
    }

    /// The wallet ends the session on its own.
    pub fn drop_session(&self) {
        *self.address.lock().unwrap() = None;
        self.events.emit(AdapterEvent::Disconnect);
    }
}

#[async_trait]
impl BackendAdapter for MockAdapter {
    fn descriptor(&self) -> BackendDescriptor {
        self.descriptor.clone()
    }

    fn public_address(&self) -> Option<String> {
        self.address.lock().unwrap().clone()
    }

    fn is_connecting(&self) -> bool {
        false
    }

    async fn connect(&self) -> Result<(), WalletError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(WalletError::Other("user rejected the request".into()));
        }
        let address = Self::address_for(self.descriptor.id.as_str());
        *self.address.lock().unwrap() = Some(address.clone());
        self.events.emit(AdapterEvent::Connect(address));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        *self.address.lock().unwrap() = None;
        self.events.emit(AdapterEvent::Disconnect);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.events.subscribe()
    }
}

/// Reads succeed, every write fails.
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<String>>, StoreError> {
        Ok(None)
    }
    fn set(&self, _key: &str, _values: &[String]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }
    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }
}

pub fn handles(adapters: &[Arc<MockAdapter>]) -> Vec<AdapterHandle> {
    adapters.iter().map(|a| a.clone() as AdapterHandle).collect()
}

pub struct Harness {
    pub engine: Arc<ConnectionEngine>,
    pub events: mpsc::UnboundedReceiver<NotificationEvent>,
}

impl Harness {
    pub fn new(adapters: &[Arc<MockAdapter>], config: EngineConfig) -> Self {
        Self::with_store(adapters, config, Box::new(MemoryStore::new()))
    }

    pub fn with_store(
        adapters: &[Arc<MockAdapter>],
        config: EngineConfig,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let provider = Arc::new(LocalRegistryProvider::new(handles(adapters), config.auto_connect));
        Self::build(provider, config, store)
    }

    pub fn with_provider(provider: Arc<dyn WalletProvider>, config: EngineConfig) -> Self {
        Self::build(provider, config, Box::new(MemoryStore::new()))
    }

    fn build(
        provider: Arc<dyn WalletProvider>,
        config: EngineConfig,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        init_logging();
        let (notifier, events) = ChannelNotifier::new();
        let engine = ConnectionEngine::new(
            config,
            provider,
            RecencyStore::open(store),
            Arc::new(notifier),
        );
        Self {
            engine: Arc::new(engine),
            events,
        }
    }

    /// Everything notified so far.
    pub fn drain(&mut self) -> Vec<NotificationEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// Event kinds only, for order assertions.
pub fn kinds(events: &[NotificationEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|e| match e {
            NotificationEvent::Connect(_) => "connect",
            NotificationEvent::Connecting(_) => "connecting",
            NotificationEvent::Disconnect(_) => "disconnect",
            NotificationEvent::NotInstalled(_) => "not-installed",
        })
        .collect()
}
