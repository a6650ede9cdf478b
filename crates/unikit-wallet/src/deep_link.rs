//! Hardcoded backends reachable only through a deep link.
//!
//! These wallets are listed even when nothing is installed, so users on a
//! mobile platform can jump into the wallet app. The session is established
//! out of band, once the wallet app reopens the host page.

use crate::adapter::{lock, AdapterEvent, AdapterEvents, AdapterHandle, BackendAdapter};
use crate::error::WalletError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use unikit_types::{default_sign_modes, BackendDescriptor, BackendId, Readiness};

/// Host configuration entry for a deep-link backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardcodedBackend {
    pub id: BackendId,
    pub name: String,
    pub url: String,
    pub icon: String,
    #[serde(default)]
    pub deep_link: Option<String>,
}

/// Opens URLs on the host platform.
pub trait Launcher: Send + Sync {
    /// Whether the platform can redirect into a native wallet app.
    fn is_redirectable(&self) -> bool;

    fn open_url(&self, url: &str) -> Result<(), WalletError>;
}

/// Launcher for hosts that cannot redirect. Every deep-link backend reports
/// NotDetected with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLauncher;

impl Launcher for NoopLauncher {
    fn is_redirectable(&self) -> bool {
        false
    }

    fn open_url(&self, url: &str) -> Result<(), WalletError> {
        Err(WalletError::Other(format!("cannot open {} on this platform", url)))
    }
}

pub struct DeepLinkAdapter {
    backend: HardcodedBackend,
    launcher: Arc<dyn Launcher>,
    readiness: Readiness,
    address: Mutex<Option<String>>,
    events: AdapterEvents,
}

impl DeepLinkAdapter {
    pub fn new(backend: HardcodedBackend, launcher: Arc<dyn Launcher>) -> Self {
        let readiness = if backend.deep_link.is_some() && launcher.is_redirectable() {
            Readiness::Loadable
        } else {
            Readiness::NotDetected
        };
        Self {
            backend,
            launcher,
            readiness,
            address: Mutex::new(None),
            events: AdapterEvents::new(),
        }
    }

    pub fn backend(&self) -> &HardcodedBackend {
        &self.backend
    }

    /// The wallet app came back with a session.
    pub fn session_established(&self, address: &str) {
        *lock(&self.address) = Some(address.to_string());
        self.events.emit(AdapterEvent::Connect(address.to_string()));
    }
}

/// One adapter per configured hardcoded backend, sharing `launcher`.
pub fn adapters_for(
    backends: &[HardcodedBackend],
    launcher: Arc<dyn Launcher>,
) -> Vec<AdapterHandle> {
    backends
        .iter()
        .map(|b| Arc::new(DeepLinkAdapter::new(b.clone(), launcher.clone())) as AdapterHandle)
        .collect()
}

#[async_trait]
impl BackendAdapter for DeepLinkAdapter {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            id: self.backend.id.clone(),
            display_name: self.backend.name.clone(),
            icon: self.backend.icon.clone(),
            url: self.backend.url.clone(),
            readiness: self.readiness,
            supported_sign_modes: default_sign_modes(),
        }
    }

    fn public_address(&self) -> Option<String> {
        lock(&self.address).clone()
    }

    fn is_connecting(&self) -> bool {
        false
    }

    async fn connect(&self) -> Result<(), WalletError> {
        match (&self.backend.deep_link, self.readiness) {
            (Some(link), Readiness::Loadable) => {
                log::info!("launching {} via {}", self.backend.id, link);
                self.launcher.open_url(link)
            }
            _ => Err(WalletError::NotDetected(self.backend.id.clone())),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        opened: Mutex<Vec<String>>,
    }

    impl Launcher for Recorder {
        fn is_redirectable(&self) -> bool {
            true
        }
        fn open_url(&self, url: &str) -> Result<(), WalletError> {
            lock(&self.opened).push(url.to_string());
            Ok(())
        }
    }

    fn phantom(deep_link: Option<&str>) -> HardcodedBackend {
        HardcodedBackend {
            id: "Phantom".into(),
            name: "Phantom".into(),
            url: "https://phantom.app".into(),
            icon: "https://phantom.app/icon.png".into(),
            deep_link: deep_link.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_loadable_with_link_launches() {
        let launcher = Arc::new(Recorder::default());
        let a = DeepLinkAdapter::new(
            phantom(Some("https://phantom.app/ul/browse/https%3A%2F%2Fjup.ag")),
            launcher.clone(),
        );
        assert_eq!(a.readiness(), Readiness::Loadable);
        a.connect().await.unwrap();
        assert_eq!(lock(&launcher.opened).len(), 1);
        // Session arrives out of band.
        assert!(a.public_address().is_none());

        let mut events = a.subscribe();
        a.session_established("PhantomAddr");
        assert!(a.is_connected());
        assert_eq!(events.recv().await.unwrap(), AdapterEvent::Connect("PhantomAddr".into()));
        a.disconnect().await.unwrap();
        assert!(a.public_address().is_none());
    }

    #[tokio::test]
    async fn test_without_link_not_detected() {
        let a = DeepLinkAdapter::new(phantom(None), Arc::new(Recorder::default()));
        assert_eq!(a.readiness(), Readiness::NotDetected);
        assert!(matches!(a.connect().await, Err(WalletError::NotDetected(_))));
    }

    #[tokio::test]
    async fn test_non_redirectable_platform() {
        let a = DeepLinkAdapter::new(phantom(Some("phantom://browse")), Arc::new(NoopLauncher));
        assert_eq!(a.readiness(), Readiness::NotDetected);
        assert!(matches!(a.connect().await, Err(WalletError::NotDetected(_))));
    }

    #[test]
    fn test_adapters_for() {
        let adapters = adapters_for(
            &[phantom(Some("phantom://browse")), phantom(None)],
            Arc::new(Recorder::default()),
        );
        assert_eq!(adapters.len(), 2);
        assert_eq!(adapters[0].readiness(), Readiness::Loadable);
        assert_eq!(adapters[1].readiness(), Readiness::NotDetected);
    }

    #[test]
    fn test_config_shape() {
        let json = r#"{"id":"Solflare","name":"Solflare","url":"https://solflare.com","icon":"i","deepLink":"solflare://ul/v1/browse"}"#;
        let b: HardcodedBackend = serde_json::from_str(json).unwrap();
        assert_eq!(b.deep_link.as_deref(), Some("solflare://ul/v1/browse"));
    }
}
