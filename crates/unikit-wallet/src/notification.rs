//! Host-facing connection notifications.

use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use unikit_types::constants::SHORT_ADDRESS_CHARS;
use unikit_types::{shorten_address, BackendDescriptor, SignMode};

/// Presentation data of the backend a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendMetadata {
    pub name: String,
    pub url: String,
    pub icon: String,
    pub supported_sign_modes: BTreeSet<SignMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletNotification {
    /// Empty while connecting and for failed connects.
    pub public_address: String,
    pub short_address: String,
    pub backend_name: String,
    pub metadata: BackendMetadata,
}

impl WalletNotification {
    pub fn new(descriptor: &BackendDescriptor, public_address: Option<&str>) -> Self {
        let public_address = public_address.unwrap_or_default().to_string();
        Self {
            short_address: shorten_address(&public_address, SHORT_ADDRESS_CHARS),
            public_address,
            backend_name: descriptor.display_name.clone(),
            metadata: BackendMetadata {
                name: descriptor.display_name.clone(),
                url: descriptor.url.clone(),
                icon: descriptor.icon.clone(),
                supported_sign_modes: descriptor.supported_sign_modes.clone(),
            },
        }
    }
}

/// Host callbacks. Every method defaults to a no-op.
pub trait NotificationCallback: Send + Sync {
    fn on_connect(&self, _n: &WalletNotification) {}
    fn on_connecting(&self, _n: &WalletNotification) {}
    fn on_disconnect(&self, _n: &WalletNotification) {}
    /// Connect failed; `metadata.url` points at the backend's homepage.
    fn on_not_installed(&self, _n: &WalletNotification) {}
}

/// Callback that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationCallback for NoopNotifier {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "notification", rename_all = "camelCase")]
pub enum NotificationEvent {
    Connect(WalletNotification),
    Connecting(WalletNotification),
    Disconnect(WalletNotification),
    NotInstalled(WalletNotification),
}

impl NotificationEvent {
    pub fn notification(&self) -> &WalletNotification {
        match self {
            Self::Connect(n) | Self::Connecting(n) | Self::Disconnect(n) | Self::NotInstalled(n) => n,
        }
    }
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: NotificationEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("notification receiver dropped");
        }
    }
}

impl NotificationCallback for ChannelNotifier {
    fn on_connect(&self, n: &WalletNotification) {
        self.send(NotificationEvent::Connect(n.clone()));
    }

    fn on_connecting(&self, n: &WalletNotification) {
        self.send(NotificationEvent::Connecting(n.clone()));
    }

    fn on_disconnect(&self, n: &WalletNotification) {
        self.send(NotificationEvent::Disconnect(n.clone()));
    }

    fn on_not_installed(&self, n: &WalletNotification) {
        self.send(NotificationEvent::NotInstalled(n.clone()));
    }
}
