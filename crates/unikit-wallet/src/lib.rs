//! Wallet connection engine.
//!
//! Ranks the available wallet backends for display, drives the
//! connect/disconnect lifecycle with host notifications, and lets a local
//! adapter registry or a relay session act as interchangeable providers.
//! Backends can be re-presented under another name through proxies.

pub mod adapter;
pub mod config;
pub mod deep_link;
pub mod engine;
pub mod error;
pub mod notification;
pub mod provider;
pub mod proxy;
pub mod ranking;
pub mod recency;
pub mod relay;
pub mod store;

pub use adapter::{AdapterEvent, AdapterEvents, AdapterHandle, BackendAdapter, SessionState};
pub use config::{EngineConfig, RelaySettings};
pub use deep_link::{adapters_for, DeepLinkAdapter, HardcodedBackend, Launcher, NoopLauncher};
pub use engine::{ConnectionEngine, ConnectionState, ConnectionStatus, OnboardingSuggestions};
pub use error::WalletError;
pub use notification::{
    BackendMetadata, ChannelNotifier, NoopNotifier, NotificationCallback, NotificationEvent,
    WalletNotification,
};
pub use provider::{AdapterFactory, LocalRegistryProvider, ProviderKind, RelayProvider, WalletProvider};
pub use proxy::{proxy, ConnectHook, ProxyAdapter, ProxyBuilder, ProxyOverrides};
pub use ranking::{rank, GroupingReason, RankedList};
pub use recency::{Migration, RecencyStore};
pub use relay::{HostedPairing, RelayAdapter, RelayStatus, RelayTransport};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
