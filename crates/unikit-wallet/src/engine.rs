//! Connection state machine.
//!
//! `ConnectionEngine` owns the user-facing connection state
//! (`Idle → Connecting → Connected → Disconnecting → Idle`), talks to the
//! active provider, keeps the recency list and fires host notifications.
//!
//! State lives behind a std mutex that is never held across an await. The
//! Idle → Connecting check-and-set happens before the first await of
//! `request_connect`, so concurrent requests cannot both proceed.

use crate::adapter::{lock, BackendAdapter, SessionState};
use crate::config::EngineConfig;
use crate::deep_link::HardcodedBackend;
use crate::error::WalletError;
use crate::notification::{NotificationCallback, WalletNotification};
use crate::provider::{ProviderKind, WalletProvider};
use crate::ranking::{rank, RankedList};
use crate::recency::RecencyStore;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use unikit_types::constants::ONBOARDING_DIRECTORY_URL;
use unikit_types::{BackendDescriptor, BackendId, Readiness};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnecting,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub selected: Option<BackendId>,
    pub status: ConnectionStatus,
    pub modal_visible: bool,
}

/// What to show a user who has no usable wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingSuggestions {
    pub backends: Vec<HardcodedBackend>,
    pub directory_url: String,
}

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    /// Backend and address of the live session, for disconnect notifications.
    session: Option<(BackendDescriptor, String)>,
    /// Bumped on provider switch; stale connect results are discarded.
    epoch: u64,
}

pub struct ConnectionEngine {
    config: EngineConfig,
    provider: Mutex<Arc<dyn WalletProvider>>,
    generation: watch::Sender<u64>,
    recency: RecencyStore,
    notifier: Arc<dyn NotificationCallback>,
    inner: Mutex<Inner>,
}

impl ConnectionEngine {
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn WalletProvider>,
        recency: RecencyStore,
        notifier: Arc<dyn NotificationCallback>,
    ) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            config,
            provider: Mutex::new(provider),
            generation,
            recency,
            notifier,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn recency(&self) -> &RecencyStore {
        &self.recency
    }

    fn provider(&self) -> Arc<dyn WalletProvider> {
        lock(&self.provider).clone()
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider().kind()
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.inner).state.clone()
    }

    pub fn session(&self) -> SessionState {
        self.provider().current_session()
    }

    /// Rank the active provider's backends for display.
    pub fn ranked(&self) -> RankedList {
        let backends = self.provider().list_backends();
        rank(
            &backends,
            &self.recency.list(),
            &self.config.precedence_list,
            &self.config.pinned_backends,
        )
    }

    pub fn onboarding_suggestions(&self) -> OnboardingSuggestions {
        OnboardingSuggestions {
            backends: self.config.hardcoded_backends.clone(),
            directory_url: ONBOARDING_DIRECTORY_URL.to_string(),
        }
    }

    // =========================================================================
    // Modal
    // =========================================================================

    pub fn open_modal(&self) {
        lock(&self.inner).state.modal_visible = true;
    }

    pub fn cancel_modal(&self) {
        lock(&self.inner).state.modal_visible = false;
    }

    // =========================================================================
    // Connect / disconnect
    // =========================================================================

    /// Connect the backend `id` from the current ranked list.
    ///
    /// Fails fast with `ConnectInProgress` or `AlreadyConnected`. Any other
    /// failure returns the engine to Idle, fires `on_not_installed` and is
    /// returned to the caller.
    pub async fn request_connect(&self, id: &BackendId) -> Result<(), WalletError> {
        let provider = self.provider();
        let ranked = self.ranked();

        let (descriptor, epoch) = {
            let mut inner = lock(&self.inner);
            match inner.state.status {
                ConnectionStatus::Connecting | ConnectionStatus::Disconnecting => {
                    return Err(WalletError::ConnectInProgress);
                }
                ConnectionStatus::Connected => {
                    let current = inner.state.selected.clone().unwrap_or_else(|| id.clone());
                    return Err(WalletError::AlreadyConnected(current));
                }
                ConnectionStatus::Idle => {}
            }
            let descriptor = ranked
                .get(id)
                .cloned()
                .ok_or_else(|| WalletError::UnknownBackend(id.clone()))?;
            inner.state.status = ConnectionStatus::Connecting;
            inner.state.selected = Some(id.clone());
            inner.state.modal_visible = false;
            (descriptor, inner.epoch)
        };

        log::debug!("{}: idle -> connecting", id);
        self.notifier
            .on_connecting(&WalletNotification::new(&descriptor, None));

        let result = self.run_connect(provider.as_ref(), &descriptor).await;

        let current = {
            let mut inner = lock(&self.inner);
            if inner.epoch == epoch {
                match &result {
                    Ok(address) => {
                        inner.state.status = ConnectionStatus::Connected;
                        inner.session = Some((descriptor.clone(), address.clone()));
                    }
                    Err(_) => {
                        inner.state.status = ConnectionStatus::Idle;
                        inner.state.selected = None;
                    }
                }
            }
            inner.epoch == epoch
        };

        if !current {
            log::debug!("{}: provider switched during connect, result dropped", id);
            if result.is_ok() {
                if let Err(e) = provider.disconnect().await {
                    log::debug!("releasing stale session failed: {}", e);
                }
            }
            return Err(WalletError::Other("provider switched during connect".into()));
        }

        match result {
            Ok(address) => {
                log::info!("connected to {} as {}", id, address);
                self.recency.record(id);
                self.notifier
                    .on_connect(&WalletNotification::new(&descriptor, Some(&address)));
                Ok(())
            }
            Err(e) => {
                log::warn!("connect to {} failed: {}", id, e);
                self.notifier
                    .on_not_installed(&WalletNotification::new(&descriptor, None));
                Err(e)
            }
        }
    }

    /// Select, then fire exactly one provider connect unless selecting
    /// already produced a session. Returns the session address.
    async fn run_connect(
        &self,
        provider: &dyn WalletProvider,
        descriptor: &BackendDescriptor,
    ) -> Result<String, WalletError> {
        let id = &descriptor.id;
        provider.select(id).await?;

        let readiness = provider
            .adapter(id)
            .map(|a| a.readiness())
            .unwrap_or(descriptor.readiness);
        if readiness == Readiness::NotDetected {
            return Err(WalletError::NotDetected(id.clone()));
        }

        // An auto-connecting provider may already hold the session.
        if !provider.current_session().is_active() {
            provider.connect().await?;
        }

        let session = provider.current_session();
        match session.public_address {
            Some(address) if session.is_connected => Ok(address),
            _ => Err(WalletError::NoSession(id.clone())),
        }
    }

    /// Release the session and return to Idle.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let provider = self.provider();
        {
            let mut inner = lock(&self.inner);
            if inner.state.status != ConnectionStatus::Connected {
                return Err(WalletError::NotConnected);
            }
            inner.state.status = ConnectionStatus::Disconnecting;
        }
        log::debug!("connected -> disconnecting");

        if let Err(e) = provider.disconnect().await {
            log::warn!("releasing session failed: {}", e);
        }
        self.finish_disconnect(ConnectionStatus::Disconnecting);
        Ok(())
    }

    /// Pick up a backend-initiated session drop. Returns true if the engine
    /// went from Connected to Idle.
    pub fn reconcile(&self) -> bool {
        if self.provider().current_session().is_active() {
            return false;
        }
        self.finish_disconnect(ConnectionStatus::Connected)
    }

    /// Reconcile on every session change of the active provider, following
    /// provider switches. Returns when the provider stops publishing.
    pub async fn watch_session(&self) {
        let mut generation = self.generation.subscribe();
        loop {
            let mut session = self.provider().session();
            // Catch drops that happened before this subscription.
            self.reconcile();
            loop {
                tokio::select! {
                    changed = session.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        self.reconcile();
                    }
                    switched = generation.changed() => {
                        if switched.is_err() {
                            return;
                        }
                        break;
                    }
                }
            }
        }
    }

    /// Eagerly reconnect the most recent backend when auto-connect is on.
    pub async fn mount(&self) {
        if !self.config.auto_connect {
            return;
        }
        let head = match self.recency.head() {
            Some(id) => id,
            None => return,
        };
        let ready = self
            .ranked()
            .get(&head)
            .map(|d| d.readiness.is_ready())
            .unwrap_or(false);
        if !ready {
            log::debug!("not reconnecting {}: not available", head);
            return;
        }
        if let Err(e) = self.request_connect(&head).await {
            log::warn!("reconnect to {} failed: {}", head, e);
        }
    }

    /// Replace the active provider. A live session is released without
    /// notifications; the modal stays as it was. A connect still in flight
    /// fails with `Other` and releases whatever session it produced.
    pub async fn switch_provider(&self, provider: Arc<dyn WalletProvider>) {
        let new_kind = provider.kind();
        let old = std::mem::replace(&mut *lock(&self.provider), provider);

        let had_session = {
            let mut inner = lock(&self.inner);
            let had = inner.state.status == ConnectionStatus::Connected;
            inner.state.status = ConnectionStatus::Idle;
            inner.state.selected = None;
            inner.session = None;
            inner.epoch += 1;
            had
        };
        self.generation.send_modify(|g| *g += 1);
        log::info!("switched provider: {} -> {}", old.kind(), new_kind);

        if had_session {
            if let Err(e) = old.disconnect().await {
                log::debug!("releasing old provider session failed: {}", e);
            }
        }
    }

    /// `expected` -> Idle, firing `on_disconnect` for the recorded session.
    fn finish_disconnect(&self, expected: ConnectionStatus) -> bool {
        let session = {
            let mut inner = lock(&self.inner);
            if inner.state.status != expected {
                return false;
            }
            inner.state.status = ConnectionStatus::Idle;
            inner.state.selected = None;
            inner.session.take()
        };
        log::debug!("{} -> idle", expected);

        if let Some((descriptor, address)) = session {
            log::info!("disconnected from {}", descriptor.id);
            self.notifier
                .on_disconnect(&WalletNotification::new(&descriptor, Some(&address)));
        }
        true
    }
}
