//! Relay-brokered backend.
//!
//! `RelayAdapter` connects through a hosted pairing modal: it opens the modal,
//! polls the transport until a wallet pairs or the user closes the modal, and
//! then tracks the paired session. The transport is injected, so the adapter
//! never reaches for a process-wide relay handle.

use crate::adapter::{lock, AdapterEvent, AdapterEvents, BackendAdapter};
use crate::error::WalletError;
use crate::proxy::ProxyAdapter;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use unikit_relay::{AppIdentity, ConnectionStatus, PairingRpc};
use unikit_types::constants::{RELAY_BACKEND_NAME, RELAY_BACKEND_URL};
use unikit_types::{BackendDescriptor, BackendId, Cluster, Readiness};

/// Default modal polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const RELAY_ICON: &str = "https://reown.com/favicon.svg";

/// What the hosted modal and pairing look like right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStatus {
    pub address: Option<String>,
    pub open: bool,
    pub loading: bool,
}

/// Hosted pairing service as seen by the adapter.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Open the hosted connect modal.
    async fn open(&self) -> Result<(), WalletError>;
    /// Close the modal, leaving any session intact.
    async fn close(&self) -> Result<(), WalletError>;
    async fn status(&self) -> Result<RelayStatus, WalletError>;
    /// Deep-link a specific wallet app into the pairing.
    async fn connect_wallet(&self, wallet_id: &str) -> Result<(), WalletError>;
    async fn disconnect(&self) -> Result<(), WalletError>;
    /// The relay is restoring an earlier session; no modal is needed.
    async fn is_reconnecting(&self) -> bool;
}

// =============================================================================
// Hosted pairing transport
// =============================================================================

#[derive(Default)]
struct PairingSlot {
    ticket: Option<String>,
    pending_wallet: Option<String>,
}

/// `RelayTransport` over the hosted relay's JSON-RPC API.
pub struct HostedPairing {
    rpc: PairingRpc,
    cluster: Cluster,
    app: AppIdentity,
    slot: Mutex<PairingSlot>,
}

impl HostedPairing {
    pub fn new(rpc: PairingRpc, cluster: Cluster, app: AppIdentity) -> Self {
        Self {
            rpc,
            cluster,
            app,
            slot: Mutex::new(PairingSlot::default()),
        }
    }

    pub fn ticket(&self) -> Option<String> {
        lock(&self.slot).ticket.clone()
    }
}

#[async_trait]
impl RelayTransport for HostedPairing {
    async fn open(&self) -> Result<(), WalletError> {
        let ticket = self.rpc.open_modal(self.cluster, &self.app).await?;
        log::info!("relay pairing opened on {}: {}", self.cluster, ticket.uri);
        let pending = {
            let mut slot = lock(&self.slot);
            slot.ticket = Some(ticket.ticket.clone());
            slot.pending_wallet.take()
        };
        // A wallet requested before the ticket existed.
        if let Some(wallet) = pending {
            self.rpc.connect_wallet(&ticket.ticket, &wallet).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), WalletError> {
        if let Some(ticket) = self.ticket() {
            self.rpc.close_modal(&ticket).await?;
        }
        Ok(())
    }

    async fn status(&self) -> Result<RelayStatus, WalletError> {
        let ticket = match self.ticket() {
            Some(t) => t,
            None => return Ok(RelayStatus::default()),
        };
        let modal = self.rpc.modal_state(&ticket).await?;
        let account = self.rpc.account(&ticket).await?;
        Ok(RelayStatus {
            address: account.address.filter(|_| account.is_connected),
            open: modal.open,
            loading: modal.loading,
        })
    }

    async fn connect_wallet(&self, wallet_id: &str) -> Result<(), WalletError> {
        let ticket = {
            let mut slot = lock(&self.slot);
            if slot.ticket.is_none() {
                slot.pending_wallet = Some(wallet_id.to_string());
            }
            slot.ticket.clone()
        };
        if let Some(ticket) = ticket {
            self.rpc.connect_wallet(&ticket, wallet_id).await?;
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let ticket = lock(&self.slot).ticket.take();
        if let Some(ticket) = ticket {
            self.rpc.disconnect(&ticket).await?;
        }
        Ok(())
    }

    async fn is_reconnecting(&self) -> bool {
        let ticket = match self.ticket() {
            Some(t) => t,
            None => return false,
        };
        matches!(
            self.rpc.connection_status(&ticket).await,
            Ok(ConnectionStatus::Reconnecting)
        )
    }
}

// =============================================================================
// Relay adapter
// =============================================================================

pub struct RelayAdapter {
    transport: Arc<dyn RelayTransport>,
    readiness: Readiness,
    poll_interval: Duration,
    connect_timeout: Option<Duration>,
    address: Mutex<Option<String>>,
    connecting: AtomicBool,
    events: AdapterEvents,
}

impl RelayAdapter {
    pub fn new(transport: Arc<dyn RelayTransport>) -> Self {
        Self {
            transport,
            readiness: Readiness::Loadable,
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: None,
            address: Mutex::new(None),
            connecting: AtomicBool::new(false),
            events: AdapterEvents::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Unsupported hides the relay from the wallet list.
    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn transport(&self) -> &Arc<dyn RelayTransport> {
        &self.transport
    }

    /// Check whether the relay still holds the session. On a backend-side
    /// drop, clears the address and emits Disconnect plus a
    /// `SessionDisconnected` error. Returns true if the session was dropped.
    pub async fn check_session(&self) -> Result<bool, WalletError> {
        if self.public_address().is_none() {
            return Ok(false);
        }
        let status = self.transport.status().await?;
        if status.address.is_some() {
            return Ok(false);
        }
        *lock(&self.address) = None;
        log::info!("relay session dropped by the wallet");
        self.events.emit(AdapterEvent::Disconnect);
        self.events
            .emit(AdapterEvent::Error(WalletError::SessionDisconnected.to_string()));
        Ok(true)
    }

    /// Run `check_session` every poll interval until the adapter is dropped.
    pub fn watch(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let interval = self.poll_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let adapter = match weak.upgrade() {
                    Some(a) => a,
                    None => break,
                };
                if let Err(e) = adapter.check_session().await {
                    log::debug!("relay session check failed: {}", e);
                }
            }
        })
    }

    /// The relay re-presented as a specific wallet: connecting asks the relay
    /// to deep-link `wallet_id` on the next tick, then runs the normal relay
    /// connect.
    pub fn branded_entry(
        self: &Arc<Self>,
        wallet_id: &str,
        name: &str,
        url: &str,
        icon: &str,
    ) -> ProxyAdapter {
        let transport = self.transport.clone();
        let wallet_id = wallet_id.to_string();
        ProxyAdapter::builder(self.clone())
            .display_name(name)
            .url(url)
            .icon(icon)
            .connect(move |base| {
                let transport = transport.clone();
                let wallet = wallet_id.clone();
                async move {
                    tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        if let Err(e) = transport.connect_wallet(&wallet).await {
                            log::warn!("relay deep link to {} failed: {}", wallet, e);
                        }
                    });
                    base.connect().await
                }
                .boxed()
            })
            .build()
    }

    async fn pair(&self) -> Result<String, WalletError> {
        if self.transport.is_reconnecting().await {
            log::debug!("relay is restoring a session, skipping modal");
        } else {
            self.transport.open().await?;
        }

        let started = Instant::now();
        loop {
            let status = self.transport.status().await?;
            if let Some(address) = status.address {
                if let Err(e) = self.transport.close().await {
                    log::debug!("closing relay modal failed: {}", e);
                }
                return Ok(address);
            }
            if !status.open && !status.loading {
                return Err(WalletError::RelayClosed("modal closed".into()));
            }
            if let Some(timeout) = self.connect_timeout {
                if started.elapsed() >= timeout {
                    if let Err(e) = self.transport.close().await {
                        log::debug!("closing relay modal failed: {}", e);
                    }
                    return Err(WalletError::RelayClosed("timed out".into()));
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl BackendAdapter for RelayAdapter {
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            id: BackendId::from(RELAY_BACKEND_NAME),
            display_name: RELAY_BACKEND_NAME.to_string(),
            icon: RELAY_ICON.to_string(),
            url: RELAY_BACKEND_URL.to_string(),
            readiness: self.readiness,
            supported_sign_modes: unikit_types::default_sign_modes(),
        }
    }

    fn public_address(&self) -> Option<String> {
        lock(&self.address).clone()
    }

    fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), WalletError> {
        if self.public_address().is_some() {
            return Ok(());
        }
        if self
            .connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        let result = self.pair().await;
        self.connecting.store(false, Ordering::SeqCst);

        let address = result?;
        log::info!("relay paired with {}", address);
        *lock(&self.address) = Some(address.clone());
        self.events.emit(AdapterEvent::Connect(address));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        *lock(&self.address) = None;
        if let Err(e) = self.transport.disconnect().await {
            log::warn!("relay disconnect failed: {}", e);
        }
        self.events.emit(AdapterEvent::Disconnect);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.events.subscribe()
    }
}
