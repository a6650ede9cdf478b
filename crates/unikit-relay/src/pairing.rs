//! Pairing relay RPC client.
//!
//! Typed async methods for the hosted pairing flow: open and close the hosted
//! connect modal, read its state, read the paired account, ask the relay to
//! deep-link a specific wallet, and tear the pairing down.

use crate::client::{RelayClient, RelayConfig};
use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use unikit_types::Cluster;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Identity of the dApp shown inside the hosted modal and the paired wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIdentity {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Full URIs; the first one is used as the main icon.
    #[serde(default)]
    pub icon_urls: Vec<String>,
}

/// Returned by `wc_openModal`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingTicket {
    /// Opaque handle for every later call on this pairing.
    pub ticket: String,
    /// Pairing URI, rendered as a QR code by the hosted modal.
    #[serde(default)]
    pub uri: String,
}

/// Returned by `wc_modalState`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ModalState {
    pub open: bool,
    #[serde(default)]
    pub loading: bool,
}

/// Relay-side connection status of a pairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Reconnecting,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    /// The relay still holds (or is restoring) a session for this pairing.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connected | Self::Connecting | Self::Reconnecting)
    }
}

/// Returned by `wc_account`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub status: ConnectionStatus,
}

// =============================================================================
// Pairing RPC
// =============================================================================

/// Typed client for the pairing relay.
pub struct PairingRpc {
    client: RelayClient,
}

impl PairingRpc {
    pub fn new(url: &str) -> Result<Self, RelayError> {
        Ok(Self {
            client: RelayClient::new(url)?,
        })
    }

    pub fn with_config(config: RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            client: RelayClient::with_config(config)?,
        })
    }

    pub fn client(&self) -> &RelayClient {
        &self.client
    }

    /// Open the hosted connect modal for a new pairing on `cluster`.
    pub async fn open_modal(
        &self,
        cluster: Cluster,
        app: &AppIdentity,
    ) -> Result<PairingTicket, RelayError> {
        let params = json!({
            "chainId": cluster.caip2_chain_id(),
            "metadata": app,
        });
        let result = self.client.call("wc_openModal", params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Close the hosted modal without touching the session.
    pub async fn close_modal(&self, ticket: &str) -> Result<(), RelayError> {
        self.client
            .call("wc_closeModal", json!({ "ticket": ticket }))
            .await?;
        Ok(())
    }

    pub async fn modal_state(&self, ticket: &str) -> Result<ModalState, RelayError> {
        let result = self
            .client
            .call("wc_modalState", json!({ "ticket": ticket }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn account(&self, ticket: &str) -> Result<AccountState, RelayError> {
        let result = self
            .client
            .call("wc_account", json!({ "ticket": ticket }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Relay-side status only, cheaper than `account` while reconnecting.
    pub async fn connection_status(&self, ticket: &str) -> Result<ConnectionStatus, RelayError> {
        let result = self
            .client
            .call("wc_connectionStatus", json!({ "ticket": ticket }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Ask the relay to deep-link a specific wallet app into this pairing.
    pub async fn connect_wallet(&self, ticket: &str, wallet_id: &str) -> Result<(), RelayError> {
        self.client
            .call(
                "wc_connectWallet",
                json!({ "ticket": ticket, "walletId": wallet_id }),
            )
            .await?;
        Ok(())
    }

    /// Tear down the pairing and its session.
    pub async fn disconnect(&self, ticket: &str) -> Result<(), RelayError> {
        let result: Value = self
            .client
            .call("wc_disconnect", json!({ "ticket": ticket }))
            .await?;
        log::debug!("relay disconnect for {}: {}", ticket, result);
        Ok(())
    }
}
