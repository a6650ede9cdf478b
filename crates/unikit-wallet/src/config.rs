//! Host configuration for the connection engine.
//!
//! Loaded from camelCase JSON; every field has a default so a host only
//! spells out what it changes.

use crate::deep_link::HardcodedBackend;
use crate::error::WalletError;
use crate::relay::DEFAULT_POLL_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use unikit_relay::{AppIdentity, RelayConfig};
use unikit_types::{BackendId, Cluster, Language, Theme};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Reconnect the most recent backend on mount, and connect on select.
    pub auto_connect: bool,
    pub env: Cluster,
    /// Overflow ordering for ids of equal readiness.
    pub precedence_list: Vec<BackendId>,
    /// Ids that always lead the highlight group.
    pub pinned_backends: Vec<BackendId>,
    pub theme: Theme,
    pub language: Language,
    pub metadata: AppIdentity,
    pub walletlist_explanation: Option<String>,
    pub hardcoded_backends: Vec<HardcodedBackend>,
    pub relay: Option<RelaySettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_connect: false,
            env: Cluster::MainnetBeta,
            precedence_list: Vec::new(),
            pinned_backends: Vec::new(),
            theme: Theme::Light,
            language: Language::En,
            metadata: AppIdentity::default(),
            walletlist_explanation: None,
            hardcoded_backends: Vec::new(),
            relay: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, WalletError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| WalletError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        for b in &self.hardcoded_backends {
            if b.id.as_str().trim().is_empty() || b.name.trim().is_empty() {
                return Err(WalletError::Config(
                    "hardcoded backend needs an id and a name".into(),
                ));
            }
        }
        if let Some(relay) = &self.relay {
            if relay.poll_interval_ms == 0 {
                return Err(WalletError::Config("relay pollIntervalMs must be > 0".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    pub url: String,
    pub project_id: Option<String>,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: Option<u64>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            url: unikit_relay::DEFAULT_RELAY_URL.to_string(),
            project_id: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            connect_timeout_ms: None,
        }
    }
}

impl RelaySettings {
    pub fn client_config(&self) -> RelayConfig {
        RelayConfig {
            url: self.url.clone(),
            project_id: self.project_id.clone(),
            ..Default::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}
