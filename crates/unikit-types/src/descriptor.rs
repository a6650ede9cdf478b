//! Uniform description of one connectable wallet backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("backend id must be a non-empty string")]
    MissingId,

    #[error("backend {0} has no display name")]
    MissingName(BackendId),

    #[error("backend {0} has no icon")]
    MissingIcon(BackendId),
}

/// Stable backend name, unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BackendId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for BackendId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for BackendId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BackendId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Whether a backend is available on the user's device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Readiness {
    Installed,
    Loadable,
    NotDetected,
    Unsupported,
}

impl Readiness {
    /// Display priority, lower sorts first. NotDetected and Unsupported tie.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Installed => 1,
            Self::Loadable => 2,
            Self::NotDetected | Self::Unsupported => 3,
        }
    }

    /// Installed or Loadable.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Installed | Self::Loadable)
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Installed => write!(f, "installed"),
            Self::Loadable => write!(f, "loadable"),
            Self::NotDetected => write!(f, "not detected"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Transaction encoding a backend can sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMode {
    Legacy,
    V0,
}

/// Legacy + v0, what every modern Solana wallet reports.
pub fn default_sign_modes() -> BTreeSet<SignMode> {
    [SignMode::Legacy, SignMode::V0].into_iter().collect()
}

/// One connectable wallet backend as reported by its adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendDescriptor {
    pub id: BackendId,
    pub display_name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub url: String,
    pub readiness: Readiness,
    #[serde(default = "default_sign_modes")]
    pub supported_sign_modes: BTreeSet<SignMode>,
}

impl BackendDescriptor {
    /// Descriptor whose display name is its id, with the default sign modes.
    pub fn new(id: &str, icon: &str, url: &str, readiness: Readiness) -> Self {
        Self {
            id: BackendId::from(id),
            display_name: id.to_string(),
            icon: icon.to_string(),
            url: url.to_string(),
            readiness,
            supported_sign_modes: default_sign_modes(),
        }
    }

    /// Check the fields the UI cannot render without.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.id.as_str().trim().is_empty() {
            return Err(DescriptorError::MissingId);
        }
        if self.display_name.trim().is_empty() {
            return Err(DescriptorError::MissingName(self.id.clone()));
        }
        if self.icon.trim().is_empty() {
            return Err(DescriptorError::MissingIcon(self.id.clone()));
        }
        Ok(())
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }
}
