//! Connection engine error types.

use thiserror::Error;
use unikit_types::{BackendId, DescriptorError};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("backend {0} is not detected on this device")]
    NotDetected(BackendId),

    #[error("relay modal closed: {0}")]
    RelayClosed(String),

    #[error("session disconnected by the backend")]
    SessionDisconnected,

    #[error("malformed backend: {0}")]
    MalformedBackend(#[from] DescriptorError),

    #[error("unknown backend: {0}")]
    UnknownBackend(BackendId),

    #[error("a connect or disconnect is already in progress")]
    ConnectInProgress,

    #[error("already connected to {0}")]
    AlreadyConnected(BackendId),

    #[error("not connected")]
    NotConnected,

    #[error("backend {0} connected without a session")]
    NoSession(BackendId),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("relay error: {0}")]
    Relay(#[from] unikit_relay::RelayError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<crate::store::StoreError> for WalletError {
    fn from(e: crate::store::StoreError) -> Self {
        WalletError::Storage(e.to_string())
    }
}
