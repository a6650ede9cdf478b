//! Client library for hosted wallet pairing relays.
//!
//! An async JSON-RPC 2.0 HTTP client with retry/backoff, plus the typed
//! pairing API used by the relay backend of `unikit-wallet`.
//!
//! # Example
//!
//! ```ignore
//! use unikit_relay::{AppIdentity, PairingRpc};
//! use unikit_types::Cluster;
//!
//! #[tokio::main]
//! async fn main() {
//!     let relay = PairingRpc::new("https://relay.unikit.dev").unwrap();
//!     let ticket = relay
//!         .open_modal(Cluster::MainnetBeta, &AppIdentity::default())
//!         .await
//!         .unwrap();
//!     println!("Pair with: {}", ticket.uri);
//! }
//! ```

pub mod client;
pub mod error;
pub mod pairing;

pub use client::{Credentials, RelayClient, RelayConfig};
pub use error::RelayError;
pub use pairing::{AccountState, AppIdentity, ConnectionStatus, ModalState, PairingRpc, PairingTicket};

/// Default hosted relay endpoint.
pub const DEFAULT_RELAY_URL: &str = "https://relay.unikit.dev";
