//! A relay re-presented as a branded wallet entry, driven through the engine.

mod common;

use async_trait::async_trait;
use common::{kinds, Harness};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use unikit_types::BackendId;
use unikit_wallet::{
    AdapterEvent, BackendAdapter, ConnectionStatus, EngineConfig, RelayAdapter, RelayProvider,
    RelayStatus, RelayTransport, WalletError,
};

const ADDRESS: &str = "7fUAJdStEuGbc3sM84cKRL6yYaaSstyLSU4ve5oovLS7";

/// Pairs on the second poll; tracks which wallet was deep-linked.
#[derive(Default)]
struct PairingRelay {
    polls: AtomicUsize,
    released: AtomicBool,
    wallets: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
}

#[async_trait]
impl RelayTransport for PairingRelay {
    async fn open(&self) -> Result<(), WalletError> {
        Ok(())
    }
    async fn close(&self) -> Result<(), WalletError> {
        Ok(())
    }
    async fn status(&self) -> Result<RelayStatus, WalletError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        let address = if poll >= 1 && !self.released.load(Ordering::SeqCst) {
            Some(ADDRESS.to_string())
        } else {
            None
        };
        Ok(RelayStatus {
            address,
            open: true,
            loading: false,
        })
    }
    async fn connect_wallet(&self, wallet_id: &str) -> Result<(), WalletError> {
        self.wallets.lock().unwrap().push(wallet_id.to_string());
        Ok(())
    }
    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
    async fn is_reconnecting(&self) -> bool {
        false
    }
}

fn branded() -> (Arc<PairingRelay>, Arc<RelayAdapter>, Harness) {
    let transport = Arc::new(PairingRelay::default());
    let relay = Arc::new(
        RelayAdapter::new(transport.clone()).with_poll_interval(Duration::from_millis(1)),
    );
    let entry = relay.branded_entry(
        "jupiter",
        "Jupiter Mobile",
        "https://jup.ag/mobile",
        "https://jup.ag/svg/jupiter-logo.svg",
    );
    let provider = Arc::new(RelayProvider::branded(relay.clone(), Arc::new(entry)));
    let harness = Harness::with_provider(provider, EngineConfig::default());
    (transport, relay, harness)
}

#[tokio::test]
async fn test_branded_entry_connects_through_relay() {
    let (transport, relay, mut h) = branded();

    let ranked = h.engine.ranked();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked.iter().next().unwrap().display_name, "Jupiter Mobile");

    h.engine.request_connect(&BackendId::from("Jupiter Mobile")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(*transport.wallets.lock().unwrap(), vec!["jupiter".to_string()]);
    assert_eq!(relay.public_address().as_deref(), Some(ADDRESS));

    let events = h.drain();
    assert_eq!(kinds(&events), vec!["connecting", "connect"]);
    let n = events[1].notification();
    assert_eq!(n.backend_name, "Jupiter Mobile");
    assert_eq!(n.short_address, "7fUA...vLS7");
    assert_eq!(n.metadata.url, "https://jup.ag/mobile");
}

#[tokio::test]
async fn test_proxy_disconnect_tears_down_relay() {
    let (transport, relay, mut h) = branded();
    let mut relay_events = relay.subscribe();

    h.engine.request_connect(&BackendId::from("Jupiter Mobile")).await.unwrap();
    h.engine.disconnect().await.unwrap();

    assert_eq!(transport.disconnects.load(Ordering::SeqCst), 1);
    assert!(relay.public_address().is_none());
    assert_eq!(h.engine.state().status, ConnectionStatus::Idle);
    assert!(matches!(relay_events.recv().await.unwrap(), AdapterEvent::Connect(_)));
    assert_eq!(relay_events.recv().await.unwrap(), AdapterEvent::Disconnect);
    assert_eq!(kinds(&h.drain()), vec!["connecting", "connect", "disconnect"]);
}

#[tokio::test]
async fn test_relay_side_drop_converges_through_proxy() {
    let (_transport, relay, mut h) = branded();
    h.engine.request_connect(&BackendId::from("Jupiter Mobile")).await.unwrap();
    assert_eq!(h.engine.state().status, ConnectionStatus::Connected);

    // The base session ends without going through the proxy.
    relay.disconnect().await.unwrap();
    assert!(h.engine.reconcile());
    assert_eq!(h.engine.state().status, ConnectionStatus::Idle);
    assert_eq!(kinds(&h.drain()), vec!["connecting", "connect", "disconnect"]);
}

#[tokio::test]
async fn test_wallet_side_drop_reaches_engine_through_proxy() {
    let (transport, relay, mut h) = branded();
    h.engine.request_connect(&BackendId::from("Jupiter Mobile")).await.unwrap();
    assert_eq!(h.engine.state().status, ConnectionStatus::Connected);

    let engine = h.engine.clone();
    let watcher = tokio::spawn(async move { engine.watch_session().await });

    // The wallet hangs up; only the relay poll can notice.
    transport.released.store(true, Ordering::SeqCst);

    let mut seen = Vec::new();
    while !seen.contains(&"disconnect") {
        let event = tokio::time::timeout(Duration::from_secs(2), h.events.recv())
            .await
            .expect("disconnect notification")
            .unwrap();
        seen.extend(kinds(std::slice::from_ref(&event)));
    }
    watcher.abort();

    assert_eq!(seen, vec!["connecting", "connect", "disconnect"]);
    assert_eq!(h.engine.state().status, ConnectionStatus::Idle);
    assert!(!h.engine.session().is_active());
    assert!(relay.public_address().is_none());
    assert_eq!(transport.disconnects.load(Ordering::SeqCst), 0);
}
