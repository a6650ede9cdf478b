//! CLI command implementations.

use crate::AppContext;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use unikit_relay::PairingRpc;
use unikit_types::constants::RELAY_BACKEND_NAME;
use unikit_types::{BackendDescriptor, BackendId, PublicAddress};
use unikit_wallet::{
    adapters_for, AdapterEvent, AdapterEvents, AdapterHandle, BackendAdapter, ChannelNotifier,
    ConnectionEngine, HostedPairing, LocalRegistryProvider, Migration, NoopLauncher,
    NotificationEvent, RankedList, RelayAdapter, RelayProvider, WalletError, WalletProvider,
};

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

// ─── Simulated backends ─────────────────────────────────────────────────────

/// Stands in for a real wallet: connects instantly with a fresh random
/// address when its readiness allows it.
struct DemoAdapter {
    descriptor: BackendDescriptor,
    address: Mutex<Option<String>>,
    events: AdapterEvents,
}

impl DemoAdapter {
    fn new(descriptor: BackendDescriptor) -> Self {
        Self {
            descriptor,
            address: Mutex::new(None),
            events: AdapterEvents::new(),
        }
    }

    fn set_address(&self, address: Option<String>) {
        *self.address.lock().unwrap_or_else(|e| e.into_inner()) = address;
    }
}

#[async_trait]
impl BackendAdapter for DemoAdapter {
    fn descriptor(&self) -> BackendDescriptor {
        self.descriptor.clone()
    }

    fn public_address(&self) -> Option<String> {
        self.address.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn is_connecting(&self) -> bool {
        false
    }

    async fn connect(&self) -> std::result::Result<(), WalletError> {
        if !self.descriptor.readiness.is_ready() {
            return Err(WalletError::NotDetected(self.descriptor.id.clone()));
        }
        let address = PublicAddress::from_bytes(&rand::random::<[u8; 32]>()).to_string();
        self.set_address(Some(address.clone()));
        self.events.emit(AdapterEvent::Connect(address));
        Ok(())
    }

    async fn disconnect(&self) -> std::result::Result<(), WalletError> {
        self.set_address(None);
        self.events.emit(AdapterEvent::Disconnect);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.events.subscribe()
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn load_backends(
    path: &Path,
) -> std::result::Result<Vec<BackendDescriptor>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let backends: Vec<BackendDescriptor> = serde_json::from_str(&text)
        .map_err(|e| format!("invalid backend list {}: {}", path.display(), e))?;
    Ok(backends)
}

/// Simulated adapters for `path` plus the configured deep-link backends.
fn local_provider(
    ctx: &AppContext,
    path: &Path,
) -> std::result::Result<Arc<LocalRegistryProvider>, Box<dyn std::error::Error>> {
    let mut adapters: Vec<AdapterHandle> = load_backends(path)?
        .into_iter()
        .map(|d| Arc::new(DemoAdapter::new(d)) as AdapterHandle)
        .collect();
    adapters.extend(adapters_for(
        &ctx.config.hardcoded_backends,
        Arc::new(NoopLauncher),
    ));
    Ok(Arc::new(LocalRegistryProvider::new(
        adapters,
        ctx.config.auto_connect,
    )))
}

fn build_engine(
    ctx: &AppContext,
    provider: Arc<dyn WalletProvider>,
) -> (
    ConnectionEngine,
    tokio::sync::mpsc::UnboundedReceiver<NotificationEvent>,
) {
    let (notifier, events) = ChannelNotifier::new();
    let engine = ConnectionEngine::new(
        ctx.config.clone(),
        provider,
        ctx.recency(),
        Arc::new(notifier),
    );
    (engine, events)
}

/// Print notifications until the engine (and its notifier) is dropped.
fn print_notifications(
    mut events: tokio::sync::mpsc::UnboundedReceiver<NotificationEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let n = event.notification();
            let label = match &event {
                NotificationEvent::Connect(_) => "connect",
                NotificationEvent::Connecting(_) => "connecting",
                NotificationEvent::Disconnect(_) => "disconnect",
                NotificationEvent::NotInstalled(_) => "not installed",
            };
            if n.short_address.is_empty() {
                println!("  [{}] {}", label, n.backend_name);
            } else {
                println!("  [{}] {} ({})", label, n.backend_name, n.short_address);
            }
            if matches!(event, NotificationEvent::NotInstalled(_)) && !n.metadata.url.is_empty() {
                println!("      get it at {}", n.metadata.url);
            }
        }
    })
}

fn print_ranked(ranked: &RankedList) {
    println!("Grouping: {}", ranked.reason);
    println!();
    println!("Highlight:");
    if ranked.highlight.is_empty() {
        println!("  (none)");
    }
    for d in &ranked.highlight {
        println!("  {:<24} {}", d.display_name, d.readiness);
    }
    if !ranked.overflow.is_empty() {
        println!();
        println!("More wallets:");
        for d in &ranked.overflow {
            println!("  {:<24} {}", d.display_name, d.readiness);
        }
    }
}

// ─── Commands ───────────────────────────────────────────────────────────────

pub async fn rank_backends(ctx: &AppContext, backends: &Path) -> Result {
    let provider = local_provider(ctx, backends)?;
    let (engine, _events) = build_engine(ctx, provider);

    let ranked = engine.ranked();
    if ranked.is_empty() {
        let onboarding = engine.onboarding_suggestions();
        println!("No wallet detected.");
        println!();
        if !onboarding.backends.is_empty() {
            println!("Suggested wallets:");
            for b in &onboarding.backends {
                println!("  {:<24} {}", b.name, b.url);
            }
            println!();
        }
        println!("Browse more at {}", onboarding.directory_url);
        if let Some(ref explanation) = ctx.config.walletlist_explanation {
            println!("What is a wallet? {}", explanation);
        }
        return Ok(());
    }

    print_ranked(&ranked);
    Ok(())
}

pub async fn show_history(ctx: &AppContext) -> Result {
    let recency = ctx.recency();
    let ids = recency.list();
    if ids.is_empty() {
        println!("No previously connected wallets.");
        return Ok(());
    }

    println!("{:<4} BACKEND", "#");
    for (i, id) in ids.iter().enumerate() {
        println!("{:<4} {}", i + 1, id);
    }
    Ok(())
}

pub async fn migrate(ctx: &AppContext) -> Result {
    let recency = ctx.recency();
    match recency.opened_with() {
        Some(Migration::Migrated { moved, total }) => {
            println!(
                "Moved {} legacy entries; {} wallets in history.",
                moved, total
            );
        }
        Some(Migration::NotNeeded) => {
            println!("Nothing to migrate.");
        }
        None => {
            return Err(format!(
                "migration failed for {}",
                ctx.store_path.display()
            )
            .into());
        }
    }
    Ok(())
}

pub async fn forget(ctx: &AppContext) -> Result {
    let recency = ctx.recency();
    let count = recency.list().len();
    recency.clear();
    if recency.is_degraded() {
        return Err(format!("cannot write {}", ctx.store_path.display()).into());
    }
    println!("Forgot {} wallets.", count);
    Ok(())
}

pub async fn connect(ctx: &AppContext, backends: &Path, id: &str) -> Result {
    let provider = local_provider(ctx, backends)?;
    let (engine, events) = build_engine(ctx, provider);
    let printer = print_notifications(events);

    let id = BackendId::from(id);
    println!("Connecting to {} ...", id);
    let outcome = engine.request_connect(&id).await;

    if outcome.is_ok() {
        let session = engine.session();
        println!(
            "Connected: {}",
            session.public_address.unwrap_or_default()
        );
        if let Err(e) = engine.disconnect().await {
            log::warn!("disconnect failed: {}", e);
        }
    }

    drop(engine);
    if let Err(e) = printer.await {
        log::warn!("notification printer failed: {}", e);
    }

    outcome?;
    if let Some(head) = ctx.recency().head() {
        println!("Most recent wallet: {}", head);
    }
    Ok(())
}

pub async fn relay(ctx: &AppContext, wallet: Option<String>, timeout: u64) -> Result {
    let settings = ctx.config.relay.clone().unwrap_or_default();
    let rpc = PairingRpc::with_config(settings.client_config())?;
    let pairing = HostedPairing::new(rpc, ctx.config.env, ctx.config.metadata.clone());

    let connect_timeout = settings
        .connect_timeout()
        .unwrap_or(Duration::from_secs(timeout));
    let relay = Arc::new(
        RelayAdapter::new(Arc::new(pairing))
            .with_poll_interval(settings.poll_interval())
            .with_connect_timeout(Some(connect_timeout)),
    );

    if let Some(ref wallet) = wallet {
        // Queued until the pairing is open.
        relay.transport().connect_wallet(wallet).await?;
    }

    let provider = Arc::new(RelayProvider::hosted(relay));
    let (engine, events) = build_engine(ctx, provider);
    let printer = print_notifications(events);

    println!("Opening relay pairing at {} ...", settings.url);
    let outcome = engine
        .request_connect(&BackendId::from(RELAY_BACKEND_NAME))
        .await;

    if outcome.is_ok() {
        println!("Paired. Press Ctrl-C to disconnect.");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = engine.watch_session() => {}
        }
        if engine.disconnect().await.is_err() {
            println!("Session already ended.");
        }
    }

    drop(engine);
    if let Err(e) = printer.await {
        log::warn!("notification printer failed: {}", e);
    }
    outcome?;
    Ok(())
}
