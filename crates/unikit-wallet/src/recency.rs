//! Most-recent-first history of successfully connected backends.
//!
//! Reads go through an in-memory cache. Writes are fire-and-forget: a failed
//! write is logged and the store degrades to in-memory tracking for the rest
//! of the process, so persistence trouble never fails a connect.

use crate::adapter::lock;
use crate::store::{KeyValueStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use unikit_types::constants::{LEGACY_RECENCY_KEY, RECENCY_KEY};
use unikit_types::BackendId;

/// Outcome of the legacy-key migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Migration {
    /// No legacy key present.
    NotNeeded,
    /// Legacy entries merged into the current key, legacy key deleted.
    Migrated { moved: usize, total: usize },
}

pub struct RecencyStore {
    store: Box<dyn KeyValueStore>,
    cache: Mutex<Vec<BackendId>>,
    degraded: AtomicBool,
    opened_with: Option<Migration>,
}

impl RecencyStore {
    /// Migrate the legacy key if present, then load the list.
    ///
    /// Never fails: an unreadable store yields an empty, degraded list.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let mut recency = Self {
            store,
            cache: Mutex::new(Vec::new()),
            degraded: AtomicBool::new(false),
            opened_with: None,
        };

        match recency.migrate() {
            Ok(m) => recency.opened_with = Some(m),
            Err(e) => log::warn!("recency migration failed: {}", e),
        }

        match recency.store.get(RECENCY_KEY) {
            Ok(Some(ids)) => recency.replace_cache(dedup(ids)),
            Ok(None) => {}
            Err(e) => {
                log::warn!("recency list unreadable, tracking in memory: {}", e);
                recency.degraded.store(true, Ordering::Relaxed);
            }
        }
        recency
    }

    /// Move entries stored under the legacy key into the current key.
    ///
    /// Existing current entries stay first. Idempotent: once the legacy key
    /// is gone this is a no-op.
    pub fn migrate(&self) -> Result<Migration, StoreError> {
        let legacy = match self.store.get(LEGACY_RECENCY_KEY)? {
            Some(ids) => ids,
            None => return Ok(Migration::NotNeeded),
        };

        let mut merged = self.store.get(RECENCY_KEY)?.unwrap_or_default();
        merged.extend(legacy.iter().cloned());
        let merged = dedup(merged);

        let ids: Vec<String> = merged.iter().map(|id| id.to_string()).collect();
        self.store.set(RECENCY_KEY, &ids)?;
        self.store.remove(LEGACY_RECENCY_KEY)?;
        self.replace_cache(merged);

        log::info!(
            "migrated {} recency entries from {}",
            legacy.len(),
            LEGACY_RECENCY_KEY
        );
        Ok(Migration::Migrated {
            moved: legacy.len(),
            total: ids.len(),
        })
    }

    /// What the migration in `open` did; `None` if it failed.
    pub fn opened_with(&self) -> Option<&Migration> {
        self.opened_with.as_ref()
    }

    /// Snapshot, most recent first.
    pub fn list(&self) -> Vec<BackendId> {
        lock(&self.cache).clone()
    }

    pub fn head(&self) -> Option<BackendId> {
        self.list().into_iter().next()
    }

    /// Move `id` to the front. The cache is updated first; the write is
    /// best-effort.
    pub fn record(&self, id: &BackendId) {
        let snapshot = {
            let mut cache = lock(&self.cache);
            cache.retain(|existing| existing != id);
            cache.insert(0, id.clone());
            cache.clone()
        };
        self.persist(&snapshot);
    }

    pub fn clear(&self) {
        self.replace_cache(Vec::new());
        if self.is_degraded() {
            return;
        }
        if let Err(e) = self.store.remove(RECENCY_KEY) {
            self.degrade(e);
        }
    }

    /// True once a write has failed; the list is then tracked in memory only.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    fn persist(&self, ids: &[BackendId]) {
        if self.is_degraded() {
            return;
        }
        let values: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        if let Err(e) = self.store.set(RECENCY_KEY, &values) {
            self.degrade(e);
        }
    }

    fn degrade(&self, e: StoreError) {
        log::warn!("recency write failed, tracking in memory: {}", e);
        self.degraded.store(true, Ordering::Relaxed);
    }

    fn replace_cache(&self, ids: Vec<BackendId>) {
        *lock(&self.cache) = ids;
    }
}

/// Keep the first occurrence of each id, dropping blanks.
fn dedup(ids: Vec<String>) -> Vec<BackendId> {
    let mut out: Vec<BackendId> = Vec::with_capacity(ids.len());
    for id in ids {
        if id.trim().is_empty() || out.iter().any(|existing| existing == id.as_str()) {
            continue;
        }
        out.push(BackendId::from(id));
    }
    out
}
