use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use pkg_constants::state::PROJECT_QUOTA_PREFIX;
use pkg_state::client::StateStore;
use pkg_state::watch::EventLog;
use pkg_types::project_quota::ProjectQuota;

#[cfg(any(test, feature = "test-util"))]
pub use crate::memory::MemoryQuotaSource;

/// Read access to ProjectQuota records.
///
/// Every read is a recent snapshot, not necessarily the latest one.
#[async_trait]
pub trait QuotaSource: Send + Sync {
    /// All records, in the order the backing store yields them.
    async fn list(&self) -> Result<Vec<ProjectQuota>>;

    async fn get(&self, name: &str) -> Result<Option<ProjectQuota>>;
}

// ─── SlateDB-backed source ──────────────────────────────────────────────

/// ProjectQuota records stored under `/registry/projectquotas/{name}`.
#[derive(Clone)]
pub struct ProjectQuotaStore {
    store: StateStore,
    writes: Arc<Mutex<()>>,
}

impl ProjectQuotaStore {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Serializes read-modify-write cycles across every clone of this store.
    /// Hold the guard from the read until the write lands.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    pub fn key(name: &str) -> String {
        format!("{}{}", PROJECT_QUOTA_PREFIX, name)
    }

    pub fn event_log(&self) -> &EventLog {
        &self.store.event_log
    }

    pub async fn save(&self, pq: &ProjectQuota) -> Result<()> {
        let data = serde_json::to_vec(pq)?;
        self.store.put(&Self::key(pq.name()), &data).await
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        self.store.delete(&Self::key(name)).await
    }
}

#[async_trait]
impl QuotaSource for ProjectQuotaStore {
    async fn list(&self) -> Result<Vec<ProjectQuota>> {
        let entries = self.store.list_prefix(PROJECT_QUOTA_PREFIX).await?;
        entries
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_slice(&value).with_context(|| format!("corrupt record at {}", key))
            })
            .collect()
    }

    async fn get(&self, name: &str) -> Result<Option<ProjectQuota>> {
        let key = Self::key(name);
        match self.store.get(&key).await? {
            Some(data) => {
                let pq = serde_json::from_slice(&data)
                    .with_context(|| format!("corrupt record at {}", key))?;
                Ok(Some(pq))
            }
            None => Ok(None),
        }
    }
}

// ─── Cached listing ─────────────────────────────────────────────────────

/// Caches the full listing of an inner source until a ProjectQuota key changes.
///
/// `get` always reads through, so enforcement sees the freshest `used`.
pub struct CachedQuotaSource {
    inner: Arc<dyn QuotaSource>,
    state: Arc<CacheState>,
}

struct CacheState {
    listing: RwLock<Option<Vec<ProjectQuota>>>,
    /// Bumped on every invalidation; a reload started under an older
    /// generation must not populate the cache.
    generation: AtomicU64,
}

impl CacheState {
    async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.listing.write().await = None;
    }
}

impl CachedQuotaSource {
    /// Wrap `inner` and start invalidating on ProjectQuota events from `events`.
    pub fn new(inner: Arc<dyn QuotaSource>, events: &EventLog) -> Self {
        let state = Arc::new(CacheState {
            listing: RwLock::new(None),
            generation: AtomicU64::new(0),
        });

        let mut rx = events.subscribe();
        let watcher = state.clone();
        tokio::spawn(async move {
            info!("ProjectQuota listing cache started");
            loop {
                match rx.recv().await {
                    Ok(event) if event.key.starts_with(PROJECT_QUOTA_PREFIX) => {
                        debug!("Invalidating ProjectQuota cache ({} #{})", event.key, event.seq);
                        watcher.invalidate().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("ProjectQuota cache lagged by {} events, invalidating", skipped);
                        watcher.invalidate().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { inner, state }
    }
}

#[async_trait]
impl QuotaSource for CachedQuotaSource {
    async fn list(&self) -> Result<Vec<ProjectQuota>> {
        if let Some(listing) = self.state.listing.read().await.as_ref() {
            return Ok(listing.clone());
        }

        let generation = self.state.generation.load(Ordering::SeqCst);
        let listing = self.inner.list().await?;
        let mut cached = self.state.listing.write().await;
        if self.state.generation.load(Ordering::SeqCst) == generation {
            *cached = Some(listing.clone());
        }
        Ok(listing)
    }

    async fn get(&self, name: &str) -> Result<Option<ProjectQuota>> {
        self.inner.get(name).await
    }
}
