//! In-memory [`QuotaSource`] for tests, built with the `test-util` feature.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pkg_types::project_quota::ProjectQuota;

use crate::source::QuotaSource;

/// Vector-backed source preserving insertion order, with switchable failure.
#[derive(Default)]
pub struct MemoryQuotaSource {
    quotas: Mutex<Vec<ProjectQuota>>,
    unavailable: AtomicBool,
    list_calls: AtomicUsize,
}

impl MemoryQuotaSource {
    pub fn new(quotas: Vec<ProjectQuota>) -> Self {
        Self {
            quotas: Mutex::new(quotas),
            ..Default::default()
        }
    }

    /// Insert or replace by name, keeping the position of a replaced record.
    pub fn upsert(&self, pq: ProjectQuota) {
        let mut quotas = self.quotas.lock().unwrap_or_else(|e| e.into_inner());
        match quotas.iter_mut().find(|q| q.name() == pq.name()) {
            Some(existing) => *existing = pq,
            None => quotas.push(pq),
        }
    }

    pub fn remove(&self, name: &str) {
        let mut quotas = self.quotas.lock().unwrap_or_else(|e| e.into_inner());
        quotas.retain(|q| q.name() != name);
    }

    /// Make every read fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("project quota store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl QuotaSource for MemoryQuotaSource {
    async fn list(&self) -> Result<Vec<ProjectQuota>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.quotas.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn get(&self, name: &str) -> Result<Option<ProjectQuota>> {
        self.check_available()?;
        let quotas = self.quotas.lock().unwrap_or_else(|e| e.into_inner());
        Ok(quotas.iter().find(|q| q.name() == name).cloned())
    }
}
