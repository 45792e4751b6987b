pub mod handlers;
pub mod request_id;
pub mod review;
pub mod server;

use std::sync::Arc;

use pkg_admission::AdmissionController;
use pkg_admission::source::{CachedQuotaSource, ProjectQuotaStore, QuotaSource};

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub quotas: ProjectQuotaStore,
    pub admission: AdmissionController,
}

impl AppState {
    /// With `resolver_cache`, owner resolution reads a listing that is
    /// invalidated from the store's watch event log.
    pub fn new(quotas: ProjectQuotaStore, resolver_cache: bool, strict_ownership: bool) -> Self {
        let store: Arc<dyn QuotaSource> = Arc::new(quotas.clone());
        let source: Arc<dyn QuotaSource> = if resolver_cache {
            Arc::new(CachedQuotaSource::new(store, quotas.event_log()))
        } else {
            store
        };
        Self {
            quotas,
            admission: AdmissionController::new(source, strict_ownership),
        }
    }
}
