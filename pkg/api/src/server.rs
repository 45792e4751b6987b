use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::AppState;
use crate::handlers::{admission, project_quotas};
use crate::request_id::request_id_middleware;
use pkg_admission::source::ProjectQuotaStore;
use pkg_state::client::StateStore;

/// Server configuration passed from the binary's CLI.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: String,
    pub resolver_cache: bool,
    pub strict_namespace_ownership: bool,
}

pub fn router(state: AppState) -> Router {
    // Admission webhooks, one path per kind plural
    let webhooks = Router::new()
        .route("/mutate/{kind}", post(admission::mutate))
        .route("/validate/{kind}", post(admission::validate));

    // ProjectQuota records
    let api_routes = Router::new()
        .route(
            "/apis/v1/projectquotas",
            post(project_quotas::create_project_quota).get(project_quotas::list_project_quotas),
        )
        .route(
            "/apis/v1/projectquotas/{name}",
            get(project_quotas::get_project_quota)
                .put(project_quotas::update_project_quota)
                .delete(project_quotas::delete_project_quota),
        )
        .route(
            "/apis/v1/projectquotas/{name}/status",
            put(project_quotas::update_project_quota_status),
        );

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(webhooks)
        .merge(api_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let store = StateStore::new(&config.data_dir).await?;
    let state = AppState::new(
        ProjectQuotaStore::new(store.clone()),
        config.resolver_cache,
        config.strict_namespace_ownership,
    );
    if config.resolver_cache {
        info!("Resolver cache enabled");
    }
    if config.strict_namespace_ownership {
        info!("Strict namespace ownership enabled");
    }

    let app = router(state);

    info!("Starting admission server on {}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Admission server stopped, closing state store");
    store.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
