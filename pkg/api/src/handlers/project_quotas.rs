use axum::{
    Json,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use pkg_admission::source::QuotaSource;
use pkg_admission::{AdmissionObject, Operation, Verdict};
use pkg_types::project_quota::{ProjectQuota, ProjectQuotaStatus};

use crate::AppState;

pub async fn list_project_quotas(State(state): State<AppState>) -> impl IntoResponse {
    match state.quotas.list().await {
        Ok(quotas) => (StatusCode::OK, Json(quotas)).into_response(),
        Err(e) => {
            warn!("Failed to list project quotas: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn get_project_quota(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> impl IntoResponse {
    match load(&state, &name).await {
        Ok(pq) => (StatusCode::OK, Json(pq)).into_response(),
        Err(rsp) => rsp,
    }
}

pub async fn create_project_quota(
    State(state): State<AppState>,
    Json(mut pq): Json<ProjectQuota>,
) -> impl IntoResponse {
    if let Err(e) = pq.validate() {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    let _writes = state.quotas.lock_writes().await;
    match state.quotas.get(pq.name()).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                format!("project quota {} already exists", pq.name()),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            warn!("Failed to read project quota {}: {:#}", pq.name(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    pq.metadata.namespace.clear();
    pq.metadata.creation_timestamp = Some(Utc::now());
    pq.metadata.deletion_timestamp = None;
    if let Err(rsp) = save(&state, &pq).await {
        return rsp;
    }
    info!("Created project quota {}", pq.name());
    (StatusCode::CREATED, Json(pq)).into_response()
}

/// Replace spec, labels, annotations and finalizers. Recorded usage is kept.
pub async fn update_project_quota(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Json(body): Json<ProjectQuota>,
) -> impl IntoResponse {
    let _writes = state.quotas.lock_writes().await;
    let existing = match load(&state, &name).await {
        Ok(pq) => pq,
        Err(rsp) => return rsp,
    };

    let mut updated = existing.clone();
    updated.spec = body.spec;
    updated.metadata.labels = body.metadata.labels;
    updated.metadata.annotations = body.metadata.annotations;
    updated.metadata.finalizers = body.metadata.finalizers;
    if let Err(e) = updated.validate() {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    let verdict = state
        .admission
        .validate(
            Operation::Update,
            &AdmissionObject::ProjectQuota(updated.clone()),
            Some(&AdmissionObject::ProjectQuota(existing)),
        )
        .await;
    match verdict {
        Ok(Verdict::Allowed) => {}
        Ok(Verdict::Denied(reason)) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, reason).into_response();
        }
        Err(e) => {
            warn!("Failed to validate project quota {}: {:#}", name, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    if updated.deletion_requested() && updated.metadata.finalizers.is_empty() {
        return remove(&state, &name).await;
    }
    if let Err(rsp) = save(&state, &updated).await {
        return rsp;
    }
    info!("Updated project quota {}", name);
    (StatusCode::OK, Json(updated)).into_response()
}

/// Written by the usage accounting controller.
pub async fn update_project_quota_status(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Json(status): Json<ProjectQuotaStatus>,
) -> impl IntoResponse {
    let _writes = state.quotas.lock_writes().await;
    let mut pq = match load(&state, &name).await {
        Ok(pq) => pq,
        Err(rsp) => return rsp,
    };
    pq.status = status;
    if let Err(e) = pq.validate() {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    if let Err(rsp) = save(&state, &pq).await {
        return rsp;
    }
    (StatusCode::OK, Json(pq)).into_response()
}

pub async fn delete_project_quota(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> impl IntoResponse {
    let _writes = state.quotas.lock_writes().await;
    let mut pq = match load(&state, &name).await {
        Ok(pq) => pq,
        Err(rsp) => return rsp,
    };
    if pq.metadata.finalizers.is_empty() {
        return remove(&state, &name).await;
    }

    if !pq.deletion_requested() {
        pq.metadata.deletion_timestamp = Some(Utc::now());
        if let Err(rsp) = save(&state, &pq).await {
            return rsp;
        }
        info!(
            "Project quota {} marked for deletion, waiting on finalizers {:?}",
            name, pq.metadata.finalizers
        );
    }
    (StatusCode::ACCEPTED, Json(pq)).into_response()
}

async fn load(state: &AppState, name: &str) -> Result<ProjectQuota, Response> {
    match state.quotas.get(name).await {
        Ok(Some(pq)) => Ok(pq),
        Ok(None) => Err(StatusCode::NOT_FOUND.into_response()),
        Err(e) => {
            warn!("Failed to read project quota {}: {:#}", name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

async fn save(state: &AppState, pq: &ProjectQuota) -> Result<(), Response> {
    state.quotas.save(pq).await.map_err(|e| {
        warn!("Failed to store project quota {}: {:#}", pq.name(), e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store project quota").into_response()
    })
}

async fn remove(state: &AppState, name: &str) -> Response {
    match state.quotas.remove(name).await {
        Ok(()) => {
            info!("Deleted project quota {}", name);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!("Failed to delete project quota {}: {:#}", name, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_admission::source::ProjectQuotaStore;
    use pkg_state::client::StateStore;
    use pkg_types::quantity::Quantity;
    use serde_json::json;

    async fn state(dir: &tempfile::TempDir) -> AppState {
        let store = StateStore::new(dir.path().to_str().unwrap()).await.unwrap();
        AppState::new(ProjectQuotaStore::new(store), false, false)
    }

    fn p1() -> ProjectQuota {
        serde_json::from_value(json!({
            "metadata": {"name": "p1"},
            "spec": {"namespaces": ["team-a"], "hard": {"cpu": "10"}}
        }))
        .unwrap()
    }

    async fn text(rsp: Response) -> String {
        let bytes = axum::body::to_bytes(rsp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn create(state: &AppState, pq: ProjectQuota) -> Response {
        create_project_quota(State(state.clone()), Json(pq))
            .await
            .into_response()
    }

    async fn set_used(state: &AppState, cpu: &str) {
        let status: ProjectQuotaStatus =
            serde_json::from_value(json!({"used": {"cpu": cpu}})).unwrap();
        let rsp = update_project_quota_status(State(state.clone()), AxumPath("p1".to_string()), Json(status))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_get_and_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;

        assert_eq!(create(&state, p1()).await.status(), StatusCode::CREATED);
        assert_eq!(create(&state, p1()).await.status(), StatusCode::CONFLICT);

        let rsp = get_project_quota(State(state.clone()), AxumPath("p1".to_string()))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::OK);
        let stored: ProjectQuota = serde_json::from_str(&text(rsp).await).unwrap();
        assert!(stored.metadata.creation_timestamp.is_some());
        assert!(stored.claims_namespace("team-a"));

        let rsp = get_project_quota(State(state), AxumPath("nope".to_string()))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_rejects_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;

        let mut bad_name = p1();
        bad_name.metadata.name = "Not_Valid".to_string();
        assert_eq!(create(&state, bad_name).await.status(), StatusCode::BAD_REQUEST);

        let mut negative = p1();
        negative.spec.hard.insert("cpu".to_string(), "-1".parse::<Quantity>().unwrap());
        assert_eq!(create(&state, negative).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_below_usage_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        create(&state, p1()).await;
        set_used(&state, "6").await;

        let mut lowered = p1();
        lowered.spec.hard.insert("cpu".to_string(), Quantity::from_count(5));
        let rsp = update_project_quota(State(state.clone()), AxumPath("p1".to_string()), Json(lowered))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(text(rsp).await, "hard limit 5 for cpu is less than used 6");

        let mut exact = p1();
        exact.spec.hard.insert("cpu".to_string(), Quantity::from_count(6));
        let rsp = update_project_quota(State(state), AxumPath("p1".to_string()), Json(exact))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn update_ignores_usage_in_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        create(&state, p1()).await;
        set_used(&state, "6").await;

        let mut body = p1();
        body.status.used.insert("cpu".to_string(), Quantity::from_count(0));
        body.spec.namespaces.push("team-b".to_string());
        let rsp = update_project_quota(State(state.clone()), AxumPath("p1".to_string()), Json(body))
            .await
            .into_response();
        let stored: ProjectQuota = serde_json::from_str(&text(rsp).await).unwrap();
        assert_eq!(stored.used("cpu"), Quantity::from_count(6));
        assert!(stored.claims_namespace("team-b"));
    }

    #[tokio::test]
    async fn concurrent_spec_and_status_updates_both_land() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        create(&state, p1()).await;

        for round in 1..=20u64 {
            let mut body = p1();
            body.spec.hard.insert("cpu".to_string(), Quantity::from_count(100 + round));
            let status: ProjectQuotaStatus =
                serde_json::from_value(json!({"used": {"cpu": round}})).unwrap();

            let (spec_rsp, status_rsp) = tokio::join!(
                update_project_quota(State(state.clone()), AxumPath("p1".to_string()), Json(body)),
                update_project_quota_status(
                    State(state.clone()),
                    AxumPath("p1".to_string()),
                    Json(status)
                ),
            );
            assert_eq!(spec_rsp.into_response().status(), StatusCode::OK);
            assert_eq!(status_rsp.into_response().status(), StatusCode::OK);

            let stored = state.quotas.get("p1").await.unwrap().unwrap();
            assert_eq!(stored.hard("cpu"), Quantity::from_count(100 + round));
            assert_eq!(stored.used("cpu"), Quantity::from_count(round));
        }
    }

    #[tokio::test]
    async fn delete_without_finalizers_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        create(&state, p1()).await;

        let rsp = delete_project_quota(State(state.clone()), AxumPath("p1".to_string()))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::NO_CONTENT);
        assert!(state.quotas.get("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_with_finalizers_waits_for_them() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        let mut pq = p1();
        pq.metadata.finalizers.push("quota.k3rs.io/accounting".to_string());
        create(&state, pq.clone()).await;

        let rsp = delete_project_quota(State(state.clone()), AxumPath("p1".to_string()))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::ACCEPTED);
        let pending = state.quotas.get("p1").await.unwrap().unwrap();
        assert!(pending.deletion_requested());

        assert_eq!(state.quotas.list().await.unwrap().len(), 1);

        pq.metadata.finalizers.clear();
        let rsp = update_project_quota(State(state.clone()), AxumPath("p1".to_string()), Json(pq))
            .await
            .into_response();
        assert_eq!(rsp.status(), StatusCode::NO_CONTENT);
        assert!(state.quotas.get("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_all_records() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        create(&state, p1()).await;
        let mut p2 = p1();
        p2.metadata.name = "p2".to_string();
        create(&state, p2).await;

        let rsp = list_project_quotas(State(state)).await.into_response();
        let listed: Vec<ProjectQuota> = serde_json::from_str(&text(rsp).await).unwrap();
        let names: Vec<&str> = listed.iter().map(ProjectQuota::name).collect();
        assert_eq!(names, vec!["p1", "p2"]);
    }
}
