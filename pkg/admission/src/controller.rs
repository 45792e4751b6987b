use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::enforcer::Enforcer;
use crate::object::AdmissionObject;
use crate::project_quota::validate_project_quota;
use crate::resolver::QuotaResolver;
use crate::source::QuotaSource;
use crate::tagger::Tagger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Outcome of a policy check. Infrastructure failures are `Err`, not `Denied`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(String),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Allowed => None,
            Verdict::Denied(reason) => Some(reason),
        }
    }
}

/// Entry points for both admission phases, for every kind.
///
/// Holds no per-request state; the mutating and validating calls for one
/// object are independent and may interleave with other requests.
#[derive(Clone)]
pub struct AdmissionController {
    tagger: Tagger,
    enforcer: Enforcer,
}

impl AdmissionController {
    pub fn new(source: Arc<dyn QuotaSource>, strict_ownership: bool) -> Self {
        let resolver = QuotaResolver::new(source.clone()).with_strict_ownership(strict_ownership);
        Self {
            tagger: Tagger::new(resolver),
            enforcer: Enforcer::new(source),
        }
    }

    /// Mutating phase. Returns true when an ownership tag was written.
    pub async fn mutate(&self, operation: Operation, object: &mut AdmissionObject) -> Result<bool> {
        if operation == Operation::Delete {
            return Ok(false);
        }
        match object {
            AdmissionObject::Governed(governed) => Ok(self.tagger.tag(governed).await?.is_some()),
            AdmissionObject::ProjectQuota(_) => Ok(false),
        }
    }

    /// Validating phase.
    pub async fn validate(
        &self,
        operation: Operation,
        object: &AdmissionObject,
        old_object: Option<&AdmissionObject>,
    ) -> Result<Verdict> {
        match object {
            AdmissionObject::Governed(governed) => self.enforcer.enforce(operation, governed).await,
            AdmissionObject::ProjectQuota(pq) => Ok(validate_project_quota(
                operation,
                old_object.and_then(AdmissionObject::as_project_quota),
                pq,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::GovernedKind;
    use crate::object::GovernedObject;
    use crate::source::MemoryQuotaSource;
    use pkg_constants::quota::PROJECT_QUOTA_KEY;
    use pkg_types::meta::ObjectMeta;
    use pkg_types::project_quota::ProjectQuota;
    use pkg_types::quantity::Quantity;
    use pkg_types::resource::{RESOURCE_CPU, RESOURCE_PERSISTENT_VOLUME_CLAIMS, RESOURCE_SECRETS};
    use pkg_types::governed::{PersistentVolumeClaim, Secret};

    fn p1(dimension: &str, hard: u64, used: u64) -> ProjectQuota {
        let mut pq = ProjectQuota {
            metadata: ObjectMeta::named("p1"),
            ..Default::default()
        };
        pq.spec.namespaces.push("team-a".to_string());
        pq.spec.hard.insert(dimension.to_string(), Quantity::from_count(hard));
        pq.status.used.insert(dimension.to_string(), Quantity::from_count(used));
        pq
    }

    fn secret_in(namespace: &str) -> AdmissionObject {
        AdmissionObject::Governed(GovernedObject::Secret(Secret {
            metadata: ObjectMeta::namespaced(namespace, "creds"),
            ..Default::default()
        }))
    }

    fn pvc_in(namespace: &str) -> AdmissionObject {
        AdmissionObject::Governed(GovernedObject::PersistentVolumeClaim(PersistentVolumeClaim {
            metadata: ObjectMeta::namespaced(namespace, "data"),
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn full_secret_quota_rejects_new_secret() {
        let controller =
            AdmissionController::new(Arc::new(MemoryQuotaSource::new(vec![p1(RESOURCE_SECRETS, 2, 2)])), false);

        let mut obj = secret_in("team-a");
        assert!(controller.mutate(Operation::Create, &mut obj).await.unwrap());
        assert_eq!(obj.metadata().label(PROJECT_QUOTA_KEY), Some("p1"));

        let verdict = controller.validate(Operation::Create, &obj, None).await.unwrap();
        let reason = verdict.reason().unwrap();
        assert!(reason.contains("secrets used 2, hard limit 2"), "{}", reason);
    }

    #[tokio::test]
    async fn secret_outside_every_project_is_admitted() {
        let controller =
            AdmissionController::new(Arc::new(MemoryQuotaSource::new(vec![p1(RESOURCE_SECRETS, 2, 2)])), false);

        let mut obj = secret_in("elsewhere");
        assert!(!controller.mutate(Operation::Create, &mut obj).await.unwrap());
        assert!(obj.metadata().labels.is_none());
        assert!(controller
            .validate(Operation::Create, &obj, None)
            .await
            .unwrap()
            .is_allowed());
    }

    #[tokio::test]
    async fn claim_with_room_passes_both_phases() {
        let controller = AdmissionController::new(
            Arc::new(MemoryQuotaSource::new(vec![p1(RESOURCE_PERSISTENT_VOLUME_CLAIMS, 5, 4)])),
            false,
        );
        let mut obj = pvc_in("team-a");
        controller.mutate(Operation::Create, &mut obj).await.unwrap();
        assert_eq!(obj.kind(), crate::kind::ResourceKind::Governed(GovernedKind::PersistentVolumeClaim));
        assert_eq!(
            controller.validate(Operation::Create, &obj, None).await.unwrap(),
            Verdict::Allowed
        );
    }

    #[tokio::test]
    async fn untagged_claim_outside_projects_is_rejected() {
        let controller = AdmissionController::new(Arc::new(MemoryQuotaSource::new(vec![])), false);
        let mut obj = pvc_in("team-a");
        controller.mutate(Operation::Create, &mut obj).await.unwrap();
        assert!(!controller
            .validate(Operation::Create, &obj, None)
            .await
            .unwrap()
            .is_allowed());
    }

    #[tokio::test]
    async fn delete_skips_both_phases() {
        let source = Arc::new(MemoryQuotaSource::new(vec![p1(RESOURCE_SECRETS, 0, 5)]));
        source.set_unavailable(true);
        let controller = AdmissionController::new(source, false);

        let mut obj = pvc_in("team-a");
        assert!(!controller.mutate(Operation::Delete, &mut obj).await.unwrap());
        assert!(controller
            .validate(Operation::Delete, &obj, None)
            .await
            .unwrap()
            .is_allowed());
    }

    #[tokio::test]
    async fn project_quota_update_checked_against_usage() {
        let controller = AdmissionController::new(Arc::new(MemoryQuotaSource::new(vec![])), false);
        let old = AdmissionObject::ProjectQuota(p1(RESOURCE_CPU, 10, 6));

        let mut exact = p1(RESOURCE_CPU, 6, 6);
        let mut obj = AdmissionObject::ProjectQuota(exact.clone());
        assert!(!controller.mutate(Operation::Update, &mut obj).await.unwrap());
        assert!(controller
            .validate(Operation::Update, &obj, Some(&old))
            .await
            .unwrap()
            .is_allowed());

        exact.spec.hard.insert(RESOURCE_CPU.to_string(), Quantity::from_count(5));
        let below = AdmissionObject::ProjectQuota(exact);
        assert!(!controller
            .validate(Operation::Update, &below, Some(&old))
            .await
            .unwrap()
            .is_allowed());
    }
}
