use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::source::QuotaSource;

/// The ProjectQuota that owns an object, and the namespace that matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub quota: String,
    pub namespace: String,
}

/// Finds the ProjectQuota that a namespace belongs to for a given dimension.
#[derive(Clone)]
pub struct QuotaResolver {
    source: Arc<dyn QuotaSource>,
    strict: bool,
}

impl QuotaResolver {
    pub fn new(source: Arc<dyn QuotaSource>) -> Self {
        Self {
            source,
            strict: false,
        }
    }

    /// With strict ownership, a namespace claimed by more than one live
    /// ProjectQuota fails resolution instead of going to the first match.
    pub fn with_strict_ownership(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve the owner of objects of `dimension` in `namespace`.
    ///
    /// Records pending deletion are skipped. The first remaining record (in
    /// listing order) that lists the namespace decides: it owns the object if
    /// it declares a hard limit for `dimension`, otherwise the object is
    /// untracked even if a later record would track it.
    pub async fn resolve(&self, namespace: &str, dimension: &str) -> Result<Option<Ownership>> {
        let quotas = self
            .source
            .list()
            .await
            .context("failed to list project quotas")?;

        let mut claimants = quotas
            .iter()
            .filter(|pq| !pq.deletion_requested() && pq.claims_namespace(namespace));

        let Some(owner) = claimants.next() else {
            debug!("Namespace {} belongs to no project quota", namespace);
            return Ok(None);
        };

        let others: Vec<&str> = claimants.map(|pq| pq.name()).collect();
        if !others.is_empty() {
            if self.strict {
                bail!(
                    "namespace {} is claimed by multiple project quotas: {}, {}",
                    namespace,
                    owner.name(),
                    others.join(", ")
                );
            }
            warn!(
                "Namespace {} is claimed by multiple project quotas ({}, {}); using {}",
                namespace,
                owner.name(),
                others.join(", "),
                owner.name()
            );
        }

        if !owner.tracks(dimension) {
            debug!(
                "Project quota {} does not track {}, namespace {} opts out",
                owner.name(),
                dimension,
                namespace
            );
            return Ok(None);
        }

        Ok(Some(Ownership {
            quota: owner.name().to_string(),
            namespace: namespace.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryQuotaSource;
    use chrono::Utc;
    use pkg_types::meta::ObjectMeta;
    use pkg_types::project_quota::ProjectQuota;
    use pkg_types::quantity::Quantity;
    use pkg_types::resource::{RESOURCE_PERSISTENT_VOLUME_CLAIMS, RESOURCE_SECRETS};

    fn pq(name: &str, namespaces: &[&str], tracked: &[&str]) -> ProjectQuota {
        let mut pq = ProjectQuota {
            metadata: ObjectMeta::named(name),
            ..Default::default()
        };
        pq.spec.namespaces = namespaces.iter().map(|s| s.to_string()).collect();
        for dimension in tracked {
            pq.spec.hard.insert(dimension.to_string(), Quantity::from_count(10));
        }
        pq
    }

    fn resolver(quotas: Vec<ProjectQuota>) -> QuotaResolver {
        QuotaResolver::new(Arc::new(MemoryQuotaSource::new(quotas)))
    }

    #[tokio::test]
    async fn resolves_single_owner() {
        let r = resolver(vec![
            pq("p0", &["other"], &[RESOURCE_SECRETS]),
            pq("p1", &["team-a", "team-b"], &[RESOURCE_SECRETS]),
        ]);
        let owner = r.resolve("team-b", RESOURCE_SECRETS).await.unwrap();
        assert_eq!(
            owner,
            Some(Ownership {
                quota: "p1".to_string(),
                namespace: "team-b".to_string()
            })
        );
    }

    #[tokio::test]
    async fn unlisted_namespace_has_no_owner() {
        let r = resolver(vec![pq("p1", &["team-a"], &[RESOURCE_SECRETS])]);
        assert_eq!(r.resolve("team-z", RESOURCE_SECRETS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn untracked_dimension_stops_at_first_match() {
        // p1 claims the namespace but does not track claims; p2 would, but
        // the first match decides.
        let r = resolver(vec![
            pq("p1", &["team-a"], &[RESOURCE_SECRETS]),
            pq("p2", &["team-a"], &[RESOURCE_PERSISTENT_VOLUME_CLAIMS]),
        ]);
        assert_eq!(
            r.resolve("team-a", RESOURCE_PERSISTENT_VOLUME_CLAIMS).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn deleting_records_are_skipped() {
        let mut deleting = pq("p1", &["team-a"], &[RESOURCE_SECRETS]);
        deleting.metadata.deletion_timestamp = Some(Utc::now());
        let r = resolver(vec![deleting, pq("p2", &["team-a"], &[RESOURCE_SECRETS])]);

        let owner = r.resolve("team-a", RESOURCE_SECRETS).await.unwrap().unwrap();
        assert_eq!(owner.quota, "p2");
    }

    #[tokio::test]
    async fn duplicate_claims_first_match_wins_by_default() {
        let r = resolver(vec![
            pq("p2", &["team-a"], &[RESOURCE_SECRETS]),
            pq("p1", &["team-a"], &[RESOURCE_SECRETS]),
        ]);
        let owner = r.resolve("team-a", RESOURCE_SECRETS).await.unwrap().unwrap();
        assert_eq!(owner.quota, "p2");
    }

    #[tokio::test]
    async fn duplicate_claims_fail_in_strict_mode() {
        let r = resolver(vec![
            pq("p1", &["team-a"], &[RESOURCE_SECRETS]),
            pq("p2", &["team-a"], &[]),
        ])
        .with_strict_ownership(true);
        let err = r.resolve("team-a", RESOURCE_SECRETS).await.unwrap_err();
        assert!(err.to_string().contains("p1, p2"), "{}", err);

        // Unambiguous namespaces still resolve.
        let r = resolver(vec![pq("p1", &["team-a"], &[RESOURCE_SECRETS])]).with_strict_ownership(true);
        assert!(r.resolve("team-a", RESOURCE_SECRETS).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn listing_failure_propagates() {
        let source = Arc::new(MemoryQuotaSource::new(vec![]));
        source.set_unavailable(true);
        let r = QuotaResolver::new(source);
        assert!(r.resolve("team-a", RESOURCE_SECRETS).await.is_err());
    }
}
