use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tracing::{debug, warn};

use pkg_constants::quota::PROJECT_QUOTA_KEY;

use crate::controller::{Operation, Verdict};
use crate::kind::MissingTagPolicy;
use crate::object::GovernedObject;
use crate::source::QuotaSource;

/// Validating phase: checks a tagged object against its ProjectQuota.
#[derive(Clone)]
pub struct Enforcer {
    source: Arc<dyn QuotaSource>,
}

impl Enforcer {
    pub fn new(source: Arc<dyn QuotaSource>) -> Self {
        Self { source }
    }

    /// Admit while recorded usage is strictly below the hard limit.
    ///
    /// The object under review is assumed to be counted by the accounting
    /// controller already, so `used == hard` means the quota is full.
    /// A ProjectQuota that vanished after tagging is an error, not a denial.
    pub async fn enforce(&self, operation: Operation, object: &GovernedObject) -> Result<Verdict> {
        if operation == Operation::Delete {
            return Ok(Verdict::Allowed);
        }

        let policy = object.kind().policy();
        let meta = object.metadata();

        let Some(quota_name) = policy.read_quota_tag(meta) else {
            return Ok(match policy.missing_tag {
                MissingTagPolicy::Admit => {
                    debug!("{} {}/{} is untagged, admitting", policy.kind, meta.namespace, meta.name);
                    Verdict::Allowed
                }
                MissingTagPolicy::Reject => {
                    let reason = format!("missing {} {}", policy.channel_name(), PROJECT_QUOTA_KEY);
                    warn!("Rejecting {} {}/{}: {}", policy.kind, meta.namespace, meta.name, reason);
                    Verdict::Denied(reason)
                }
            });
        };

        let pq = self
            .source
            .get(quota_name)
            .await
            .with_context(|| format!("failed to fetch project quota {}", quota_name))?
            .ok_or_else(|| anyhow!("project quota {} not found", quota_name))?;

        let hard = pq.hard(policy.dimension);
        let used = pq.used(policy.dimension);
        if hard > used {
            debug!(
                "Admitting {} {}/{} under project quota {} ({} {}/{})",
                policy.kind, meta.namespace, meta.name, quota_name, policy.dimension, used, hard
            );
            return Ok(Verdict::Allowed);
        }

        let reason = format!(
            "over project quota {}: {} used {}, hard limit {}",
            quota_name, policy.dimension, used, hard
        );
        warn!("Rejecting {} {}/{}: {}", policy.kind, meta.namespace, meta.name, reason);
        Ok(Verdict::Denied(reason))
    }
}
