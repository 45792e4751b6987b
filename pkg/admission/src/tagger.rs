use anyhow::Result;
use tracing::{debug, info};

use crate::object::GovernedObject;
use crate::resolver::{Ownership, QuotaResolver};

/// Defaulting phase: stamps ownership onto governed objects.
#[derive(Clone)]
pub struct Tagger {
    resolver: QuotaResolver,
}

impl Tagger {
    pub fn new(resolver: QuotaResolver) -> Self {
        Self { resolver }
    }

    /// Tag `object` with its owning ProjectQuota, if any.
    ///
    /// Objects without an owner are left as they are, including any tag
    /// from an earlier admission (tags are sticky).
    pub async fn tag(&self, object: &mut GovernedObject) -> Result<Option<Ownership>> {
        let policy = object.kind().policy();
        let namespace = object.metadata().namespace.clone();

        let Some(owner) = self.resolver.resolve(&namespace, policy.dimension).await? else {
            debug!(
                "{} {}/{} has no project quota owner",
                policy.kind,
                namespace,
                object.metadata().name
            );
            return Ok(None);
        };

        policy.write_tag(object.metadata_mut(), &owner);
        info!(
            "Tagged {} {}/{} with project quota {} ({})",
            policy.kind,
            namespace,
            object.metadata().name,
            owner.quota,
            policy.channel_name()
        );
        Ok(Some(owner))
    }
}
