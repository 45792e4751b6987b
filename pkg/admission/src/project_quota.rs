use tracing::warn;

use pkg_types::project_quota::ProjectQuota;
use pkg_types::resource::TRACKED_RESOURCES;

use crate::controller::{Operation, Verdict};

/// Validate a ProjectQuota write against its own recorded usage.
///
/// Only updates are checked. A hard limit may equal usage but not drop below
/// it; dimensions missing from either map count as zero. The old record is
/// not consulted.
pub fn validate_project_quota(
    operation: Operation,
    _old: Option<&ProjectQuota>,
    new: &ProjectQuota,
) -> Verdict {
    if operation != Operation::Update {
        return Verdict::Allowed;
    }

    for dimension in TRACKED_RESOURCES {
        let hard = new.hard(dimension);
        let used = new.used(dimension);
        if hard < used {
            let reason = format!(
                "hard limit {} for {} is less than used {}",
                hard, dimension, used
            );
            warn!("Rejecting update of project quota {}: {}", new.name(), reason);
            return Verdict::Denied(reason);
        }
    }
    Verdict::Allowed
}
