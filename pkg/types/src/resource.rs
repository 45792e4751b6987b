//! Resource dimension names tracked by project quotas.

use std::collections::BTreeMap;

use crate::quantity::Quantity;

/// Dimension name to quantity, as used by `hard` and `used`.
pub type ResourceList = BTreeMap<String, Quantity>;

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_STORAGE: &str = "storage";
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";
pub const RESOURCE_PODS: &str = "pods";
pub const RESOURCE_SERVICES: &str = "services";
pub const RESOURCE_REPLICATION_CONTROLLERS: &str = "replicationcontrollers";
pub const RESOURCE_QUOTAS: &str = "resourcequotas";
pub const RESOURCE_SECRETS: &str = "secrets";
pub const RESOURCE_CONFIG_MAPS: &str = "configmaps";
pub const RESOURCE_PERSISTENT_VOLUME_CLAIMS: &str = "persistentvolumeclaims";
pub const RESOURCE_SERVICES_NODE_PORTS: &str = "services.nodeports";
pub const RESOURCE_SERVICES_LOAD_BALANCERS: &str = "services.loadbalancers";
pub const RESOURCE_REQUESTS_CPU: &str = "requests.cpu";
pub const RESOURCE_REQUESTS_MEMORY: &str = "requests.memory";
pub const RESOURCE_REQUESTS_STORAGE: &str = "requests.storage";
pub const RESOURCE_REQUESTS_EPHEMERAL_STORAGE: &str = "requests.ephemeral-storage";
pub const RESOURCE_LIMITS_CPU: &str = "limits.cpu";
pub const RESOURCE_LIMITS_MEMORY: &str = "limits.memory";
pub const RESOURCE_LIMITS_EPHEMERAL_STORAGE: &str = "limits.ephemeral-storage";

/// Every dimension a ProjectQuota update is checked against, in check order.
pub const TRACKED_RESOURCES: [&str; 20] = [
    RESOURCE_CPU,
    RESOURCE_MEMORY,
    RESOURCE_STORAGE,
    RESOURCE_EPHEMERAL_STORAGE,
    RESOURCE_PODS,
    RESOURCE_SERVICES,
    RESOURCE_REPLICATION_CONTROLLERS,
    RESOURCE_QUOTAS,
    RESOURCE_SECRETS,
    RESOURCE_CONFIG_MAPS,
    RESOURCE_PERSISTENT_VOLUME_CLAIMS,
    RESOURCE_SERVICES_NODE_PORTS,
    RESOURCE_SERVICES_LOAD_BALANCERS,
    RESOURCE_REQUESTS_CPU,
    RESOURCE_REQUESTS_MEMORY,
    RESOURCE_REQUESTS_STORAGE,
    RESOURCE_REQUESTS_EPHEMERAL_STORAGE,
    RESOURCE_LIMITS_CPU,
    RESOURCE_LIMITS_MEMORY,
    RESOURCE_LIMITS_EPHEMERAL_STORAGE,
];

/// Look up a dimension, treating an absent key as zero.
pub fn quantity_or_zero(list: &ResourceList, dimension: &str) -> Quantity {
    list.get(dimension).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tracked_table_has_no_duplicates() {
        let unique: HashSet<_> = TRACKED_RESOURCES.iter().collect();
        assert_eq!(unique.len(), TRACKED_RESOURCES.len());
    }

    #[test]
    fn missing_dimension_reads_as_zero() {
        let mut list = ResourceList::new();
        list.insert(RESOURCE_SECRETS.to_string(), Quantity::from_count(3));
        assert_eq!(quantity_or_zero(&list, RESOURCE_SECRETS), Quantity::from_count(3));
        assert!(quantity_or_zero(&list, RESOURCE_PODS).is_zero());
    }
}
