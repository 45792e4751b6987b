use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;
use crate::quantity::Quantity;
use crate::resource::{ResourceList, quantity_or_zero};
use crate::validate::{validate_name, validate_qualified_name};

/// Cluster-scoped quota shared by a group of namespaces (a "project").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectQuota {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ProjectQuotaSpec,
    #[serde(default)]
    pub status: ProjectQuotaStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectQuotaSpec {
    /// Namespaces belonging to the project, in declaration order.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Ceiling per dimension. A dimension without an entry is untracked.
    #[serde(default)]
    pub hard: ResourceList,
}

/// Written only by the accounting controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectQuotaStatus {
    #[serde(default)]
    pub used: ResourceList,
}

impl ProjectQuota {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Records pending removal must not gain new members.
    pub fn deletion_requested(&self) -> bool {
        self.metadata.is_deleting()
    }

    pub fn claims_namespace(&self, namespace: &str) -> bool {
        self.spec.namespaces.iter().any(|ns| ns == namespace)
    }

    pub fn tracks(&self, dimension: &str) -> bool {
        self.spec.hard.contains_key(dimension)
    }

    pub fn hard(&self, dimension: &str) -> Quantity {
        quantity_or_zero(&self.spec.hard, dimension)
    }

    pub fn used(&self, dimension: &str) -> Quantity {
        quantity_or_zero(&self.status.used, dimension)
    }

    /// Structural checks applied before a record is written to the store.
    pub fn validate(&self) -> Result<()> {
        validate_name(self.name())?;
        for ns in &self.spec.namespaces {
            validate_name(ns)?;
        }
        for finalizer in &self.metadata.finalizers {
            validate_qualified_name(finalizer)?;
        }
        for (dimension, quantity) in self.spec.hard.iter().chain(&self.status.used) {
            validate_qualified_name(dimension)?;
            if quantity.is_negative() {
                bail!("quantity for '{}' must not be negative (got {})", dimension, quantity);
            }
        }
        Ok(())
    }
}
