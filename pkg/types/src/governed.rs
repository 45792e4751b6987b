//! Objects whose creation is charged against a ProjectQuota.
//!
//! Admission only reads and writes `metadata`; every other field is carried
//! in `rest` so the object goes back to the cluster exactly as it came in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::ObjectMeta;

/// Persistent Volume Claim, a request for storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolumeClaim {
    pub metadata: ObjectMeta,
    /// `apiVersion`, `kind`, `spec`, `status`, ...
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationController {
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Per-namespace quota object, itself counted against the project budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceQuota {
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub metadata: ObjectMeta,
    /// `type`, `data`, `stringData`, `immutable`
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}
