use serde_json::{Map, Value};

use pkg_types::governed::{PersistentVolumeClaim, ReplicationController, ResourceQuota, Secret};
use pkg_types::meta::ObjectMeta;
use pkg_types::project_quota::ProjectQuota;

use crate::kind::{GovernedKind, ResourceKind};

/// A decoded object of one of the governed kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum GovernedObject {
    PersistentVolumeClaim(PersistentVolumeClaim),
    ReplicationController(ReplicationController),
    ResourceQuota(ResourceQuota),
    Secret(Secret),
}

/// A decoded object routed to an admission entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionObject {
    Governed(GovernedObject),
    ProjectQuota(ProjectQuota),
}

impl GovernedObject {
    pub fn kind(&self) -> GovernedKind {
        match self {
            GovernedObject::PersistentVolumeClaim(_) => GovernedKind::PersistentVolumeClaim,
            GovernedObject::ReplicationController(_) => GovernedKind::ReplicationController,
            GovernedObject::ResourceQuota(_) => GovernedKind::ResourceQuota,
            GovernedObject::Secret(_) => GovernedKind::Secret,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            GovernedObject::PersistentVolumeClaim(o) => &o.metadata,
            GovernedObject::ReplicationController(o) => &o.metadata,
            GovernedObject::ResourceQuota(o) => &o.metadata,
            GovernedObject::Secret(o) => &o.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            GovernedObject::PersistentVolumeClaim(o) => &mut o.metadata,
            GovernedObject::ReplicationController(o) => &mut o.metadata,
            GovernedObject::ResourceQuota(o) => &mut o.metadata,
            GovernedObject::Secret(o) => &mut o.metadata,
        }
    }

    pub fn decode(kind: GovernedKind, value: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            GovernedKind::PersistentVolumeClaim => {
                GovernedObject::PersistentVolumeClaim(serde_json::from_value(value)?)
            }
            GovernedKind::ReplicationController => {
                GovernedObject::ReplicationController(serde_json::from_value(value)?)
            }
            GovernedKind::ResourceQuota => GovernedObject::ResourceQuota(serde_json::from_value(value)?),
            GovernedKind::Secret => GovernedObject::Secret(serde_json::from_value(value)?),
        })
    }
}

impl AdmissionObject {
    pub fn kind(&self) -> ResourceKind {
        match self {
            AdmissionObject::Governed(o) => ResourceKind::Governed(o.kind()),
            AdmissionObject::ProjectQuota(_) => ResourceKind::ProjectQuota,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            AdmissionObject::Governed(o) => o.metadata(),
            AdmissionObject::ProjectQuota(pq) => &pq.metadata,
        }
    }

    /// Decode `value` as the kind the request was routed to.
    pub fn decode(kind: ResourceKind, value: Value) -> serde_json::Result<Self> {
        match kind {
            ResourceKind::Governed(kind) => GovernedObject::decode(kind, value).map(AdmissionObject::Governed),
            ResourceKind::ProjectQuota => serde_json::from_value(value).map(AdmissionObject::ProjectQuota),
        }
    }

    /// Copy this object's labels and annotations onto `original`, the JSON
    /// it was decoded from. Every other field keeps its received form.
    pub fn write_tags_to(&self, original: &mut Value) -> serde_json::Result<()> {
        let Value::Object(object) = original else {
            return Ok(());
        };
        let metadata = object
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(metadata) = metadata else {
            return Ok(());
        };

        let meta = self.metadata();
        if let Some(labels) = &meta.labels {
            metadata.insert("labels".to_string(), serde_json::to_value(labels)?);
        }
        if let Some(annotations) = &meta.annotations {
            metadata.insert("annotations".to_string(), serde_json::to_value(annotations)?);
        }
        Ok(())
    }

    pub fn as_project_quota(&self) -> Option<&ProjectQuota> {
        match self {
            AdmissionObject::ProjectQuota(pq) => Some(pq),
            AdmissionObject::Governed(_) => None,
        }
    }
}
