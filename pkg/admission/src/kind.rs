use std::fmt;

use pkg_constants::quota::{PROJECT_NAMESPACE_KEY, PROJECT_QUOTA_KEY};
use pkg_types::meta::ObjectMeta;
use pkg_types::resource::{
    RESOURCE_PERSISTENT_VOLUME_CLAIMS, RESOURCE_QUOTAS, RESOURCE_REPLICATION_CONTROLLERS,
    RESOURCE_SECRETS,
};

use crate::resolver::Ownership;

/// Namespaced kinds whose objects are tagged and counted against a ProjectQuota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GovernedKind {
    PersistentVolumeClaim,
    ReplicationController,
    ResourceQuota,
    Secret,
}

/// Every kind with an admission entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Governed(GovernedKind),
    ProjectQuota,
}

/// Which metadata map carries the ownership tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagChannel {
    Annotations,
    Labels,
}

/// Which keys are written into the tag channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLayout {
    QuotaOnly,
    NamespaceAndQuota,
}

/// What the enforcer does with an object that carries no ownership tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTagPolicy {
    Reject,
    Admit,
}

/// How the admission host answers when a call fails with an infrastructure error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Allow the request and log the failure.
    Ignore,
    /// Deny the request with the failure message.
    Fail,
}

/// Per-kind admission configuration.
///
/// The tag channel and layout are read by the accounting controller as well;
/// changing either for an existing kind breaks usage counting.
#[derive(Debug)]
pub struct KindPolicy {
    pub kind: GovernedKind,
    /// Dimension in `hard`/`used` this kind is counted under.
    pub dimension: &'static str,
    pub channel: TagChannel,
    pub layout: TagLayout,
    pub missing_tag: MissingTagPolicy,
}

static PERSISTENT_VOLUME_CLAIM: KindPolicy = KindPolicy {
    kind: GovernedKind::PersistentVolumeClaim,
    dimension: RESOURCE_PERSISTENT_VOLUME_CLAIMS,
    channel: TagChannel::Annotations,
    layout: TagLayout::NamespaceAndQuota,
    missing_tag: MissingTagPolicy::Reject,
};

static REPLICATION_CONTROLLER: KindPolicy = KindPolicy {
    kind: GovernedKind::ReplicationController,
    dimension: RESOURCE_REPLICATION_CONTROLLERS,
    channel: TagChannel::Annotations,
    layout: TagLayout::QuotaOnly,
    missing_tag: MissingTagPolicy::Reject,
};

static RESOURCE_QUOTA: KindPolicy = KindPolicy {
    kind: GovernedKind::ResourceQuota,
    dimension: RESOURCE_QUOTAS,
    channel: TagChannel::Annotations,
    layout: TagLayout::NamespaceAndQuota,
    missing_tag: MissingTagPolicy::Reject,
};

static SECRET: KindPolicy = KindPolicy {
    kind: GovernedKind::Secret,
    dimension: RESOURCE_SECRETS,
    channel: TagChannel::Labels,
    layout: TagLayout::QuotaOnly,
    missing_tag: MissingTagPolicy::Admit,
};

impl GovernedKind {
    pub const ALL: [GovernedKind; 4] = [
        GovernedKind::PersistentVolumeClaim,
        GovernedKind::ReplicationController,
        GovernedKind::ResourceQuota,
        GovernedKind::Secret,
    ];

    pub fn policy(self) -> &'static KindPolicy {
        match self {
            GovernedKind::PersistentVolumeClaim => &PERSISTENT_VOLUME_CLAIM,
            GovernedKind::ReplicationController => &REPLICATION_CONTROLLER,
            GovernedKind::ResourceQuota => &RESOURCE_QUOTA,
            GovernedKind::Secret => &SECRET,
        }
    }
}

impl fmt::Display for GovernedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernedKind::PersistentVolumeClaim => write!(f, "PersistentVolumeClaim"),
            GovernedKind::ReplicationController => write!(f, "ReplicationController"),
            GovernedKind::ResourceQuota => write!(f, "ResourceQuota"),
            GovernedKind::Secret => write!(f, "Secret"),
        }
    }
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Governed(GovernedKind::PersistentVolumeClaim),
        ResourceKind::Governed(GovernedKind::ReplicationController),
        ResourceKind::Governed(GovernedKind::ResourceQuota),
        ResourceKind::Governed(GovernedKind::Secret),
        ResourceKind::ProjectQuota,
    ];

    /// Lowercase plural used in webhook paths, e.g. `secrets`.
    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Governed(GovernedKind::PersistentVolumeClaim) => "persistentvolumeclaims",
            ResourceKind::Governed(GovernedKind::ReplicationController) => "replicationcontrollers",
            ResourceKind::Governed(GovernedKind::ResourceQuota) => "resourcequotas",
            ResourceKind::Governed(GovernedKind::Secret) => "secrets",
            ResourceKind::ProjectQuota => "projectquotas",
        }
    }

    pub fn from_plural(plural: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.plural() == plural)
    }

    /// Governed kinds fail open; ProjectQuota updates fail closed.
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            ResourceKind::Governed(_) => FailurePolicy::Ignore,
            ResourceKind::ProjectQuota => FailurePolicy::Fail,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Governed(kind) => write!(f, "{}", kind),
            ResourceKind::ProjectQuota => write!(f, "ProjectQuota"),
        }
    }
}

impl KindPolicy {
    /// Name of the owning ProjectQuota, if the object was tagged.
    pub fn read_quota_tag<'a>(&self, meta: &'a ObjectMeta) -> Option<&'a str> {
        match self.channel {
            TagChannel::Annotations => meta.annotation(PROJECT_QUOTA_KEY),
            TagChannel::Labels => meta.label(PROJECT_QUOTA_KEY),
        }
    }

    /// Stamp `owner` onto the object, creating the channel map if absent.
    pub fn write_tag(&self, meta: &mut ObjectMeta, owner: &Ownership) {
        let tags = match self.channel {
            TagChannel::Annotations => meta.annotations_mut(),
            TagChannel::Labels => meta.labels_mut(),
        };
        if self.layout == TagLayout::NamespaceAndQuota {
            tags.insert(PROJECT_NAMESPACE_KEY.to_string(), owner.namespace.clone());
        }
        tags.insert(PROJECT_QUOTA_KEY.to_string(), owner.quota.clone());
    }

    pub fn channel_name(&self) -> &'static str {
        match self.channel {
            TagChannel::Annotations => "annotation",
            TagChannel::Labels => "label",
        }
    }
}
