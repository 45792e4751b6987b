//! Project quota ownership tag keys.
//!
//! The accounting controller counts governed objects by these exact keys,
//! so renaming either one is a breaking change.

/// Names the namespace that matched the owning ProjectQuota.
pub const PROJECT_NAMESPACE_KEY: &str = "quota.k3rs.io/project-namespace";

/// Names the owning ProjectQuota record.
pub const PROJECT_QUOTA_KEY: &str = "quota.k3rs.io/projectquota";
