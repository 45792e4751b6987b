//! Project quota admission: resolve which ProjectQuota owns an object, tag
//! the object with that ownership, and enforce the quota's hard limits.

pub mod controller;
pub mod enforcer;
pub mod kind;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod object;
pub mod project_quota;
pub mod resolver;
pub mod source;
pub mod tagger;

pub use controller::{AdmissionController, Operation, Verdict};
pub use kind::{GovernedKind, ResourceKind};
pub use object::{AdmissionObject, GovernedObject};
pub use resolver::{Ownership, QuotaResolver};
pub use source::QuotaSource;
