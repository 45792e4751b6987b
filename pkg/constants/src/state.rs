//! State store constants.

/// Key prefix under which ProjectQuota records are stored.
/// Full key = `PROJECT_QUOTA_PREFIX + name`.
pub const PROJECT_QUOTA_PREFIX: &str = "/registry/projectquotas/";

/// Capacity of the broadcast channel feeding live watch subscribers.
pub const EVENT_BROADCAST_CAPACITY: usize = 1024;
