//! Filesystem path constants.

/// Default config file path for the webhook server.
pub const DEFAULT_SERVER_CONFIG: &str = "/etc/k3rs/quota-config.yaml";

/// Default data directory for the webhook state store.
pub const DEFAULT_SERVER_DATA_DIR: &str = "/tmp/k3rs-quota-data";
