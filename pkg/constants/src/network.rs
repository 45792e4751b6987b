//! Network-related constants.

/// Default port for the admission webhook server.
pub const DEFAULT_WEBHOOK_PORT: u16 = 9443;

/// Response header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
