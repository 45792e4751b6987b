//! Centralized constants for the k3rs-quota project.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod network;
pub mod paths;
pub mod quota;
pub mod state;
