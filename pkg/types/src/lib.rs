pub mod config;
pub mod governed;
pub mod meta;
pub mod project_quota;
pub mod quantity;
pub mod resource;
pub mod validate;
