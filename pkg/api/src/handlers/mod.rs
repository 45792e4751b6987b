pub mod admission;
pub mod project_quotas;
