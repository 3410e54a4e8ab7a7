//! Business logic between the Discord handlers and the external sources.

pub mod auto_roles;
pub mod member;
pub mod refresh;
pub mod report;
pub mod roles_source;
pub mod static_source;
pub mod status;
