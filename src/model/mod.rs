//! Domain value types shared by services and handlers.

pub mod messages;
pub mod roles;
pub mod status;
