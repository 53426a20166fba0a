//! Infrastructure layer - storage backends, services, and logging

pub mod logging;
pub mod store;
pub mod team;
pub mod user;
