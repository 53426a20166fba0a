//! User management infrastructure

mod service;

pub use service::{CreateUserRequest, EditUserRequest, UserService};
