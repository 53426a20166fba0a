//! Team lookup infrastructure

mod service;

pub use service::TeamDirectory;
