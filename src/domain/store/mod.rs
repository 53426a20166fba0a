//! Entity store abstraction
//!
//! One trait covers the three relations so a single implementation can make
//! the user-plus-memberships writes atomic.

mod repository;

pub use repository::{EntityStore, Resolve};
