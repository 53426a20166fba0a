//! Membership domain
//!
//! The join relation between users and teams, plus the reconciliation that
//! turns a team selection into add/remove sets.

mod entity;
mod reconcile;

pub use entity::Membership;
pub use reconcile::{reconcile, MembershipDelta};
