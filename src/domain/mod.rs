//! Domain layer - Core business logic and entities

pub mod error;
pub mod membership;
pub mod store;
pub mod team;
pub mod user;

pub use error::{DomainError, FieldErrors};
pub use membership::{reconcile, Membership, MembershipDelta};
pub use store::{EntityStore, Resolve};
pub use team::{validate_team_name, Team, TeamId, TeamValidationError};
pub use user::{validate_user_fields, NewUser, User, UserId, UserWithTeams};
