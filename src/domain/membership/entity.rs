//! Membership join record

use serde::{Deserialize, Serialize};

use crate::domain::team::TeamId;
use crate::domain::user::UserId;

/// Join record linking one user to one team.
///
/// Identity is the composite `(user_id, team_id)` pair; at most one
/// membership exists per pair. Memberships are created and deleted only by
/// the user service's reconciliation, never edited in place.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Membership {
    pub user_id: UserId,
    pub team_id: TeamId,
}

impl Membership {
    pub fn new(user_id: UserId, team_id: TeamId) -> Self {
        Self { user_id, team_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_identity_is_the_pair() {
        let a = Membership::new(UserId::new(1), TeamId::new(2));
        let b = Membership::new(UserId::new(1), TeamId::new(2));
        let c = Membership::new(UserId::new(1), TeamId::new(3));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
