//! Membership reconciliation
//!
//! Computes which membership rows to insert and which to delete when a
//! user's team selection changes. Pure set arithmetic; the store applies the
//! resulting delta inside its atomic write.

use std::collections::BTreeSet;

use crate::domain::team::TeamId;

/// The add/remove sets produced by [`reconcile`].
///
/// The two sets are disjoint by construction: a team present in both the
/// existing and the selected set is left untouched, never removed and
/// re-added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub to_add: BTreeSet<TeamId>,
    pub to_remove: BTreeSet<TeamId>,
}

impl MembershipDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the membership delta for a user's new team selection.
///
/// `selected = None` means "clear all memberships" in the edit path; the
/// create path calls this with an empty `existing` set, where `None` and an
/// empty selection both yield no additions.
pub fn reconcile(
    existing: &BTreeSet<TeamId>,
    selected: Option<&BTreeSet<TeamId>>,
) -> MembershipDelta {
    match selected {
        None => MembershipDelta {
            to_add: BTreeSet::new(),
            to_remove: existing.clone(),
        },
        Some(selected) => MembershipDelta {
            to_add: selected.difference(existing).copied().collect(),
            to_remove: existing.difference(selected).copied().collect(),
        },
    }
}
