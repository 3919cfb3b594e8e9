//! Roster diffing and session readiness.
//!
//! [`changed`] is the only gate deciding whether listeners hear about a
//! freshly fetched session. The registry returns a stable member order for
//! unchanged membership, so order is significant: a reorder counts as a
//! change just like a ready flag flipping in place.

use serde::{Deserialize, Serialize};

use crate::session::{Member, Session};

/// Returns `true` if `new` differs from `old` in length, or in member id or
/// ready flag at any position. The flag is compared both as published and
/// as parsed.
#[must_use]
pub fn changed(old: &[Member], new: &[Member]) -> bool {
    if old.len() != new.len() {
        return true;
    }
    old.iter().zip(new).any(|(a, b)| {
        a.id != b.id || a.is_ready() != b.is_ready() || a.ready_flag() != b.ready_flag()
    })
}

/// Decides when a session is ready to start a game.
///
/// A session is ready once it holds at least `min_members` members and every
/// one of them has set the ready flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPolicy {
    /// Minimum roster size before readiness is considered at all.
    pub min_members: usize,
}

impl ReadinessPolicy {
    /// Default minimum: a game needs more than one member.
    pub const DEFAULT_MIN_MEMBERS: usize = 2;

    #[must_use]
    pub const fn new(min_members: usize) -> Self {
        Self { min_members }
    }

    /// Evaluate the policy against a session snapshot.
    #[must_use]
    pub fn is_ready(&self, session: &Session) -> bool {
        session.members.len() >= self.min_members && session.members.iter().all(Member::is_ready)
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_MEMBERS)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::session::{Attributes, IS_READY_KEY, MemberId, SessionId};

    fn session_with(members: Vec<Member>) -> Session {
        Session {
            id: SessionId::new("s-1"),
            name: "Alpha".to_string(),
            max_members: 4,
            is_private: false,
            join_code: None,
            host_id: MemberId::new("p1"),
            created_at_ms: 0,
            attributes: Attributes::new(),
            members,
        }
    }

    #[test]
    fn test_identical_rosters_unchanged() {
        let old = vec![Member::new("p1", "Ada", false), Member::new("p2", "Bo", true)];
        assert!(!changed(&old, &old.clone()));
    }

    #[test]
    fn test_empty_rosters_unchanged() {
        assert!(!changed(&[], &[]));
    }

    #[test]
    fn test_ready_toggle_in_place_is_change() {
        let old = vec![Member::new("p1", "Ada", false)];
        let new = vec![Member::new("p1", "Ada", true)];
        assert!(changed(&old, &new));
    }

    #[test]
    fn test_reorder_is_change() {
        let old = vec![Member::new("p1", "Ada", true), Member::new("p2", "Bo", true)];
        let new = vec![Member::new("p2", "Bo", true), Member::new("p1", "Ada", true)];
        assert!(changed(&old, &new));
    }

    #[test]
    fn test_name_only_change_is_ignored() {
        let old = vec![Member::new("p1", "Ada", true)];
        let new = vec![Member::new("p1", "Ada Lovelace", true)];
        assert!(!changed(&old, &new));
    }

    fn with_flag(id: &str, flag: &str) -> Member {
        let mut member = Member::new(id, "player", false);
        member
            .attributes
            .insert(IS_READY_KEY.to_string(), flag.to_string());
        member
    }

    #[test]
    fn test_capitalised_ready_flip_is_change() {
        let old = vec![Member::new("p1", "Ada", true), with_flag("p2", "False")];
        let new = vec![Member::new("p1", "Ada", true), with_flag("p2", "True")];
        assert!(changed(&old, &new));
        assert!(ReadinessPolicy::default().is_ready(&session_with(new)));
    }

    #[test]
    fn test_flag_spelling_change_is_change() {
        let old = vec![with_flag("p1", "false")];
        let new = vec![with_flag("p1", "False")];
        assert!(changed(&old, &new));
    }

    #[test]
    fn test_single_member_never_ready() {
        let policy = ReadinessPolicy::default();
        assert!(!policy.is_ready(&session_with(vec![Member::new("p1", "Ada", true)])));
    }

    #[test]
    fn test_all_ready_pair_is_ready() {
        let policy = ReadinessPolicy::default();
        let session = session_with(vec![Member::new("p1", "Ada", true), Member::new("p2", "Bo", true)]);
        assert!(policy.is_ready(&session));
    }

    #[test]
    fn test_one_unready_member_blocks() {
        let policy = ReadinessPolicy::default();
        let session = session_with(vec![Member::new("p1", "Ada", true), Member::new("p2", "Bo", false)]);
        assert!(!policy.is_ready(&session));
    }

    #[test]
    fn test_custom_minimum() {
        let policy = ReadinessPolicy::new(3);
        let session = session_with(vec![Member::new("p1", "Ada", true), Member::new("p2", "Bo", true)]);
        assert!(!policy.is_ready(&session));
        assert!(ReadinessPolicy::new(1).is_ready(&session_with(vec![Member::new("p1", "Ada", true)])));
    }

    fn member_strategy() -> impl Strategy<Value = Member> {
        (0u8..6, any::<bool>()).prop_map(|(id, ready)| Member::new(format!("p{id}"), "player", ready))
    }

    fn roster_strategy() -> impl Strategy<Value = Vec<Member>> {
        prop::collection::vec(member_strategy(), 0..8)
    }

    proptest! {
        /// A roster compared with a position-equal copy never reports a change.
        #[test]
        fn prop_position_equal_rosters_unchanged(roster in roster_strategy()) {
            let copy: Vec<Member> = roster
                .iter()
                .map(|m| Member::new(m.id.as_str(), "renamed", m.is_ready()))
                .collect();
            prop_assert!(!changed(&roster, &copy));
        }

        /// Rosters of different lengths always differ.
        #[test]
        fn prop_length_mismatch_is_change(a in roster_strategy(), b in roster_strategy()) {
            prop_assume!(a.len() != b.len());
            prop_assert!(changed(&a, &b));
        }

        /// Flipping the ready flag at any single position is a change.
        #[test]
        fn prop_ready_flip_is_change(roster in roster_strategy(), index in any::<prop::sample::Index>()) {
            prop_assume!(!roster.is_empty());
            let i = index.index(roster.len());
            let mut flipped = roster.clone();
            let ready = flipped[i].is_ready();
            flipped[i] = Member::new(flipped[i].id.as_str(), "player", !ready);
            prop_assert!(changed(&roster, &flipped));
        }

        /// Replacing the id at any single position with an unseen id is a change.
        #[test]
        fn prop_id_mismatch_is_change(roster in roster_strategy(), index in any::<prop::sample::Index>()) {
            prop_assume!(!roster.is_empty());
            let i = index.index(roster.len());
            let mut replaced = roster.clone();
            replaced[i].id = MemberId::new("stranger");
            prop_assert!(changed(&roster, &replaced));
        }

        /// The verdict does not depend on argument order.
        #[test]
        fn prop_changed_is_symmetric(a in roster_strategy(), b in roster_strategy()) {
            prop_assert_eq!(changed(&a, &b), changed(&b, &a));
        }
    }
}
