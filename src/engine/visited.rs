// src/engine/visited.rs

//! Visited-set manager.
//!
//! Membership changes only after the ledger confirms a write. Each change
//! swaps in a new [`VisitedSnapshot`], so readers holding an older one keep a
//! consistent view.
//!
//! A toggle records the membership it asks for when it starts. A reload that
//! lands while the write is in flight leaves that place alone, and the commit
//! then sets the requested membership, so the ledger and the local set agree
//! whichever order the answers arrive in.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::models::{PlaceKey, UserId, VisitRecord};

/// Immutable view of the visited set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitedSnapshot(Arc<BTreeSet<PlaceKey>>);

impl VisitedSnapshot {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&PlaceKey::new(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why a toggle was not started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleRejected {
    /// No user, or a blank place name
    IdentityRequired,
    /// A write for this place has not settled yet
    AlreadyPending,
}

/// A toggle the ledger has been asked to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub user: UserId,
    pub place: String,
}

/// The user's confirmed visits plus the writes still in flight.
#[derive(Debug, Default)]
pub struct VisitedSet {
    current: VisitedSnapshot,
    /// Place -> membership the in-flight write asked for
    pending: HashMap<PlaceKey, bool>,
    last_visited: Option<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> VisitedSnapshot {
        self.current.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.current.contains(name)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Location of the newest ledger row seen by the last load.
    pub fn last_visited(&self) -> Option<&str> {
        self.last_visited.as_deref()
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.contains_key(&PlaceKey::new(name))
    }

    /// Replace the whole set from ledger rows.
    ///
    /// Places with a write in flight keep their local membership; the rows
    /// may or may not include that write yet.
    pub fn replace_from_records(&mut self, records: &[VisitRecord]) {
        let mut keys: BTreeSet<PlaceKey> = records
            .iter()
            .map(|r| PlaceKey::new(&r.location))
            .filter(|k| !k.is_empty())
            .filter(|k| !self.pending.contains_key(k))
            .collect();
        keys.extend(
            self.pending
                .keys()
                .filter(|k| self.current.0.contains(*k))
                .cloned(),
        );
        self.current = VisitedSnapshot(Arc::new(keys));
        self.last_visited = records
            .iter()
            .rev()
            .map(|r| r.location.trim())
            .find(|l| !l.is_empty())
            .map(str::to_string);
    }

    /// Reserve a toggle for `place`.
    pub fn begin_toggle(
        &mut self,
        user: Option<&UserId>,
        place: &str,
    ) -> Result<PendingToggle, ToggleRejected> {
        let user = user.ok_or(ToggleRejected::IdentityRequired)?;
        let key = PlaceKey::new(place);
        if key.is_empty() {
            return Err(ToggleRejected::IdentityRequired);
        }
        if self.pending.contains_key(&key) {
            return Err(ToggleRejected::AlreadyPending);
        }
        let target = !self.current.0.contains(&key);
        self.pending.insert(key, target);
        Ok(PendingToggle {
            user: user.clone(),
            place: place.trim().to_string(),
        })
    }

    /// Apply a confirmed toggle. Returns the new membership.
    ///
    /// The membership requested by [`begin_toggle`](Self::begin_toggle) is
    /// set, not flipped again. A commit with no matching toggle flips.
    pub fn commit(&mut self, place: &str) -> bool {
        let key = PlaceKey::new(place);
        let visited = self
            .pending
            .remove(&key)
            .unwrap_or_else(|| !self.current.0.contains(&key));

        let mut next = (*self.current.0).clone();
        if visited {
            next.insert(key);
        } else {
            next.remove(&key);
        }
        self.current = VisitedSnapshot(Arc::new(next));
        visited
    }

    /// Release a toggle the ledger rejected. Membership is unchanged.
    pub fn abandon(&mut self, place: &str) {
        self.pending.remove(&PlaceKey::new(place));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("1").unwrap()
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let mut set = VisitedSet::new();

        set.begin_toggle(Some(&user()), "Lisbon").unwrap();
        assert!(set.commit("Lisbon"));
        assert!(set.contains("lisbon"));

        set.begin_toggle(Some(&user()), "Lisbon").unwrap();
        assert!(!set.commit("Lisbon"));
        assert!(!set.contains("Lisbon"));
    }

    #[test]
    fn second_toggle_while_pending_is_rejected() {
        let mut set = VisitedSet::new();
        set.begin_toggle(Some(&user()), "Oslo").unwrap();
        assert_eq!(
            set.begin_toggle(Some(&user()), "OSLO"),
            Err(ToggleRejected::AlreadyPending)
        );

        set.abandon("Oslo");
        assert!(set.begin_toggle(Some(&user()), "Oslo").is_ok());
    }

    #[test]
    fn toggle_requires_identity() {
        let mut set = VisitedSet::new();
        assert_eq!(
            set.begin_toggle(None, "Oslo"),
            Err(ToggleRejected::IdentityRequired)
        );
        assert_eq!(
            set.begin_toggle(Some(&user()), "  "),
            Err(ToggleRejected::IdentityRequired)
        );
        assert!(!set.is_pending("Oslo"));
    }

    #[test]
    fn abandon_keeps_membership() {
        let mut set = VisitedSet::new();
        set.begin_toggle(Some(&user()), "Lima").unwrap();
        set.abandon("Lima");
        assert!(set.is_empty());
    }

    #[test]
    fn snapshots_are_not_torn_by_later_commits() {
        let mut set = VisitedSet::new();
        set.begin_toggle(Some(&user()), "Kyoto").unwrap();
        set.commit("Kyoto");
        let before = set.snapshot();

        set.begin_toggle(Some(&user()), "Quito").unwrap();
        set.commit("Quito");

        assert_eq!(before.len(), 1);
        assert_eq!(set.snapshot().len(), 2);
    }

    #[test]
    fn reload_during_write_keeps_requested_membership() {
        let mut set = VisitedSet::new();
        set.begin_toggle(Some(&user()), "Oslo").unwrap();

        // The ledger already has the write; the local set waits for the commit.
        set.replace_from_records(&[VisitRecord::new("Oslo"), VisitRecord::new("Lima")]);
        assert!(!set.contains("Oslo"));
        assert!(set.contains("Lima"));

        assert!(set.commit("Oslo"));
        assert!(set.contains("Oslo"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn reload_without_the_write_still_commits_it() {
        let mut set = VisitedSet::new();
        set.replace_from_records(&[VisitRecord::new("Kyoto")]);
        set.begin_toggle(Some(&user()), "Kyoto").unwrap();

        set.replace_from_records(&[]);
        assert!(set.contains("Kyoto"));

        assert!(!set.commit("Kyoto"));
        assert!(set.is_empty());
    }

    #[test]
    fn replace_remembers_last_location() {
        let mut set = VisitedSet::new();
        set.replace_from_records(&[
            VisitRecord::new("Lisbon"),
            VisitRecord::new("Oslo"),
            VisitRecord::new("lisbon"),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.last_visited(), Some("lisbon"));

        set.replace_from_records(&[]);
        assert!(set.is_empty());
        assert_eq!(set.last_visited(), None);
    }
}
