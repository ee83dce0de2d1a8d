// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The entity reference layer. Every cross-reference a script holds is a
//! `Uid`; this table is the single place that says whether a UID still names
//! a live entity. Allocation happens exactly once at entity creation, and
//! removal exactly once at the start of destruction — before any script
//! code can observe the half-dead entity.

use ahash::AHashMap;
use ember_var::{EntityKind, UID_PARTITION, Uid};

pub struct EntityLookup {
    entries: AHashMap<Uid, EntityKind>,
    next_seq: [u64; EntityKind::ALL.len()],
}

impl EntityLookup {
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            next_seq: [0; EntityKind::ALL.len()],
        }
    }

    /// Issue a fresh UID for a new entity and register it, atomically from
    /// the engine's point of view: there is no window where the entity
    /// exists without a resolvable UID.
    pub fn allocate(&mut self, kind: EntityKind) -> Uid {
        let seq = &mut self.next_seq[kind as usize];
        assert!(*seq < UID_PARTITION, "UID range exhausted for {kind}");
        let uid = Uid::mk(kind, *seq);
        *seq += 1;
        self.entries.insert(uid, kind);
        uid
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.entries.contains_key(&uid)
    }

    pub fn kind_of(&self, uid: Uid) -> Option<EntityKind> {
        self.entries.get(&uid).copied()
    }

    /// Remove a UID at the start of entity destruction. Idempotent; returns
    /// whether the entry was present. Sequence numbers are never reused, so
    /// a removed UID can never resolve to a different entity later.
    pub fn remove(&mut self, uid: Uid) -> bool {
        self.entries.remove(&uid).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EntityLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_resolves_until_removed() {
        let mut lookup = EntityLookup::new();
        let mob = lookup.allocate(EntityKind::Mob);
        let room = lookup.allocate(EntityKind::Room);
        assert!(lookup.contains(mob));
        assert_eq!(lookup.kind_of(room), Some(EntityKind::Room));

        assert!(lookup.remove(mob));
        assert!(!lookup.contains(mob));
        assert!(!lookup.remove(mob));
        assert!(lookup.contains(room));
    }

    #[test]
    fn uids_never_reused() {
        let mut lookup = EntityLookup::new();
        let a = lookup.allocate(EntityKind::Obj);
        lookup.remove(a);
        let b = lookup.allocate(EntityKind::Obj);
        assert_ne!(a, b);
        assert!(!lookup.contains(a));
    }
}
