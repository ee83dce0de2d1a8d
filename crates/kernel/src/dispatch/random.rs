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

use ahash::AHashMap;
use ember_var::Uid;

/// Side index of every entity holding at least one random-category trigger.
/// Random polling walks this instead of the whole container map, and walks
/// only a fraction of it per tick so a large world amortizes the scan over
/// a full cycle.
pub struct RandomIndex {
    members: Vec<Uid>,
    pos: AHashMap<Uid, usize>,
    cursor: usize,
}

impl RandomIndex {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            pos: AHashMap::new(),
            cursor: 0,
        }
    }

    /// Idempotent insert.
    pub fn add(&mut self, uid: Uid) {
        if self.pos.contains_key(&uid) {
            return;
        }
        self.pos.insert(uid, self.members.len());
        self.members.push(uid);
    }

    /// Swap-remove; order of members is not meaningful.
    pub fn remove(&mut self, uid: Uid) {
        let Some(idx) = self.pos.remove(&uid) else {
            return;
        };
        self.members.swap_remove(idx);
        if let Some(&moved) = self.members.get(idx) {
            self.pos.insert(moved, idx);
        }
        if self.cursor > self.members.len() {
            self.cursor = 0;
        }
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.pos.contains_key(&uid)
    }

    /// The next slice of members to poll, sized so that `cycle` consecutive
    /// calls cover the whole index at least once. The cursor wraps.
    pub fn take_slice(&mut self, cycle: usize) -> Vec<Uid> {
        if self.members.is_empty() {
            return Vec::new();
        }
        let cycle = cycle.max(1);
        let quota = self.members.len().div_ceil(cycle);
        let mut slice = Vec::with_capacity(quota);
        for _ in 0..quota {
            if self.cursor >= self.members.len() {
                self.cursor = 0;
            }
            slice.push(self.members[self.cursor]);
            self.cursor += 1;
        }
        slice
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for RandomIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_var::EntityKind;

    fn mob(n: u64) -> Uid {
        Uid::mk(EntityKind::Mob, n)
    }

    #[test]
    fn full_cycle_covers_everyone() {
        let mut idx = RandomIndex::new();
        for n in 0..10 {
            idx.add(mob(n));
        }
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.extend(idx.take_slice(5));
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn add_is_idempotent() {
        let mut idx = RandomIndex::new();
        idx.add(mob(1));
        idx.add(mob(1));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn remove_mid_scan_stays_consistent() {
        let mut idx = RandomIndex::new();
        for n in 0..6 {
            idx.add(mob(n));
        }
        idx.take_slice(3);
        idx.remove(mob(0));
        idx.remove(mob(5));
        assert_eq!(idx.len(), 4);
        assert!(!idx.contains(mob(0)));
        // Remaining members still all reachable over a cycle.
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.extend(idx.take_slice(3));
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn empty_index_yields_nothing() {
        let mut idx = RandomIndex::new();
        assert!(idx.take_slice(5).is_empty());
    }
}
