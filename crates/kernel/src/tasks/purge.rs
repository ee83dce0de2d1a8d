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

use crate::script::InstanceId;
use ahash::AHashMap;
use ember_var::Uid;
use smallvec::SmallVec;

/// One entity a suspended instance cares about. The flag flips when the
/// entity is destroyed while the instance sleeps; the record itself is
/// only consumed at resume time.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct WatchedEntity {
    pub uid: Uid,
    pub purged: bool,
}

/// The set of entities one suspended instance is watching. The owner is
/// always `watches[0]`; the rest are entities its variables referenced at
/// suspension time.
#[derive(Debug, Clone)]
pub struct PurgeRecord {
    pub instance: InstanceId,
    pub watches: SmallVec<[WatchedEntity; 4]>,
}

impl PurgeRecord {
    pub fn owner_purged(&self) -> bool {
        self.watches[0].purged
    }

    /// Non-owner entities flagged as purged while the instance slept.
    pub fn purged_refs(&self) -> impl Iterator<Item = Uid> + '_ {
        self.watches[1..]
            .iter()
            .filter(|w| w.purged)
            .map(|w| w.uid)
    }
}

/// Tracks, for every suspended instance, which entities it was holding
/// references to when it went to sleep. When one of those entities is
/// destroyed the record is flagged, not the instance: the verdict is
/// delivered when the instance's wake-up fires and the record is taken.
pub struct PurgeTracker {
    records: AHashMap<InstanceId, PurgeRecord>,
    by_entity: AHashMap<Uid, SmallVec<[InstanceId; 2]>>,
}

impl PurgeTracker {
    pub fn new() -> Self {
        Self {
            records: AHashMap::new(),
            by_entity: AHashMap::new(),
        }
    }

    /// Register a suspending instance. `owner` must be the instance's
    /// container owner; `refs` are the entities its variables referenced,
    /// deduplicated against the owner.
    pub fn create(&mut self, instance: InstanceId, owner: Uid, refs: impl IntoIterator<Item = Uid>) {
        let mut watches: SmallVec<[WatchedEntity; 4]> = SmallVec::new();
        watches.push(WatchedEntity {
            uid: owner,
            purged: false,
        });
        for uid in refs {
            if uid == owner || watches.iter().any(|w| w.uid == uid) {
                continue;
            }
            watches.push(WatchedEntity { uid, purged: false });
        }
        for w in &watches {
            self.by_entity.entry(w.uid).or_default().push(instance);
        }
        self.records.insert(instance, PurgeRecord { instance, watches });
    }

    /// An entity was destroyed: flag it in every record watching it. The
    /// records stay alive; they are drained at resume time.
    pub fn notify_purged(&mut self, uid: Uid) {
        let Some(watchers) = self.by_entity.get(&uid) else {
            return;
        };
        for iid in watchers {
            if let Some(record) = self.records.get_mut(iid) {
                for w in record.watches.iter_mut().filter(|w| w.uid == uid) {
                    w.purged = true;
                }
            }
        }
    }

    /// Consume the record for a resuming instance. `None` means the
    /// instance never registered (or was already taken), which the caller
    /// treats as a stale wake-up.
    pub fn take(&mut self, instance: InstanceId) -> Option<PurgeRecord> {
        let record = self.records.remove(&instance)?;
        for w in &record.watches {
            if let Some(watchers) = self.by_entity.get_mut(&w.uid) {
                watchers.retain(|i| *i != instance);
                if watchers.is_empty() {
                    self.by_entity.remove(&w.uid);
                }
            }
        }
        Some(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for PurgeTracker {
    fn default() -> Self {
        Self::new()
    }
}
