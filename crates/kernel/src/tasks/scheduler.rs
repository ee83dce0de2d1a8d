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
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Handle to a pending wake-up, held by the suspended instance. Cancelling
/// through the handle is lazy: the heap entry stays behind and is skipped
/// when it surfaces.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct WaitHandle(u64);

#[derive(Debug)]
struct WaitEntry {
    wake_at: u64,
    owner: Uid,
    instance: InstanceId,
}

/// A pending wake-up that has come due.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DueWake {
    pub owner: Uid,
    pub instance: InstanceId,
}

/// Min-heap of pending wake-ups, keyed by absolute pulse. Two waits landing
/// on the same pulse fire in the order they were enqueued; the monotonic
/// sequence number breaks the tie.
pub struct WaitQueue {
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    entries: AHashMap<u64, WaitEntry>,
    next_seq: u64,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            entries: AHashMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule a wake-up at the given absolute pulse.
    pub fn enqueue(&mut self, wake_at: u64, owner: Uid, instance: InstanceId) -> WaitHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            seq,
            WaitEntry {
                wake_at,
                owner,
                instance,
            },
        );
        self.heap.push(Reverse((wake_at, seq)));
        WaitHandle(seq)
    }

    /// Drop a pending wake-up. The heap entry is left to be skipped later.
    pub fn cancel(&mut self, handle: WaitHandle) {
        self.entries.remove(&handle.0);
    }

    /// Pop every wake-up due at or before `pulse`, in (pulse, enqueue)
    /// order. Cancelled entries are silently discarded as they surface.
    pub fn collect_due(&mut self, pulse: u64) -> Vec<DueWake> {
        let mut due = Vec::new();
        while let Some(&Reverse((wake_at, seq))) = self.heap.peek() {
            if wake_at > pulse {
                break;
            }
            self.heap.pop();
            if let Some(entry) = self.entries.remove(&seq) {
                due.push(DueWake {
                    owner: entry.owner,
                    instance: entry.instance,
                });
            }
        }
        due
    }

    /// Number of live (uncancelled) pending wake-ups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for WaitQueue {
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
    fn due_in_pulse_then_fifo_order() {
        let mut q = WaitQueue::new();
        q.enqueue(20, mob(1), InstanceId(1));
        q.enqueue(10, mob(2), InstanceId(2));
        q.enqueue(10, mob(3), InstanceId(3));

        let due = q.collect_due(10);
        let ids: Vec<u64> = due.iter().map(|d| d.instance.0).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(q.len(), 1);

        let due = q.collect_due(25);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].instance, InstanceId(1));
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_entries_never_fire() {
        let mut q = WaitQueue::new();
        let h = q.enqueue(5, mob(1), InstanceId(1));
        q.enqueue(5, mob(2), InstanceId(2));
        q.cancel(h);
        assert_eq!(q.len(), 1);

        let due = q.collect_due(5);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].instance, InstanceId(2));
    }

    #[test]
    fn nothing_due_before_deadline() {
        let mut q = WaitQueue::new();
        q.enqueue(100, mob(1), InstanceId(1));
        assert!(q.collect_due(99).is_empty());
        assert_eq!(q.len(), 1);
    }
}
