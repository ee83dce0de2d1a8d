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

use crate::registry::TriggerPrototype;
use crate::script::VarEnv;
use crate::tasks::WaitHandle;
use ember_common::{BitEnum, TrigEvent};
use ember_var::Uid;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Engine-unique identity of a trigger instance, stable across suspension
/// and resumption. The purge tracker and wait queue refer to instances by
/// this, never by position or pointer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct InstanceId(pub u64);

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Execution state of an instance. `Running` exists only while the driver
/// holds the instance; between dispatches an instance is `Idle` (runnable
/// from the top on the next matching event) or `Suspended` (holding its
/// resume point).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TrigState {
    Idle,
    Running,
    Suspended { pc: usize },
}

/// A runnable copy of a prototype's execution state, attached to one entity.
/// Suspension and resumption never change an instance's identity.
pub struct TriggerInstance {
    pub(crate) id: InstanceId,
    pub(crate) prototype: Arc<TriggerPrototype>,
    pub(crate) state: TrigState,
    /// Dispatch nesting depth this activation started at; for logging.
    pub(crate) depth: usize,
    /// Total backward jumps taken in the current activation, preserved
    /// across waits so a loop can't dodge the ceiling by sleeping.
    pub(crate) loops: u32,
    pub(crate) vars: VarEnv,
    pub(crate) wait: Option<WaitHandle>,
}

impl TriggerInstance {
    pub(crate) fn new(id: InstanceId, prototype: Arc<TriggerPrototype>) -> Self {
        Self {
            id,
            prototype,
            state: TrigState::Idle,
            depth: 0,
            loops: 0,
            vars: VarEnv::new(),
            wait: None,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn prototype(&self) -> &Arc<TriggerPrototype> {
        &self.prototype
    }

    pub fn state(&self) -> TrigState {
        self.state
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.state, TrigState::Suspended { .. })
    }

    /// Reset to idle after a completed or aborted activation: locals are
    /// dropped so the next dispatch starts clean from the program top.
    pub(crate) fn finish(&mut self) {
        self.state = TrigState::Idle;
        self.depth = 0;
        self.loops = 0;
        self.vars.clear();
        self.wait = None;
    }
}

/// The per-entity attachment point: the ordered list of trigger instances
/// plus the entity-scoped variables they share. The cached interest mask
/// makes the common case — an event nobody here cares about — a single
/// bit test.
pub struct ScriptContainer {
    owner: Uid,
    pub(crate) instances: Vec<TriggerInstance>,
    pub(crate) vars: VarEnv,
    /// Current variable context id for this entity's scripts.
    pub(crate) context: i64,
    mask: BitEnum<TrigEvent>,
}

impl ScriptContainer {
    pub fn new(owner: Uid) -> Self {
        Self {
            owner,
            instances: Vec::new(),
            vars: VarEnv::new(),
            context: 0,
            mask: BitEnum::new(),
        }
    }

    pub fn owner(&self) -> Uid {
        self.owner
    }

    /// O(1) "does anything here care" test against the cached union mask.
    pub fn has_interest(&self, events: BitEnum<TrigEvent>) -> bool {
        self.mask.intersects(events)
    }

    pub fn mask(&self) -> BitEnum<TrigEvent> {
        self.mask
    }

    /// Append an instance (attach order is execution order) and fold its
    /// interest into the cached mask.
    pub(crate) fn attach(&mut self, instance: TriggerInstance) {
        self.mask = self.mask | instance.prototype.interest;
        self.instances.push(instance);
    }

    /// Remove an instance by id. Recomputes the cached mask from what's
    /// left, since the departing instance may have been the only one
    /// interested in some category.
    pub(crate) fn detach(&mut self, id: InstanceId) -> Option<TriggerInstance> {
        let idx = self.instances.iter().position(|i| i.id == id)?;
        let instance = self.instances.remove(idx);
        self.recompute_mask();
        Some(instance)
    }

    pub(crate) fn recompute_mask(&mut self) {
        self.mask = self
            .instances
            .iter()
            .map(|i| i.prototype.interest)
            .fold(BitEnum::new(), |acc, m| acc | m);
    }

    pub(crate) fn index_of(&self, id: InstanceId) -> Option<usize> {
        self.instances.iter().position(|i| i.id == id)
    }

    pub fn instances(&self) -> impl Iterator<Item = &TriggerInstance> {
        self.instances.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_common::{AttachKind, TriggerId};
    use ember_var::EntityKind;
    use ember_var::program::{Op, Program};

    fn proto(id: u32, interest: BitEnum<TrigEvent>) -> Arc<TriggerPrototype> {
        Arc::new(TriggerPrototype {
            id: TriggerId(id),
            name: format!("test {id}"),
            attach: AttachKind::Mob,
            interest,
            narg: 100,
            arg: None,
            allow_multiple: false,
            program: Program::new(vec![Op::Halt]),
        })
    }

    #[test]
    fn mask_is_union_of_instances() {
        let mut sc = ScriptContainer::new(Uid::mk(EntityKind::Mob, 1));
        sc.attach(TriggerInstance::new(
            InstanceId(1),
            proto(1, BitEnum::new_with(TrigEvent::Speech)),
        ));
        sc.attach(TriggerInstance::new(
            InstanceId(2),
            proto(2, BitEnum::new_with(TrigEvent::Greet) | TrigEvent::Random),
        ));

        assert!(sc.has_interest(BitEnum::new_with(TrigEvent::Speech)));
        assert!(sc.has_interest(BitEnum::new_with(TrigEvent::Random)));
        assert!(!sc.has_interest(BitEnum::new_with(TrigEvent::Death)));

        // Detach recomputes: losing the greet/random instance must drop
        // those bits.
        sc.detach(InstanceId(2)).unwrap();
        assert!(!sc.has_interest(BitEnum::new_with(TrigEvent::Greet)));
        assert!(sc.has_interest(BitEnum::new_with(TrigEvent::Speech)));
    }

    #[test]
    fn attach_order_preserved() {
        let mut sc = ScriptContainer::new(Uid::mk(EntityKind::Mob, 1));
        for n in 0..4 {
            sc.attach(TriggerInstance::new(
                InstanceId(n),
                proto(n as u32, BitEnum::new_with(TrigEvent::Speech)),
            ));
        }
        sc.detach(InstanceId(1)).unwrap();
        let order: Vec<u64> = sc.instances().map(|i| i.id().0).collect();
        assert_eq!(order, vec![0, 2, 3]);
    }
}
