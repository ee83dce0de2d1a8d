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

//! The trigger engine proper: owns the prototype registry, the per-entity
//! script containers, the entity lookup table, and the suspension
//! bookkeeping. Single-threaded by design; the host calls in from its main
//! loop, once per pulse plus once per observable event.

use crate::config::Config;
use crate::dispatch::{EventVars, Gate, RandomIndex};
use crate::lookup::EntityLookup;
use crate::registry::{RegistryError, TriggerPrototype, TriggerRegistry};
use crate::script::{InstanceId, ScriptContainer, TriggerInstance};
use crate::tasks::{PurgeTracker, WaitQueue};
use crate::vm::{AbortReason, DriverCtx, RunDisposition, RunMode, run};
use ahash::AHashMap;
use ember_common::{
    AttachKind, BitEnum, HookOutcome, LoadedEntity, TrigEvent, TriggerId, World,
};
use ember_var::{EntityKind, Symbol, Uid, Var};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum AttachError {
    #[error("no trigger {0} in the registry")]
    NoSuchTrigger(TriggerId),
    #[error("no such entity: {0}")]
    NoSuchEntity(Uid),
    #[error("trigger {trigger} attaches to {expected}, not to {entity:?}")]
    KindMismatch {
        trigger: TriggerId,
        expected: AttachKind,
        entity: Uid,
    },
    #[error("trigger {0} is not attached to {1}")]
    NotAttached(TriggerId, Uid),
}

pub struct TriggerEngine {
    config: Config,
    registry: TriggerRegistry,
    lookup: EntityLookup,
    containers: AHashMap<Uid, ScriptContainer>,
    waits: WaitQueue,
    purges: PurgeTracker,
    random_index: RandomIndex,
    /// Suspended instances whose owner died under them. They keep their
    /// wait-queue entries and purge records, and are freed when their
    /// scheduled resume fires and sees the owner-purged flag.
    orphans: AHashMap<InstanceId, TriggerInstance>,
    rng: SmallRng,
    next_instance: u64,
    /// Nonzero while any dispatch is on the stack. Guards the registry
    /// against edits mid-dispatch and bounds nested dispatch depth.
    dispatch_depth: usize,
    pulse: u64,
}

impl TriggerEngine {
    pub fn new(config: Config) -> Self {
        let rng = SmallRng::seed_from_u64(config.rng_seed);
        Self {
            config,
            registry: TriggerRegistry::new(),
            lookup: EntityLookup::new(),
            containers: AHashMap::new(),
            waits: WaitQueue::new(),
            purges: PurgeTracker::new(),
            random_index: RandomIndex::new(),
            orphans: AHashMap::new(),
            rng,
            next_instance: 0,
            dispatch_depth: 0,
            pulse: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pulse(&self) -> u64 {
        self.pulse
    }

    /// Register or replace a trigger prototype. Refused while any dispatch
    /// is in flight: running instances hold `Arc`s to the old prototype and
    /// a half-visible swap mid-dispatch would be unaccountable.
    pub fn define_trigger(&mut self, proto: TriggerPrototype) -> Result<(), RegistryError> {
        if self.dispatch_depth > 0 {
            return Err(RegistryError::Busy);
        }
        self.registry.define(proto)
    }

    pub fn trigger(&self, id: TriggerId) -> Option<Arc<TriggerPrototype>> {
        self.registry.lookup(id)
    }

    pub fn find_triggers_by_name(&self, needle: &str) -> Vec<Arc<TriggerPrototype>> {
        self.registry.find_by_name(needle)
    }

    /// Issue a UID for a newly created entity. Containers are created
    /// lazily at first attach; most entities never carry scripts.
    pub fn entity_created(&mut self, kind: EntityKind) -> Uid {
        self.lookup.allocate(kind)
    }

    pub fn entity_exists(&self, uid: Uid) -> bool {
        self.lookup.contains(uid)
    }

    /// An entity is being destroyed. The UID stops resolving first, then
    /// suspended watchers are flagged, then the container goes away; no
    /// script can observe the half-dead entity in between.
    pub fn entity_destroyed(&mut self, uid: Uid) {
        self.lookup.remove(uid);
        self.purges.notify_purged(uid);
        if let Some(sc) = self.containers.remove(&uid) {
            self.orphan_container(sc);
        }
        self.random_index.remove(uid);
    }

    /// Attach an instance of a registered trigger to an entity, at the end
    /// of the entity's run order.
    pub fn attach(&mut self, owner: Uid, trigger: TriggerId) -> Result<(), AttachError> {
        let proto = self
            .registry
            .lookup(trigger)
            .ok_or(AttachError::NoSuchTrigger(trigger))?;
        if !self.lookup.contains(owner) {
            return Err(AttachError::NoSuchEntity(owner));
        }
        let expected = match proto.attach {
            AttachKind::Mob => EntityKind::Mob,
            AttachKind::Obj => EntityKind::Obj,
            AttachKind::Room => EntityKind::Room,
            AttachKind::Vehicle => EntityKind::Vehicle,
        };
        if self.lookup.kind_of(owner) != Some(expected) {
            return Err(AttachError::KindMismatch {
                trigger,
                expected: proto.attach,
                entity: owner,
            });
        }
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let wants_random = proto.interest.contains(TrigEvent::Random);
        let sc = self
            .containers
            .entry(owner)
            .or_insert_with(|| ScriptContainer::new(owner));
        sc.attach(TriggerInstance::new(id, proto));
        if wants_random {
            self.random_index.add(owner);
        }
        Ok(())
    }

    /// Attach a template's whole trigger list, logging and skipping
    /// individual failures. Used for freshly loaded entities.
    pub fn attach_list(&mut self, owner: Uid, triggers: &[TriggerId]) {
        for &t in triggers {
            if let Err(e) = self.attach(owner, t) {
                warn!(entity = %owner, trigger = %t, error = %e, "attach failed");
            }
        }
    }

    /// Detach the first attached instance of the given trigger. A suspended
    /// instance loses its pending wake-up and purge record on the spot.
    pub fn detach(&mut self, owner: Uid, trigger: TriggerId) -> Result<(), AttachError> {
        let sc = self
            .containers
            .get_mut(&owner)
            .ok_or(AttachError::NotAttached(trigger, owner))?;
        let iid = sc
            .instances
            .iter()
            .find(|i| i.prototype().id == trigger)
            .map(|i| i.id())
            .ok_or(AttachError::NotAttached(trigger, owner))?;
        let inst = sc.detach(iid).expect("instance just located");
        let empty = sc.is_empty();
        let still_random = sc.has_interest(BitEnum::new_with(TrigEvent::Random));
        if let Some(handle) = inst.wait {
            self.waits.cancel(handle);
        }
        self.purges.take(iid);
        if !still_random {
            self.random_index.remove(owner);
        }
        if empty {
            self.containers.remove(&owner);
        }
        Ok(())
    }

    /// O(1) pre-check the host can use before paying for a dispatch.
    pub fn has_interest(&self, owner: Uid, events: BitEnum<TrigEvent>) -> bool {
        self.containers
            .get(&owner)
            .is_some_and(|sc| sc.has_interest(events))
    }

    pub fn container(&self, owner: Uid) -> Option<&ScriptContainer> {
        self.containers.get(&owner)
    }

    /// Read an entity-scoped script variable, honoring the container's
    /// current context.
    pub fn entity_var(&self, owner: Uid, name: Symbol) -> Option<Var> {
        let sc = self.containers.get(&owner)?;
        sc.vars.get(name, sc.context).cloned()
    }

    /// Set an entity-scoped variable from outside a script (quest code,
    /// admin tooling). Creates the container if the entity has none yet.
    pub fn set_entity_var(&mut self, owner: Uid, name: Symbol, value: Var) -> Result<(), AttachError> {
        if !self.lookup.contains(owner) {
            return Err(AttachError::NoSuchEntity(owner));
        }
        let sc = self
            .containers
            .entry(owner)
            .or_insert_with(|| ScriptContainer::new(owner));
        sc.vars.set(name, sc.context, value);
        Ok(())
    }

    pub fn unset_entity_var(&mut self, owner: Uid, name: Symbol) -> bool {
        match self.containers.get_mut(&owner) {
            Some(sc) => {
                let ctx = sc.context;
                sc.vars.unset(name, ctx)
            }
            None => false,
        }
    }

    /// Advance game time by one pulse: wake due waits, then poll this
    /// tick's slice of the random index.
    pub fn tick(&mut self, world: &mut dyn World) {
        self.pulse += 1;
        self.resume_due(world);
        self.poll_random(world);
    }

    /// Run every idle instance on `owner` whose interest intersects
    /// `events` and whose gate passes, in attach order. Returns the merged
    /// outcome and how many instances actually ran.
    ///
    /// The container is taken out of the map for the duration, so a nested
    /// dispatch landing on the same owner sees no scripts there; that
    /// mirrors the depth cutoff and keeps re-entry impossible.
    pub(crate) fn run_matching(
        &mut self,
        world: &mut dyn World,
        owner: Uid,
        events: BitEnum<TrigEvent>,
        vars: &EventVars,
        gate: Gate<'_>,
    ) -> (HookOutcome, usize) {
        if self.dispatch_depth >= self.config.max_script_depth {
            warn!(owner = %owner, depth = self.dispatch_depth,
                  reason = %AbortReason::DepthExceeded, "refusing nested dispatch");
            return (HookOutcome::Continue, 0);
        }
        let Some(mut sc) = self.containers.remove(&owner) else {
            return (HookOutcome::Continue, 0);
        };
        if !sc.has_interest(events) {
            self.containers.insert(owner, sc);
            return (HookOutcome::Continue, 0);
        }

        self.dispatch_depth += 1;
        let mut merged = HookOutcome::Continue;
        let mut ran = 0usize;
        let mut owner_gone = false;

        for idx in 0..sc.instances.len() {
            let proto = sc.instances[idx].prototype().clone();
            if !proto.interest.intersects(events) {
                continue;
            }
            if sc.instances[idx].state() != crate::script::TrigState::Idle {
                // Already suspended mid-script; it will not re-fire until
                // it finishes.
                continue;
            }
            if !gate.passes(&proto, &mut self.rng) {
                continue;
            }

            let ScriptContainer {
                instances,
                vars: entity_vars,
                context,
                ..
            } = &mut sc;
            let inst = &mut instances[idx];
            inst.vars.clear();
            for (name, value) in vars.iter() {
                inst.vars.set(*name, 0, value.clone());
            }
            inst.depth = self.dispatch_depth;

            let mut ctx = DriverCtx {
                config: &self.config,
                lookup: &mut self.lookup,
                purges: &mut self.purges,
                waits: &mut self.waits,
                world,
                pulse: self.pulse,
                loaded: Vec::new(),
                purged: Vec::new(),
            };
            let disposition = run(&mut ctx, owner, inst, entity_vars, context, RunMode::New);
            let loaded = std::mem::take(&mut ctx.loaded);
            let purged = std::mem::take(&mut ctx.purged);
            drop(ctx);
            ran += 1;

            self.settle_side_effects(world, loaded, purged, owner);

            match disposition {
                RunDisposition::Finished(outcome) => {
                    merged = merged.merge(outcome);
                    if outcome.blocks() && !proto.allow_multiple {
                        break;
                    }
                }
                RunDisposition::Suspended => {}
                RunDisposition::Aborted(reason) => {
                    debug!(trigger = %proto.id, owner = %owner, %reason, "activation aborted");
                }
                RunDisposition::OwnerPurged => {
                    owner_gone = true;
                    break;
                }
            }
            // A nested dispatch may have destroyed the owner while its
            // container was out of the map.
            if !self.lookup.contains(owner) {
                owner_gone = true;
                break;
            }
        }

        self.dispatch_depth -= 1;
        if owner_gone {
            self.orphan_container(sc);
            self.random_index.remove(owner);
        } else {
            self.containers.insert(owner, sc);
        }
        (merged, ran)
    }

    /// Apply what an activation did to the rest of the world: drop
    /// containers of purged bystanders, attach template triggers to loaded
    /// entities and give them their Load dispatch.
    fn settle_side_effects(
        &mut self,
        world: &mut dyn World,
        loaded: Vec<LoadedEntity>,
        purged: Vec<Uid>,
        running_owner: Uid,
    ) {
        for uid in purged {
            if uid == running_owner {
                // The running container is off the map; run_matching
                // orphans it when the driver reports OwnerPurged.
                continue;
            }
            if let Some(sc) = self.containers.remove(&uid) {
                self.orphan_container(sc);
            }
            self.random_index.remove(uid);
        }
        for entity in loaded {
            self.attach_list(entity.uid, &entity.triggers);
            let _ = self.run_matching(
                world,
                entity.uid,
                BitEnum::new_with(TrigEvent::Load),
                &EventVars::new().with("actor", ember_var::v_uid(running_owner)),
                Gate::Percent,
            );
        }
    }

    /// Suspended instances survive their container's death as orphans until
    /// their scheduled resume fires; idle ones are dropped now.
    fn orphan_container(&mut self, mut sc: ScriptContainer) {
        for inst in sc.instances.drain(..) {
            if inst.is_suspended() {
                self.orphans.insert(inst.id(), inst);
            }
        }
    }

    /// Wake every suspended instance whose deadline has passed.
    fn resume_due(&mut self, world: &mut dyn World) {
        for wake in self.waits.collect_due(self.pulse) {
            let Some(record) = self.purges.take(wake.instance) else {
                // Detached or otherwise cancelled after the wake-up was
                // queued; nothing to run.
                continue;
            };
            if record.owner_purged() {
                // This is where an orphan is actually freed.
                self.orphans.remove(&wake.instance);
                debug!(instance = %wake.instance, owner = %wake.owner,
                       "owner purged while suspended, discarding instance");
                continue;
            }
            let Some(mut sc) = self.containers.remove(&wake.owner) else {
                self.orphans.remove(&wake.instance);
                continue;
            };
            let Some(idx) = sc.index_of(wake.instance) else {
                self.containers.insert(wake.owner, sc);
                continue;
            };

            self.dispatch_depth += 1;
            let mut owner_gone = false;
            {
                let ScriptContainer {
                    instances,
                    vars: entity_vars,
                    context,
                    ..
                } = &mut sc;
                let inst = &mut instances[idx];
                // References to entities that died during the nap read as
                // null from here on.
                for uid in record.purged_refs() {
                    inst.vars.null_refs_to(uid);
                }
                let mut ctx = DriverCtx {
                    config: &self.config,
                    lookup: &mut self.lookup,
                    purges: &mut self.purges,
                    waits: &mut self.waits,
                    world,
                    pulse: self.pulse,
                    loaded: Vec::new(),
                    purged: Vec::new(),
                };
                let disposition =
                    run(&mut ctx, wake.owner, inst, entity_vars, context, RunMode::Resume);
                let loaded = std::mem::take(&mut ctx.loaded);
                let purged = std::mem::take(&mut ctx.purged);
                drop(ctx);
                self.settle_side_effects(world, loaded, purged, wake.owner);
                if matches!(disposition, RunDisposition::OwnerPurged) {
                    owner_gone = true;
                }
            }
            self.dispatch_depth -= 1;

            if owner_gone || !self.lookup.contains(wake.owner) {
                self.orphan_container(sc);
                self.random_index.remove(wake.owner);
            } else {
                self.containers.insert(wake.owner, sc);
            }
        }
    }

    /// Poll this tick's share of the random index. Non-global random
    /// triggers only fire with a player in earshot.
    fn poll_random(&mut self, world: &mut dyn World) {
        for owner in self.random_index.take_slice(self.config.random_scan_cycle) {
            let Some(sc) = self.containers.get(&owner) else {
                self.random_index.remove(owner);
                continue;
            };
            let exempt = sc.instances().any(|i| {
                i.prototype().interest.contains(TrigEvent::Random)
                    && i.prototype().interest.contains(TrigEvent::Global)
            });
            if !exempt {
                let room = if self.lookup.kind_of(owner) == Some(EntityKind::Room) {
                    Some(owner)
                } else {
                    world.location_of(owner)
                };
                let audible = room.is_some_and(|r| world.players_nearby(r));
                if !audible {
                    continue;
                }
            }
            let _ = self.run_matching(
                world,
                owner,
                BitEnum::new_with(TrigEvent::Random),
                &EventVars::new(),
                Gate::Percent,
            );
        }
    }

    /// Number of live suspended instances, orphaned or not. For host
    /// status reporting.
    pub fn suspended_count(&self) -> usize {
        self.purges.len()
    }

    /// Owners whose cached mask intersects `events`, in UID order so a
    /// sweep over them is deterministic.
    pub(crate) fn owners_with_interest(&self, events: BitEnum<TrigEvent>) -> Vec<Uid> {
        let mut owners: Vec<Uid> = self
            .containers
            .values()
            .filter(|sc| sc.has_interest(events))
            .map(|sc| sc.owner())
            .collect();
        owners.sort();
        owners
    }
}
