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

use crate::config::Config;
use crate::lookup::EntityLookup;
use crate::registry::TriggerPrototype;
use crate::script::{InstanceId, TrigState, TriggerInstance, VarEnv};
use crate::tasks::{PurgeTracker, WaitQueue};
use crate::vm::{AbortReason, DriverCtx, RunDisposition, RunMode, run};
use ahash::AHashMap;
use ember_common::{
    AttachKind, BitEnum, EffectOutcome, EffectRequest, HookOutcome, LoadedEntity, TrigEvent,
    TriggerId, World, WorldError,
};
use ember_var::program::{
    BinaryOp, EffectCall, Expr, Label, Op, Program, VarScope, WaitUnit,
};
use ember_var::{EntityKind, Symbol, Uid, Var, v_int, v_str, v_uid};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_case::test_case;

struct FakeWorld {
    attrs: AHashMap<(Uid, Symbol), Var>,
    applied: Vec<EffectRequest>,
}

impl FakeWorld {
    fn new() -> Self {
        Self {
            attrs: AHashMap::new(),
            applied: Vec::new(),
        }
    }
}

impl World for FakeWorld {
    fn attr(&self, entity: Uid, name: Symbol) -> Option<Var> {
        self.attrs.get(&(entity, name)).cloned()
    }

    fn location_of(&self, _entity: Uid) -> Option<Uid> {
        None
    }

    fn contents(&self, _room: Uid) -> Vec<Uid> {
        Vec::new()
    }

    fn inventory(&self, _holder: Uid) -> Vec<Uid> {
        Vec::new()
    }

    fn players_nearby(&self, _room: Uid) -> bool {
        true
    }

    fn apply(&mut self, effect: EffectRequest) -> Result<EffectOutcome, WorldError> {
        self.applied.push(effect.clone());
        match effect {
            EffectRequest::Purge { target } => Ok(EffectOutcome {
                loaded: vec![],
                purged: vec![target],
            }),
            EffectRequest::LoadEntity { uid, .. } => Ok(EffectOutcome {
                loaded: vec![LoadedEntity {
                    uid,
                    triggers: vec![],
                }],
                purged: vec![],
            }),
            _ => Ok(EffectOutcome::none()),
        }
    }
}

struct Rig {
    config: Config,
    lookup: EntityLookup,
    purges: PurgeTracker,
    waits: WaitQueue,
    world: FakeWorld,
    owner: Uid,
    entity_vars: VarEnv,
    context: i64,
}

impl Rig {
    fn new() -> Self {
        let mut lookup = EntityLookup::new();
        let owner = lookup.allocate(EntityKind::Mob);
        Self {
            config: Config::default(),
            lookup,
            purges: PurgeTracker::new(),
            waits: WaitQueue::new(),
            world: FakeWorld::new(),
            owner,
            entity_vars: VarEnv::new(),
            context: 0,
        }
    }

    fn run(&mut self, inst: &mut TriggerInstance, mode: RunMode) -> RunDisposition {
        let (d, _, _) = self.run_full(inst, mode);
        d
    }

    fn run_full(
        &mut self,
        inst: &mut TriggerInstance,
        mode: RunMode,
    ) -> (RunDisposition, Vec<LoadedEntity>, Vec<Uid>) {
        let mut ctx = DriverCtx {
            config: &self.config,
            lookup: &mut self.lookup,
            purges: &mut self.purges,
            waits: &mut self.waits,
            world: &mut self.world,
            pulse: 0,
            loaded: Vec::new(),
            purged: Vec::new(),
        };
        let d = run(
            &mut ctx,
            self.owner,
            inst,
            &mut self.entity_vars,
            &mut self.context,
            mode,
        );
        (d, ctx.loaded, ctx.purged)
    }
}

fn inst(ops: Vec<Op>) -> TriggerInstance {
    let proto = Arc::new(TriggerPrototype {
        id: TriggerId(1),
        name: "driver test".into(),
        attach: AttachKind::Mob,
        interest: BitEnum::new_with(TrigEvent::Speech),
        narg: 100,
        arg: None,
        allow_multiple: false,
        program: Program::new(ops),
    });
    TriggerInstance::new(InstanceId(1), proto)
}

fn sym(s: &str) -> Symbol {
    Symbol::mk(s)
}

fn read(s: &str) -> Expr {
    Expr::Read(sym(s))
}

fn val(v: Var) -> Expr {
    Expr::Value(v)
}

fn bin(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    Expr::Binary(op, Box::new(l), Box::new(r))
}

#[test]
fn straight_line_sets_entity_var() {
    let mut rig = Rig::new();
    let mut i = inst(vec![
        Op::Set {
            scope: VarScope::Local,
            name: sym("x"),
            value: val(v_int(4)),
        },
        Op::Set {
            scope: VarScope::Entity,
            name: sym("total"),
            value: bin(BinaryOp::Add, read("x"), val(v_int(3))),
        },
    ]);
    let d = rig.run(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Continue));
    assert_eq!(rig.entity_vars.get(sym("total"), 0), Some(&v_int(7)));
    // Locals are gone once the activation finishes.
    assert_eq!(i.state(), TrigState::Idle);
    assert!(i.vars.is_empty());
}

#[test]
fn conditional_branch_taken_on_false() {
    let mut rig = Rig::new();
    let mut i = inst(vec![
        Op::JumpIfFalse {
            cond: val(v_int(0)),
            label: Label(3),
        },
        Op::Set {
            scope: VarScope::Entity,
            name: sym("then"),
            value: val(v_int(1)),
        },
        Op::Halt,
        Op::Set {
            scope: VarScope::Entity,
            name: sym("else"),
            value: val(v_int(1)),
        },
    ]);
    rig.run(&mut i, RunMode::New);
    assert_eq!(rig.entity_vars.get(sym("then"), 0), None);
    assert_eq!(rig.entity_vars.get(sym("else"), 0), Some(&v_int(1)));
}

#[test_case(v_int(1), HookOutcome::Continue; "truthy passes")]
#[test_case(v_int(0), HookOutcome::Block; "falsy blocks")]
#[test_case(v_str(""), HookOutcome::Block; "empty string blocks")]
#[test_case(v_int(-1), HookOutcome::BlockSilently; "minus one blocks silently")]
fn return_value_maps_to_outcome(value: Var, expected: HookOutcome) {
    let mut rig = Rig::new();
    let mut i = inst(vec![Op::Return { value: val(value) }]);
    let d = rig.run(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Finished(expected));
}

#[test]
fn execution_continues_after_return() {
    let mut rig = Rig::new();
    let mut i = inst(vec![
        Op::Return { value: val(v_int(0)) },
        Op::Set {
            scope: VarScope::Entity,
            name: sym("after"),
            value: val(v_int(1)),
        },
    ]);
    let d = rig.run(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Block));
    assert_eq!(rig.entity_vars.get(sym("after"), 0), Some(&v_int(1)));
}

#[test]
fn wait_suspends_and_resume_continues() {
    let mut rig = Rig::new();
    let other = rig.lookup.allocate(EntityKind::Obj);
    let mut i = inst(vec![
        Op::Set {
            scope: VarScope::Local,
            name: sym("held"),
            value: val(v_uid(other)),
        },
        Op::Wait {
            amount: val(v_int(3)),
            unit: WaitUnit::Pulses,
        },
        Op::Set {
            scope: VarScope::Entity,
            name: sym("woke"),
            value: read("held"),
        },
    ]);
    let d = rig.run(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Suspended);
    assert_eq!(i.state(), TrigState::Suspended { pc: 2 });
    assert!(i.wait.is_some());
    assert_eq!(rig.waits.len(), 1);
    // Purge record watches the owner and the held object.
    let record = rig.purges.take(InstanceId(1)).unwrap();
    assert_eq!(record.watches.len(), 2);
    assert_eq!(record.watches[0].uid, rig.owner);

    let d = rig.run(&mut i, RunMode::Resume);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Continue));
    assert_eq!(rig.entity_vars.get(sym("woke"), 0), Some(&v_uid(other)));
}

#[test]
fn wait_seconds_converts_through_config() {
    let mut rig = Rig::new();
    let mut i = inst(vec![Op::Wait {
        amount: val(v_int(2)),
        unit: WaitUnit::Seconds,
    }]);
    rig.run(&mut i, RunMode::New);
    // 2s at 10 pulses/second: nothing due before pulse 20.
    assert!(rig.waits.collect_due(19).is_empty());
    assert_eq!(rig.waits.collect_due(20).len(), 1);
}

#[test]
fn busy_loop_yields_after_slice() {
    let mut rig = Rig::new();
    // x = 50; while (x) x = x - 1  -- longer than the slice, shorter than
    // the abort ceiling.
    let mut i = inst(vec![
        Op::Set {
            scope: VarScope::Local,
            name: sym("x"),
            value: val(v_int(50)),
        },
        Op::JumpIfFalse {
            cond: read("x"),
            label: Label(4),
        },
        Op::Set {
            scope: VarScope::Local,
            name: sym("x"),
            value: bin(BinaryOp::Sub, read("x"), val(v_int(1))),
        },
        Op::Jump { label: Label(1) },
    ]);
    let d = rig.run(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Suspended);
    assert_eq!(i.loops, rig.config.loop_auto_wait_slice);
    rig.purges.take(InstanceId(1)).unwrap();

    // Finishes on the second slice.
    let d = rig.run(&mut i, RunMode::Resume);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Continue));
}

#[test]
fn runaway_loop_aborted() {
    let mut rig = Rig::new();
    let mut slices = 0;
    let mut i = inst(vec![Op::Jump { label: Label(0) }]);
    let mut d = rig.run(&mut i, RunMode::New);
    while d == RunDisposition::Suspended {
        slices += 1;
        rig.purges.take(InstanceId(1)).unwrap();
        d = rig.run(&mut i, RunMode::Resume);
    }
    assert_eq!(d, RunDisposition::Aborted(AbortReason::LoopExceeded));
    assert_eq!(i.state(), TrigState::Idle);
    // 100-iteration ceiling reached in 30-iteration slices.
    assert_eq!(slices, 3);
}

#[test]
fn purging_own_owner_stops_activation() {
    let mut rig = Rig::new();
    let owner = rig.owner;
    let mut i = inst(vec![
        Op::Effect(EffectCall::Purge {
            target: Expr::SelfRef,
        }),
        Op::Set {
            scope: VarScope::Entity,
            name: sym("after"),
            value: val(v_int(1)),
        },
    ]);
    let (d, _, purged) = rig.run_full(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::OwnerPurged);
    assert_eq!(purged, vec![owner]);
    assert!(!rig.lookup.contains(owner));
    assert_eq!(rig.entity_vars.get(sym("after"), 0), None);
}

#[test]
fn purging_bystander_continues() {
    let mut rig = Rig::new();
    let victim = rig.lookup.allocate(EntityKind::Obj);
    let mut i = inst(vec![
        Op::Effect(EffectCall::Purge {
            target: val(v_uid(victim)),
        }),
        Op::Set {
            scope: VarScope::Entity,
            name: sym("after"),
            value: val(v_int(1)),
        },
    ]);
    let (d, _, purged) = rig.run_full(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Continue));
    assert_eq!(purged, vec![victim]);
    assert!(!rig.lookup.contains(victim));
    assert_eq!(rig.entity_vars.get(sym("after"), 0), Some(&v_int(1)));
}

#[test]
fn effect_against_freshly_purged_target_skipped() {
    let mut rig = Rig::new();
    let victim = rig.lookup.allocate(EntityKind::Obj);
    let mut i = inst(vec![
        Op::Effect(EffectCall::Purge {
            target: val(v_uid(victim)),
        }),
        Op::Effect(EffectCall::Damage {
            target: val(v_uid(victim)),
            amount: val(v_int(10)),
        }),
    ]);
    let d = rig.run(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Continue));
    // The host sees the purge but never a stale-UID damage after it.
    assert_eq!(
        rig.world.applied,
        vec![EffectRequest::Purge { target: victim }]
    );
}

#[test]
fn null_target_effect_skipped() {
    let mut rig = Rig::new();
    let mut i = inst(vec![Op::Effect(EffectCall::Damage {
        target: read("nobody"),
        amount: val(v_int(10)),
    })]);
    let d = rig.run(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Continue));
    assert!(rig.world.applied.is_empty());
}

#[test]
fn load_allocates_uid_before_host_sees_it() {
    let mut rig = Rig::new();
    let room = rig.lookup.allocate(EntityKind::Room);
    let mut i = inst(vec![Op::Effect(EffectCall::LoadEntity {
        kind: EntityKind::Mob,
        vnum: val(v_int(3000)),
        location: val(v_uid(room)),
    })]);
    let (d, loaded, _) = rig.run_full(&mut i, RunMode::New);
    assert_eq!(d, RunDisposition::Finished(HookOutcome::Continue));
    assert_eq!(loaded.len(), 1);
    let new_uid = loaded[0].uid;
    assert_eq!(new_uid.kind(), Some(EntityKind::Mob));
    assert!(rig.lookup.contains(new_uid));
    assert!(matches!(
        rig.world.applied[0],
        EffectRequest::LoadEntity { uid, vnum: 3000, .. } if uid == new_uid
    ));
}

#[test]
fn locals_shadow_entity_vars() {
    let mut rig = Rig::new();
    rig.entity_vars.set(sym("name"), 0, v_str("entity"));
    let mut i = inst(vec![
        Op::Set {
            scope: VarScope::Local,
            name: sym("name"),
            value: val(v_str("local")),
        },
        Op::Set {
            scope: VarScope::Entity,
            name: sym("seen"),
            value: read("name"),
        },
    ]);
    rig.run(&mut i, RunMode::New);
    assert_eq!(rig.entity_vars.get(sym("seen"), 0), Some(&v_str("local")));
}

#[test]
fn context_switch_partitions_entity_vars() {
    let mut rig = Rig::new();
    let mut i = inst(vec![
        Op::SetContext { value: val(v_int(7)) },
        Op::Set {
            scope: VarScope::Entity,
            name: sym("mark"),
            value: val(v_int(1)),
        },
    ]);
    rig.run(&mut i, RunMode::New);
    assert_eq!(rig.context, 7);
    assert_eq!(rig.entity_vars.get(sym("mark"), 7), Some(&v_int(1)));
    // Context 0 has no binding of its own.
    assert_eq!(rig.entity_vars.get(sym("mark"), 0), None);
    // Other contexts fall back to the default, which is empty too.
    assert_eq!(rig.entity_vars.get(sym("mark"), 3), None);
}

#[test]
fn attribute_reads_go_through_world() {
    let mut rig = Rig::new();
    let owner = rig.owner;
    rig.world.attrs.insert((owner, sym("health")), v_int(42));
    let mut i = inst(vec![Op::Set {
        scope: VarScope::Entity,
        name: sym("hp"),
        value: Expr::Attr {
            obj: Box::new(Expr::SelfRef),
            name: sym("health"),
        },
    }]);
    rig.run(&mut i, RunMode::New);
    assert_eq!(rig.entity_vars.get(sym("hp"), 0), Some(&v_int(42)));
}

#[test]
fn echo_renders_value_as_text() {
    let mut rig = Rig::new();
    let room = rig.lookup.allocate(EntityKind::Room);
    let mut i = inst(vec![Op::Effect(EffectCall::Echo {
        location: val(v_uid(room)),
        text: bin(BinaryOp::Add, val(v_str("count: ")), val(v_str("3"))),
    })]);
    rig.run(&mut i, RunMode::New);
    assert_eq!(
        rig.world.applied,
        vec![EffectRequest::Echo {
            location: room,
            text: "count: 3".into(),
        }]
    );
}
