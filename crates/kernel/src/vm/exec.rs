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
use crate::script::{TrigState, TriggerInstance, VarEnv};
use crate::tasks::{PurgeTracker, WaitQueue};
use crate::vm::{AbortReason, EvalScope, RunDisposition, RunMode};
use ember_common::{EffectOutcome, EffectRequest, HookOutcome, World};
use ember_var::program::{EffectCall, Expr, Op, VarScope, WaitUnit};
use ember_var::Uid;
use smallvec::SmallVec;
use tracing::{debug, error, warn};

/// Everything one driver activation needs from the engine, borrowed for the
/// duration of the call. The engine removes the owner's container from its
/// map before building one of these, so the activation holds the only
/// mutable path to that container's state.
pub struct DriverCtx<'a> {
    pub config: &'a Config,
    pub lookup: &'a mut EntityLookup,
    pub purges: &'a mut PurgeTracker,
    pub waits: &'a mut WaitQueue,
    pub world: &'a mut dyn World,
    /// Current absolute pulse; wait deadlines are computed against this.
    pub pulse: u64,
    /// Entities the world reported as created while this activation ran.
    /// The engine attaches their template triggers and fires Load dispatches
    /// after the activation returns.
    pub loaded: Vec<ember_common::LoadedEntity>,
    /// Entities destroyed while this activation ran. Already removed from
    /// the lookup table and flagged in the purge tracker; the engine still
    /// has to drop their containers.
    pub purged: Vec<Uid>,
}

/// Run one instance until it finishes, suspends, aborts, or loses its owner.
///
/// `entity_vars` and `context` belong to the owner's container; the instance
/// itself carries the pc (inside its state), its locals, and the loop
/// counter.
pub fn run(
    ctx: &mut DriverCtx,
    owner: Uid,
    inst: &mut TriggerInstance,
    entity_vars: &mut VarEnv,
    context: &mut i64,
    mode: RunMode,
) -> RunDisposition {
    let program = inst.prototype.program.clone();
    let ops = program.ops();

    let mut pc = match mode {
        RunMode::New => {
            inst.vars.clear();
            inst.loops = 0;
            0
        }
        RunMode::Resume => match inst.state {
            TrigState::Suspended { pc } => pc,
            state => {
                warn!(trigger = %inst.prototype.id, ?state, "resume of non-suspended instance ignored");
                return RunDisposition::Finished(HookOutcome::Continue);
            }
        },
    };
    inst.state = TrigState::Running;
    inst.wait = None;

    let mut outcome = HookOutcome::Continue;
    loop {
        // Falling off the end finishes the activation.
        if pc >= ops.len() {
            inst.finish();
            return RunDisposition::Finished(outcome);
        }
        match &ops[pc] {
            Op::Jump { label } => {
                let target = label.0 as usize;
                if target <= pc
                    && let Some(disposition) = note_backjump(ctx, owner, inst, target)
                {
                    return disposition;
                }
                pc = target;
            }
            Op::JumpIfFalse { cond, label } => {
                if eval(ctx, inst, entity_vars, *context, owner, cond).is_true() {
                    pc += 1;
                } else {
                    let target = label.0 as usize;
                    if target <= pc
                        && let Some(disposition) = note_backjump(ctx, owner, inst, target)
                    {
                        return disposition;
                    }
                    pc = target;
                }
            }
            Op::Set { scope, name, value } => {
                let v = eval(ctx, inst, entity_vars, *context, owner, value);
                match scope {
                    VarScope::Local => inst.vars.set(*name, 0, v),
                    VarScope::Entity => entity_vars.set(*name, *context, v),
                }
                pc += 1;
            }
            Op::Unset { scope, name } => {
                match scope {
                    VarScope::Local => {
                        inst.vars.unset(*name, 0);
                    }
                    VarScope::Entity => {
                        entity_vars.unset(*name, *context);
                    }
                }
                pc += 1;
            }
            Op::SetContext { value } => {
                let v = eval(ctx, inst, entity_vars, *context, owner, value);
                *context = v.as_int().unwrap_or(0);
                pc += 1;
            }
            Op::Wait { amount, unit } => {
                let v = eval(ctx, inst, entity_vars, *context, owner, amount);
                let n = v.as_int().unwrap_or(1).max(1) as u64;
                let pulses = match unit {
                    WaitUnit::Pulses => n,
                    WaitUnit::Seconds => n * ctx.config.pulses_per_second,
                    WaitUnit::MudHours => {
                        n * ctx.config.seconds_per_mud_hour * ctx.config.pulses_per_second
                    }
                };
                suspend(ctx, owner, inst, pc + 1, pulses);
                return RunDisposition::Suspended;
            }
            Op::Effect(call) => {
                pc += 1;
                let Some(request) = resolve_effect(ctx, inst, entity_vars, *context, owner, call)
                else {
                    continue;
                };
                // If the world rejects a load, the speculatively-issued
                // UID must be withdrawn.
                let allocated = match &request {
                    EffectRequest::LoadEntity { uid, .. } => Some(*uid),
                    _ => None,
                };
                match ctx.world.apply(request) {
                    Ok(out) => {
                        if absorb_outcome(ctx, owner, out) {
                            inst.finish();
                            return RunDisposition::OwnerPurged;
                        }
                    }
                    Err(e) => {
                        if let Some(uid) = allocated {
                            ctx.lookup.remove(uid);
                        }
                        warn!(trigger = %inst.prototype.id, owner = %owner,
                              effect = call.name(), error = %e, "effect failed, skipping");
                    }
                }
            }
            Op::Return { value } => {
                let v = eval(ctx, inst, entity_vars, *context, owner, value);
                outcome = if v.as_int() == Some(-1) {
                    HookOutcome::BlockSilently
                } else if v.is_true() {
                    HookOutcome::Continue
                } else {
                    HookOutcome::Block
                };
                pc += 1;
            }
            Op::Halt => {
                inst.finish();
                return RunDisposition::Finished(outcome);
            }
            Op::Nop => pc += 1,
        }
    }
}

fn eval(
    ctx: &DriverCtx,
    inst: &TriggerInstance,
    entity_vars: &VarEnv,
    context: i64,
    owner: Uid,
    expr: &Expr,
) -> ember_var::Var {
    EvalScope {
        locals: &inst.vars,
        entity: entity_vars,
        context,
        owner,
        world: &*ctx.world,
    }
    .eval(expr)
}

/// Account for a backward jump: abort past the hard ceiling, force a
/// one-pulse wait every `loop_auto_wait_slice` iterations so a busy loop
/// yields the pulse to everyone else.
fn note_backjump(
    ctx: &mut DriverCtx,
    owner: Uid,
    inst: &mut TriggerInstance,
    resume_pc: usize,
) -> Option<RunDisposition> {
    inst.loops += 1;
    if inst.loops >= ctx.config.max_loop_iterations {
        error!(trigger = %inst.prototype.id, owner = %owner, loops = inst.loops,
               "runaway loop, aborting activation");
        inst.finish();
        return Some(RunDisposition::Aborted(AbortReason::LoopExceeded));
    }
    if inst.loops % ctx.config.loop_auto_wait_slice == 0 {
        debug!(trigger = %inst.prototype.id, owner = %owner, loops = inst.loops,
               "loop slice spent, yielding one pulse");
        suspend(ctx, owner, inst, resume_pc, 1);
        return Some(RunDisposition::Suspended);
    }
    None
}

/// Park the instance: queue the wake-up, register the purge record (owner
/// first, then one referenced entity per kind), save the resume point.
fn suspend(ctx: &mut DriverCtx, owner: Uid, inst: &mut TriggerInstance, resume_pc: usize, delay: u64) {
    let handle = ctx.waits.enqueue(ctx.pulse + delay, owner, inst.id);
    let refs = watch_refs(owner, &inst.vars);
    ctx.purges.create(inst.id, owner, refs);
    inst.wait = Some(handle);
    inst.state = TrigState::Suspended { pc: resume_pc };
}

fn watch_refs(owner: Uid, vars: &VarEnv) -> SmallVec<[Uid; 4]> {
    let mut refs: SmallVec<[Uid; 4]> = SmallVec::new();
    for uid in vars.referenced_uids() {
        if uid == owner || uid.is_nothing() {
            continue;
        }
        let Some(kind) = uid.kind() else {
            continue;
        };
        if refs.iter().any(|r| r.kind() == Some(kind)) {
            continue;
        }
        refs.push(uid);
    }
    refs
}

/// Fold an effect's side outcome into the activation. Purged entities leave
/// the lookup table immediately, before the next statement can resolve
/// them. Returns whether the owner itself was among the purged.
fn absorb_outcome(ctx: &mut DriverCtx, owner: Uid, out: EffectOutcome) -> bool {
    let mut owner_gone = false;
    ctx.loaded.extend(out.loaded);
    for uid in out.purged {
        ctx.lookup.remove(uid);
        ctx.purges.notify_purged(uid);
        ctx.purged.push(uid);
        if uid == owner {
            owner_gone = true;
        }
    }
    owner_gone
}

/// Evaluate an effect's arguments down to a host-ready request. A target
/// that doesn't resolve to an entity makes the whole call a logged no-op.
fn resolve_effect(
    ctx: &mut DriverCtx,
    inst: &TriggerInstance,
    entity_vars: &VarEnv,
    context: i64,
    owner: Uid,
    call: &EffectCall,
) -> Option<EffectRequest> {
    let need_uid = |ctx: &DriverCtx, e: &Expr| -> Option<Uid> {
        let v = eval(ctx, inst, entity_vars, context, owner, e);
        // A reference to an entity purged earlier in this same activation
        // is as dead as any other dangling one.
        let uid = v.as_uid().filter(|u| ctx.lookup.contains(*u));
        if uid.is_none() {
            debug!(trigger = %inst.prototype.id, effect = call.name(),
                   "target did not resolve to an entity, skipping");
        }
        uid
    };
    let as_int = |ctx: &DriverCtx, e: &Expr| -> i64 {
        eval(ctx, inst, entity_vars, context, owner, e)
            .as_int()
            .unwrap_or(0)
    };

    match call {
        EffectCall::ModifyAttr { target, attr, value } => {
            let target = need_uid(ctx, target)?;
            let value = eval(ctx, inst, entity_vars, context, owner, value);
            Some(EffectRequest::ModifyAttr {
                target,
                attr: *attr,
                value,
            })
        }
        EffectCall::ApplyAffect {
            target,
            affect,
            duration,
            modifier,
        } => {
            let target = need_uid(ctx, target)?;
            Some(EffectRequest::ApplyAffect {
                target,
                affect: *affect,
                duration_secs: as_int(ctx, duration),
                modifier: as_int(ctx, modifier),
            })
        }
        EffectCall::RemoveAffect { target, affect } => {
            let target = need_uid(ctx, target)?;
            Some(EffectRequest::RemoveAffect {
                target,
                affect: *affect,
            })
        }
        EffectCall::Damage { target, amount } => {
            let target = need_uid(ctx, target)?;
            Some(EffectRequest::Damage {
                target,
                amount: as_int(ctx, amount),
            })
        }
        EffectCall::Heal { target, amount } => {
            let target = need_uid(ctx, target)?;
            Some(EffectRequest::Heal {
                target,
                amount: as_int(ctx, amount),
            })
        }
        EffectCall::Teleport { target, to } => {
            let target = need_uid(ctx, target)?;
            let to = need_uid(ctx, to)?;
            Some(EffectRequest::Teleport { target, to })
        }
        EffectCall::Terraform { room, sector } => {
            let room = need_uid(ctx, room)?;
            Some(EffectRequest::Terraform {
                room,
                sector: as_int(ctx, sector),
            })
        }
        EffectCall::DeedToEmpire { target, empire } => {
            let target = need_uid(ctx, target)?;
            let empire = need_uid(ctx, empire)?;
            Some(EffectRequest::DeedToEmpire { target, empire })
        }
        EffectCall::LoadEntity { kind, vnum, location } => {
            let location = need_uid(ctx, location)?;
            let vnum = as_int(ctx, vnum);
            if vnum < 0 {
                debug!(trigger = %inst.prototype.id, vnum, "negative load vnum, skipping");
                return None;
            }
            // The engine owns UID issue; the host creates the entity under
            // the identity handed to it.
            let uid = ctx.lookup.allocate(*kind);
            Some(EffectRequest::LoadEntity {
                uid,
                kind: *kind,
                vnum: vnum as u32,
                location,
            })
        }
        EffectCall::Purge { target } => {
            let target = need_uid(ctx, target)?;
            Some(EffectRequest::Purge { target })
        }
        EffectCall::Echo { location, text } => {
            let location = need_uid(ctx, location)?;
            let text = eval(ctx, inst, entity_vars, context, owner, text).to_string();
            Some(EffectRequest::Echo { location, text })
        }
    }
}
