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

//! The per-category hook surface. One function per observable game event;
//! the host calls these at the point where the event could still be
//! cancelled, and must honor the returned outcome.

use crate::dispatch::{EventVars, Gate};
use crate::engine::TriggerEngine;
use ember_common::{BitEnum, DoorCommand, HookOutcome, TrigEvent, World};
use ember_var::{EntityKind, Uid, v_int, v_str, v_uid};

fn of_kind(uids: &[Uid], kind: EntityKind) -> Vec<Uid> {
    uids.iter()
        .copied()
        .filter(|u| u.kind() == Some(kind))
        .collect()
}

impl TriggerEngine {
    /// Someone said something aloud. Fires speech triggers on every mob in
    /// the room and then on the room itself, in attach order; matching is
    /// against the prototype's phrase list.
    pub fn on_speech(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        speaker: Uid,
        text: &str,
    ) -> HookOutcome {
        let vars = EventVars::new()
            .with("actor", v_uid(speaker))
            .with("speech", v_str(text));
        let events = BitEnum::new_with(TrigEvent::Speech);
        let mut outcome = HookOutcome::Continue;
        for mob in of_kind(&world.contents(room), EntityKind::Mob) {
            if mob == speaker {
                continue;
            }
            let (o, _) = self.run_matching(world, mob, events, &vars, Gate::Speech(text));
            outcome = outcome.merge(o);
        }
        let (o, _) = self.run_matching(world, room, events, &vars, Gate::Speech(text));
        outcome.merge(o)
    }

    /// A player typed a command the normal parser is about to handle.
    /// Candidates are checked in the classic order: mobs in the room, then
    /// the actor's inventory, then objects in the room, then the room, then
    /// vehicles. The first trigger that runs decides: a truthy script result
    /// means the command was consumed and the parser must not see it.
    pub fn on_command(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        actor: Uid,
        typed: &str,
        argument: &str,
    ) -> HookOutcome {
        let vars = EventVars::new()
            .with("actor", v_uid(actor))
            .with("cmd", v_str(typed))
            .with("arg", v_str(argument));
        let events = BitEnum::new_with(TrigEvent::Command);
        let contents = world.contents(room);
        let mut candidates = of_kind(&contents, EntityKind::Mob);
        candidates.extend(world.inventory(actor));
        candidates.extend(of_kind(&contents, EntityKind::Obj));
        candidates.push(room);
        candidates.extend(of_kind(&contents, EntityKind::Vehicle));

        for owner in candidates {
            let (outcome, ran) = self.run_matching(world, owner, events, &vars, Gate::Command(typed));
            if ran > 0 {
                // Inverted sense: the script returning false declines the
                // command and lets it fall through to the parser.
                return if outcome.blocks() {
                    HookOutcome::Continue
                } else {
                    HookOutcome::Block
                };
            }
        }
        HookOutcome::Continue
    }

    /// A character arrived in a room. Greet triggers on the mobs and
    /// vehicles already there, then the room's own enter trigger; any block
    /// bounces the mover back where they came from.
    pub fn on_enter(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        mover: Uid,
        direction: Option<&str>,
    ) -> HookOutcome {
        let mut vars = EventVars::new().with("actor", v_uid(mover));
        if let Some(dir) = direction {
            vars = vars.with("direction", v_str(dir));
        }
        let greet = BitEnum::new_with(TrigEvent::Greet) | TrigEvent::GreetAll;
        let contents = world.contents(room);
        let mut outcome = HookOutcome::Continue;
        for mob in of_kind(&contents, EntityKind::Mob) {
            if mob == mover {
                continue;
            }
            let (o, _) = self.run_matching(world, mob, greet, &vars, Gate::Percent);
            outcome = outcome.merge(o);
            if outcome.blocks() {
                return outcome;
            }
        }
        for vehicle in of_kind(&contents, EntityKind::Vehicle) {
            let (o, _) = self.run_matching(
                world,
                vehicle,
                BitEnum::new_with(TrigEvent::Greet),
                &vars,
                Gate::Percent,
            );
            outcome = outcome.merge(o);
            if outcome.blocks() {
                return outcome;
            }
        }
        let (o, _) = self.run_matching(
            world,
            room,
            BitEnum::new_with(TrigEvent::Enter),
            &vars,
            Gate::Percent,
        );
        outcome.merge(o)
    }

    /// The mover's own entry trigger, fired after it arrives somewhere.
    pub fn on_entry(&mut self, world: &mut dyn World, mover: Uid) -> HookOutcome {
        let (o, _) = self.run_matching(
            world,
            mover,
            BitEnum::new_with(TrigEvent::Entry),
            &EventVars::new(),
            Gate::Percent,
        );
        o
    }

    /// A character is about to leave a room; blockable by the mobs,
    /// objects, vehicles present and by the room itself.
    pub fn on_leave(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        mover: Uid,
        direction: Option<&str>,
    ) -> HookOutcome {
        let mut vars = EventVars::new().with("actor", v_uid(mover));
        if let Some(dir) = direction {
            vars = vars.with("direction", v_str(dir));
        }
        let mob_events = BitEnum::new_with(TrigEvent::Leave) | TrigEvent::LeaveAll;
        let leave = BitEnum::new_with(TrigEvent::Leave);
        let contents = world.contents(room);
        let mut outcome = HookOutcome::Continue;
        for mob in of_kind(&contents, EntityKind::Mob) {
            if mob == mover {
                continue;
            }
            let (o, _) = self.run_matching(world, mob, mob_events, &vars, Gate::Percent);
            outcome = outcome.merge(o);
            if outcome.blocks() {
                return outcome;
            }
        }
        for other in contents
            .iter()
            .copied()
            .filter(|u| matches!(u.kind(), Some(EntityKind::Obj | EntityKind::Vehicle)))
        {
            let (o, _) = self.run_matching(world, other, leave, &vars, Gate::Percent);
            outcome = outcome.merge(o);
            if outcome.blocks() {
                return outcome;
            }
        }
        let (o, _) = self.run_matching(world, room, leave, &vars, Gate::Percent);
        outcome.merge(o)
    }

    /// The victim is about to die. A block here cancels the death itself
    /// (the classic "not yet" resurrection trigger).
    pub fn on_death(
        &mut self,
        world: &mut dyn World,
        victim: Uid,
        killer: Option<Uid>,
    ) -> HookOutcome {
        let mut vars = EventVars::new();
        if let Some(k) = killer {
            vars = vars.with("actor", v_uid(k));
        }
        let (o, _) = self.run_matching(
            world,
            victim,
            BitEnum::new_with(TrigEvent::Death),
            &vars,
            Gate::Percent,
        );
        o
    }

    /// One combat round elapsed with the owner fighting.
    pub fn on_fight_tick(&mut self, world: &mut dyn World, fighter: Uid, opponent: Uid) {
        let vars = EventVars::new().with("actor", v_uid(opponent));
        let _ = self.run_matching(
            world,
            fighter,
            BitEnum::new_with(TrigEvent::Fight),
            &vars,
            Gate::Percent,
        );
    }

    /// A freshly created entity's load trigger. Also fired internally for
    /// entities that scripts load.
    pub fn on_load(&mut self, world: &mut dyn World, entity: Uid) {
        let _ = self.run_matching(
            world,
            entity,
            BitEnum::new_with(TrigEvent::Load),
            &EventVars::new(),
            Gate::Percent,
        );
    }

    /// One character hands an object to another. The object's give trigger
    /// and the receiver's receive trigger both get a veto.
    pub fn on_give(
        &mut self,
        world: &mut dyn World,
        giver: Uid,
        receiver: Uid,
        object: Uid,
    ) -> HookOutcome {
        let obj_vars = EventVars::new()
            .with("actor", v_uid(giver))
            .with("victim", v_uid(receiver));
        let (outcome, _) = self.run_matching(
            world,
            object,
            BitEnum::new_with(TrigEvent::Give),
            &obj_vars,
            Gate::Percent,
        );
        if outcome.blocks() {
            return outcome;
        }
        let recv_vars = EventVars::new()
            .with("actor", v_uid(giver))
            .with("object", v_uid(object));
        let (o, _) = self.run_matching(
            world,
            receiver,
            BitEnum::new_with(TrigEvent::Receive),
            &recv_vars,
            Gate::Percent,
        );
        outcome.merge(o)
    }

    /// Coins offered to a mob. Fires only when the amount reaches the
    /// prototype's threshold.
    pub fn on_bribe(
        &mut self,
        world: &mut dyn World,
        mob: Uid,
        briber: Uid,
        amount: i64,
    ) -> HookOutcome {
        let vars = EventVars::new()
            .with("actor", v_uid(briber))
            .with("amount", v_int(amount));
        let (o, _) = self.run_matching(
            world,
            mob,
            BitEnum::new_with(TrigEvent::Bribe),
            &vars,
            Gate::Amount(amount),
        );
        o
    }

    /// A character used an ability; mobs present and the room may react or
    /// veto it.
    pub fn on_ability(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        actor: Uid,
        ability: &str,
    ) -> HookOutcome {
        let vars = EventVars::new()
            .with("actor", v_uid(actor))
            .with("ability", v_str(ability));
        let events = BitEnum::new_with(TrigEvent::Ability);
        let mut outcome = HookOutcome::Continue;
        for mob in of_kind(&world.contents(room), EntityKind::Mob) {
            if mob == actor {
                continue;
            }
            let (o, _) = self.run_matching(world, mob, events, &vars, Gate::Percent);
            outcome = outcome.merge(o);
        }
        let (o, _) = self.run_matching(world, room, events, &vars, Gate::Percent);
        outcome.merge(o)
    }

    /// A purchase from a scripted shopkeeper.
    pub fn on_buy(
        &mut self,
        world: &mut dyn World,
        shopkeeper: Uid,
        buyer: Uid,
        object: Uid,
        cost: i64,
    ) -> HookOutcome {
        let vars = EventVars::new()
            .with("actor", v_uid(buyer))
            .with("object", v_uid(object))
            .with("cost", v_int(cost));
        let (o, _) = self.run_matching(
            world,
            shopkeeper,
            BitEnum::new_with(TrigEvent::Buy),
            &vars,
            Gate::Percent,
        );
        o
    }

    pub fn on_quest_start(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        actor: Uid,
        quest: i64,
    ) -> HookOutcome {
        self.quest_dispatch(world, room, actor, quest, TrigEvent::QuestStart)
    }

    pub fn on_quest_finish(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        actor: Uid,
        quest: i64,
    ) -> HookOutcome {
        self.quest_dispatch(world, room, actor, quest, TrigEvent::QuestFinish)
    }

    fn quest_dispatch(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        actor: Uid,
        quest: i64,
        event: TrigEvent,
    ) -> HookOutcome {
        let vars = EventVars::new()
            .with("actor", v_uid(actor))
            .with("quest", v_int(quest));
        let events = BitEnum::new_with(event);
        let contents = world.contents(room);
        let mut outcome = HookOutcome::Continue;
        for owner in contents
            .iter()
            .copied()
            .filter(|u| matches!(u.kind(), Some(EntityKind::Mob | EntityKind::Vehicle)))
            .chain([room])
        {
            if owner == actor {
                continue;
            }
            let (o, _) = self.run_matching(world, owner, events, &vars, Gate::Percent);
            outcome = outcome.merge(o);
            if outcome.blocks() {
                return outcome;
            }
        }
        outcome
    }

    /// An object's countdown expired.
    pub fn on_timer(&mut self, world: &mut dyn World, object: Uid) {
        let _ = self.run_matching(
            world,
            object,
            BitEnum::new_with(TrigEvent::Timer),
            &EventVars::new(),
            Gate::Always,
        );
    }

    /// Someone is manipulating a door in the room.
    pub fn on_door(
        &mut self,
        world: &mut dyn World,
        room: Uid,
        actor: Uid,
        command: DoorCommand,
        direction: &str,
    ) -> HookOutcome {
        let vars = EventVars::new()
            .with("actor", v_uid(actor))
            .with("cmd", v_str(&command.to_string()))
            .with("direction", v_str(direction));
        let (o, _) = self.run_matching(
            world,
            room,
            BitEnum::new_with(TrigEvent::Door),
            &vars,
            Gate::Always,
        );
        o
    }

    /// A vehicle is about to be destroyed; its script may veto.
    pub fn on_destroy_vehicle(&mut self, world: &mut dyn World, vehicle: Uid) -> HookOutcome {
        let (o, _) = self.run_matching(
            world,
            vehicle,
            BitEnum::new_with(TrigEvent::Destroy),
            &EventVars::new(),
            Gate::Always,
        );
        o
    }

    /// Server came back up: every reboot trigger in the world runs once.
    pub fn on_reboot(&mut self, world: &mut dyn World) {
        let events = BitEnum::new_with(TrigEvent::Reboot);
        for owner in self.owners_with_interest(events) {
            let _ = self.run_matching(world, owner, events, &EventVars::new(), Gate::Always);
        }
    }
}
