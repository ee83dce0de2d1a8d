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

use enum_primitive_derive::Primitive;
use serde::{Deserialize, Serialize};
use strum::Display;

/// The kinds of entity a trigger prototype can attach to. The driver takes
/// the owner as a `Uid` whose kind must match; there is no shared base type
/// between the four.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum AttachKind {
    Mob,
    Obj,
    Room,
    Vehicle,
}

/// Event categories a trigger can declare interest in. Each value is a bit
/// position in a `BitEnum<TrigEvent>` interest mask; a container's cached
/// mask is the union of its instances' prototype masks.
///
/// `Global` and `Random` are modifiers on the polling path rather than
/// dispatchable events: `Random` puts the owner in the per-tick random
/// index, `Global` exempts it from the players-nearby gate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Primitive, Display, Serialize, Deserialize)]
pub enum TrigEvent {
    Global = 0,
    Random = 1,
    Command = 2,
    Speech = 3,
    Death = 4,
    /// A visible character entered the owner mob's room.
    Greet = 5,
    /// Anything entered the room, visible or not.
    GreetAll = 6,
    /// The owner itself entered a room (mob or vehicle movement).
    Entry = 7,
    /// A character entered the owner room.
    Enter = 8,
    Receive = 9,
    /// Each combat pulse while the owner fights.
    Fight = 10,
    Bribe = 11,
    Load = 12,
    Ability = 13,
    Leave = 14,
    LeaveAll = 15,
    Door = 16,
    /// The owner object's timer expired.
    Timer = 17,
    Give = 18,
    Buy = 19,
    QuestStart = 20,
    QuestFinish = 21,
    Reboot = 22,
    /// The owner vehicle is about to be destroyed.
    Destroy = 23,
}

/// What a dispatch hook tells its caller. The caller must honor it: `Block`
/// cancels the player-facing action that raised the event, `BlockSilently`
/// cancels it without the caller emitting its own failure message.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Display)]
pub enum HookOutcome {
    Continue,
    Block,
    BlockSilently,
}

impl HookOutcome {
    pub fn blocks(&self) -> bool {
        !matches!(self, HookOutcome::Continue)
    }

    /// Combine outcomes across containers: the most severe wins.
    #[must_use]
    pub fn merge(self, other: HookOutcome) -> HookOutcome {
        match (self, other) {
            (HookOutcome::BlockSilently, _) | (_, HookOutcome::BlockSilently) => {
                HookOutcome::BlockSilently
            }
            (HookOutcome::Block, _) | (_, HookOutcome::Block) => HookOutcome::Block,
            _ => HookOutcome::Continue,
        }
    }
}

/// What the actor is doing to a door, for door triggers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DoorCommand {
    Open,
    Close,
    Lock,
    Unlock,
    Pick,
}
