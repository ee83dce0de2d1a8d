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

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Width of each kind's id range. Ranges are laid out in `EntityKind` order,
/// so the kind of an entity is recoverable from the bare number.
pub const UID_PARTITION: u64 = 10_000_000;

/// Used throughout to refer to a missing entity.
pub const NOTHING: Uid = Uid(u64::MAX);

/// The kinds of game entity a UID can name. `Player` and `Mob` are distinct
/// ranges even though both walk and talk; only the kinds listed in
/// `AttachKind` ever carry scripts.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Mob,
    Empire,
    Room,
    Vehicle,
    Obj,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Player,
        EntityKind::Mob,
        EntityKind::Empire,
        EntityKind::Room,
        EntityKind::Vehicle,
        EntityKind::Obj,
    ];

    /// First id in this kind's range.
    pub const fn base(&self) -> u64 {
        (*self as u64) * UID_PARTITION
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Mob => "mob",
            EntityKind::Empire => "empire",
            EntityKind::Room => "room",
            EntityKind::Vehicle => "vehicle",
            EntityKind::Obj => "obj",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A stable numeric handle for a game entity, issued once at creation and
/// never reused for the entity's lifetime. Scripts hold these instead of
/// pointers; only the entity lookup table resolves them.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Uid(u64);

impl Uid {
    /// Build a UID from a kind and a sequence number within that kind's range.
    pub const fn mk(kind: EntityKind, seq: u64) -> Self {
        assert!(seq < UID_PARTITION);
        Uid(kind.base() + seq)
    }

    pub const fn from_raw(raw: u64) -> Self {
        Uid(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_nothing(&self) -> bool {
        *self == NOTHING
    }

    /// The kind encoded in this id's range, or `None` for out-of-range values
    /// (including `NOTHING`).
    pub fn kind(&self) -> Option<EntityKind> {
        let idx = self.0 / UID_PARTITION;
        EntityKind::ALL.get(idx as usize).copied()
    }
}

impl Display for Uid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_nothing() {
            f.write_str("#nothing")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

impl Debug for Uid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "Uid({}:{})", kind, self.0 - kind.base()),
            None => f.write_str("Uid(nothing)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_recoverable_from_value() {
        for kind in EntityKind::ALL {
            let uid = Uid::mk(kind, 42);
            assert_eq!(uid.kind(), Some(kind));
        }
    }

    #[test]
    fn nothing_has_no_kind() {
        assert_eq!(NOTHING.kind(), None);
        assert!(NOTHING.is_nothing());
    }

    #[test]
    fn ranges_do_not_collide() {
        let mob = Uid::mk(EntityKind::Mob, 0);
        let room = Uid::mk(EntityKind::Room, 0);
        assert_ne!(mob, room);
        assert_eq!(mob.raw(), UID_PARTITION);
        assert_eq!(room.raw(), 3 * UID_PARTITION);
    }
}
