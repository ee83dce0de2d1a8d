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

//! The seam between the trigger engine and the rest of the game. The engine
//! never touches entity storage directly: reads and effect primitives all go
//! through this trait, injected at each hook call, so tests substitute a
//! fake and the engine stays ignorant of the host's data layout.

use crate::model::TriggerId;
use ember_var::{EntityKind, Symbol, Uid, Var};
use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum WorldError {
    #[error("no such entity: {0}")]
    NoSuchEntity(Uid),
    #[error("no prototype {vnum} for {kind}")]
    NoSuchPrototype { kind: EntityKind, vnum: u32 },
    #[error("effect not applicable: {0}")]
    NotApplicable(String),
}

/// A fully-resolved effect primitive, ready for the host to apply. The
/// driver evaluates all argument expressions before building one of these,
/// so the host never sees script state.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectRequest {
    ModifyAttr {
        target: Uid,
        attr: Symbol,
        value: Var,
    },
    ApplyAffect {
        target: Uid,
        affect: Symbol,
        duration_secs: i64,
        modifier: i64,
    },
    RemoveAffect {
        target: Uid,
        affect: Symbol,
    },
    Damage {
        target: Uid,
        amount: i64,
    },
    Heal {
        target: Uid,
        amount: i64,
    },
    Teleport {
        target: Uid,
        to: Uid,
    },
    Terraform {
        room: Uid,
        sector: i64,
    },
    DeedToEmpire {
        target: Uid,
        empire: Uid,
    },
    /// Create an entity from a template. The engine has already allocated
    /// `uid` in its lookup table; the host instantiates the entity under
    /// that identity.
    LoadEntity {
        uid: Uid,
        kind: EntityKind,
        vnum: u32,
        location: Uid,
    },
    Purge {
        target: Uid,
    },
    Echo {
        location: Uid,
        text: String,
    },
}

/// An entity the host created while applying an effect, along with the
/// trigger prototypes its template says to attach. The engine attaches them
/// and fires the Load dispatch, depth-bounded with the invoking script.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEntity {
    pub uid: Uid,
    pub triggers: Vec<TriggerId>,
}

/// What applying an effect did beyond its direct mutation. Loaded entities
/// get nested Load dispatches; purged ones feed the purge tracker and, when
/// one of them owns the running script, stop it at the next statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectOutcome {
    pub loaded: Vec<LoadedEntity>,
    pub purged: Vec<Uid>,
}

impl EffectOutcome {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Host-side world state, as visible to running scripts and dispatch hooks.
///
/// Reads take `&self`; the single mutating entry point is `apply`. An effect
/// either applies wholly or fails with an error the driver logs and skips —
/// there is no partial application for a script to observe.
pub trait World {
    /// Read a named attribute of an entity. `None` if the entity or the
    /// attribute doesn't exist; the script sees a null value.
    fn attr(&self, entity: Uid, name: Symbol) -> Option<Var>;

    /// The room an entity is in (or `None` for rooms themselves and for
    /// entities nowhere in the world).
    fn location_of(&self, entity: Uid) -> Option<Uid>;

    /// Everything directly inside a room: mobs, players, objects, vehicles.
    fn contents(&self, room: Uid) -> Vec<Uid>;

    /// Objects carried or worn by a character.
    fn inventory(&self, holder: Uid) -> Vec<Uid>;

    /// Whether any player is close enough that random triggers here should
    /// run. Global-flagged triggers bypass this gate.
    fn players_nearby(&self, room: Uid) -> bool;

    /// Apply one effect primitive.
    fn apply(&mut self, effect: EffectRequest) -> Result<EffectOutcome, WorldError>;
}
