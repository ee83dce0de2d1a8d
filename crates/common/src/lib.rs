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

//! Shared model types between the trigger kernel and the host game:
//! event categories and interest masks, the attach-kind taxonomy, and the
//! `World` trait the engine calls effects through.

pub mod model;
pub mod util;

pub use model::{
    AttachKind, DoorCommand, EffectOutcome, EffectRequest, HookOutcome, LoadedEntity, TrigEvent,
    TriggerId, World, WorldError,
};
pub use util::BitEnum;
