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

mod events;
mod world;

pub use events::{AttachKind, DoorCommand, HookOutcome, TrigEvent};
pub use world::{EffectOutcome, EffectRequest, LoadedEntity, World, WorldError};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The virtual number identifying a trigger prototype, assigned by content
/// and stable across boots.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl Display for TriggerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}
