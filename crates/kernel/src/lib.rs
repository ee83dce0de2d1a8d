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

//! The trigger engine kernel: prototype registry, per-entity script
//! containers, the interpreter/driver with cooperative wait support, the
//! purge tracker that keeps suspended scripts safe across entity
//! destruction, and the typed dispatch hooks the rest of the game calls.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod lookup;
pub mod matching;
pub mod registry;
pub mod script;
pub mod tasks;
pub mod vm;

pub use config::Config;
pub use engine::{AttachError, TriggerEngine};
pub use registry::{RegistryError, TriggerPrototype, TriggerRegistry};
pub use script::{InstanceId, TrigState};
pub use vm::AbortReason;
