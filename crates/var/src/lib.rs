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

//! The primitive value types shared across the trigger engine: script
//! variables (`Var`), interned names (`Symbol`), stable entity handles
//! (`Uid`), and the compiled trigger program model.

pub mod program;
mod symbol;
mod uid;
mod var;
mod variant;

pub use symbol::Symbol;
pub use uid::{EntityKind, NOTHING, UID_PARTITION, Uid};
pub use var::{Var, VarError, v_bool, v_float, v_int, v_none, v_str, v_string, v_uid};
pub use variant::Variant;
