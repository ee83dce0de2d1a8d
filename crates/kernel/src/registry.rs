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

use ahash::AHashMap;
use ember_common::{AttachKind, BitEnum, TrigEvent, TriggerId};
use ember_var::program::{Program, ProgramError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// The immutable, shared template for a trigger, produced by the content
/// loader and registered at boot. Instances hold an `Arc` to one of these
/// and never mutate it.
///
/// `narg` is overloaded per event category, following the original content
/// format: a percent chance for greet/random/fight/death/load-style
/// triggers, a minimum amount for bribe triggers, and a match mode for
/// speech (0 substring, 1 whole-word) and command (0 exact, 1 abbrev)
/// triggers. `arg` is the phrase or command name for speech/command
/// triggers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerPrototype {
    pub id: TriggerId,
    pub name: String,
    pub attach: AttachKind,
    pub interest: BitEnum<TrigEvent>,
    pub narg: i64,
    pub arg: Option<String>,
    /// When set, this prototype signaling "block" does not short-circuit
    /// later instances on the same container.
    pub allow_multiple: bool,
    pub program: Program,
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum RegistryError {
    #[error("trigger {0} failed validation: {1}")]
    Invalid(TriggerId, ProgramError),
    #[error("trigger registry is busy: a dispatch is in flight")]
    Busy,
}

/// The vnum-indexed prototype table. Loaded at boot, effectively read-only
/// at runtime; the engine serializes the explicit edit path against
/// execution by refusing `define` while any dispatch is in flight.
pub struct TriggerRegistry {
    table: AHashMap<TriggerId, Arc<TriggerPrototype>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self {
            table: AHashMap::new(),
        }
    }

    /// Register or replace a prototype. The program is validated first;
    /// anything malformed is a boot-time failure, so nothing invalid can
    /// ever reach the interpreter.
    pub fn define(&mut self, proto: TriggerPrototype) -> Result<(), RegistryError> {
        proto
            .program
            .validate()
            .map_err(|e| RegistryError::Invalid(proto.id, e))?;
        self.table.insert(proto.id, Arc::new(proto));
        Ok(())
    }

    /// Lookup by vnum. A miss is an explicit `None`, never a partial result.
    pub fn lookup(&self, id: TriggerId) -> Option<Arc<TriggerPrototype>> {
        self.table.get(&id).cloned()
    }

    /// Case-insensitive substring search over trigger names, for
    /// administrative tooling.
    pub fn find_by_name(&self, needle: &str) -> Vec<Arc<TriggerPrototype>> {
        let needle = needle.to_lowercase();
        let mut found: Vec<_> = self
            .table
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        found
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_var::program::{Expr, Label, Op};
    use ember_var::v_int;

    fn proto(id: u32, name: &str, ops: Vec<Op>) -> TriggerPrototype {
        TriggerPrototype {
            id: TriggerId(id),
            name: name.to_string(),
            attach: AttachKind::Mob,
            interest: BitEnum::new_with(TrigEvent::Speech),
            narg: 0,
            arg: None,
            allow_multiple: false,
            program: Program::new(ops),
        }
    }

    #[test]
    fn define_and_lookup() {
        let mut reg = TriggerRegistry::new();
        reg.define(proto(100, "guard greeting", vec![Op::Halt])).unwrap();
        assert!(reg.lookup(TriggerId(100)).is_some());
        assert!(reg.lookup(TriggerId(101)).is_none());
    }

    #[test]
    fn replace_overwrites() {
        let mut reg = TriggerRegistry::new();
        reg.define(proto(100, "old", vec![Op::Halt])).unwrap();
        reg.define(proto(100, "new", vec![Op::Nop, Op::Halt])).unwrap();
        assert_eq!(reg.lookup(TriggerId(100)).unwrap().name, "new");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn malformed_program_rejected() {
        let mut reg = TriggerRegistry::new();
        let bad = proto(
            7,
            "bad",
            vec![Op::JumpIfFalse {
                cond: Expr::Value(v_int(1)),
                label: Label(12),
            }],
        );
        assert!(matches!(
            reg.define(bad),
            Err(RegistryError::Invalid(TriggerId(7), _))
        ));
        assert!(reg.lookup(TriggerId(7)).is_none());
    }

    #[test]
    fn name_search() {
        let mut reg = TriggerRegistry::new();
        reg.define(proto(1, "Guard greet", vec![Op::Halt])).unwrap();
        reg.define(proto(2, "guard patrol", vec![Op::Halt])).unwrap();
        reg.define(proto(3, "shop restock", vec![Op::Halt])).unwrap();
        let found = reg.find_by_name("GUARD");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, TriggerId(1));
    }
}
