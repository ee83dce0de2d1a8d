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
use ember_var::{Symbol, Uid, Var, v_none};

/// A variable environment, used both for an instance's locals and for an
/// entity's shared variables. Bindings are keyed by name and context id:
/// context 0 is the default, and a nonzero context distinguishes bindings of
/// the same name made by different nested invocations. Reads in a nonzero
/// context fall back to context 0.
#[derive(Debug, Default, Clone)]
pub struct VarEnv {
    map: AHashMap<(Symbol, i64), Var>,
}

impl VarEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Symbol, context: i64) -> Option<&Var> {
        self.map
            .get(&(name, context))
            .or_else(|| (context != 0).then(|| self.map.get(&(name, 0))).flatten())
    }

    pub fn set(&mut self, name: Symbol, context: i64, value: Var) {
        self.map.insert((name, context), value);
    }

    /// Remove a binding; tries the given context first, then the default.
    /// Returns whether anything was removed.
    pub fn unset(&mut self, name: Symbol, context: i64) -> bool {
        if self.map.remove(&(name, context)).is_some() {
            return true;
        }
        context != 0 && self.map.remove(&(name, 0)).is_some()
    }

    /// Null out every binding holding a reference to the given entity, in
    /// any context. Used when a watched entity is purged while the owning
    /// trigger sits suspended.
    pub fn null_refs_to(&mut self, uid: Uid) {
        for v in self.map.values_mut() {
            if v.as_uid() == Some(uid) {
                *v = v_none();
            }
        }
    }

    /// Every entity currently referenced by a binding.
    pub fn referenced_uids(&self) -> impl Iterator<Item = Uid> + '_ {
        self.map.values().filter_map(|v| v.as_uid())
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_var::{EntityKind, v_int, v_uid};

    #[test]
    fn context_fallback() {
        let mut env = VarEnv::new();
        let name = Symbol::mk("counter");
        env.set(name, 0, v_int(1));
        assert_eq!(env.get(name, 5), Some(&v_int(1)));

        env.set(name, 5, v_int(2));
        assert_eq!(env.get(name, 5), Some(&v_int(2)));
        assert_eq!(env.get(name, 0), Some(&v_int(1)));
        assert_eq!(env.get(name, 6), Some(&v_int(1)));
    }

    #[test]
    fn unset_falls_back_to_default() {
        let mut env = VarEnv::new();
        let name = Symbol::mk("target");
        env.set(name, 0, v_int(1));
        assert!(env.unset(name, 3));
        assert!(env.get(name, 3).is_none());
        assert!(!env.unset(name, 3));
    }

    #[test]
    fn null_refs() {
        let mut env = VarEnv::new();
        let victim = Uid::mk(EntityKind::Mob, 9);
        env.set(Symbol::mk("victim"), 0, v_uid(victim));
        env.set(Symbol::mk("count"), 0, v_int(3));
        env.null_refs_to(victim);
        assert!(env.get(Symbol::mk("victim"), 0).unwrap().is_none());
        assert_eq!(env.get(Symbol::mk("count"), 0), Some(&v_int(3)));
    }
}
