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

//! Interned, case-insensitive identifiers for variable and attribute names.
//!
//! Script variable names compare case-insensitively (a `set Actor` line binds
//! the same variable a later `%actor%` reads), so symbols intern on the
//! folded form but remember the first spelling seen for display.

use ahash::AHashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Mutex};

lazy_static! {
    static ref INTERNER: Mutex<Interner> = Mutex::new(Interner::default());
}

#[derive(Default)]
struct Interner {
    ids: AHashMap<String, u32>,
    strings: Vec<Arc<str>>,
}

impl Interner {
    fn intern(&mut self, s: &str) -> u32 {
        let folded = s.to_lowercase();
        if let Some(id) = self.ids.get(&folded) {
            return *id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(Arc::from(s));
        self.ids.insert(folded, id);
        id
    }

    fn resolve(&self, id: u32) -> Arc<str> {
        self.strings[id as usize].clone()
    }
}

/// An interned name. Copyable, O(1) comparison, case-insensitive identity.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn mk(s: &str) -> Self {
        Symbol(INTERNER.lock().unwrap().intern(s))
    }

    /// The spelling this symbol was first interned under.
    pub fn as_arc_str(&self) -> Arc<str> {
        INTERNER.lock().unwrap().resolve(self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::mk(value)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_arc_str())
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}", self.as_arc_str())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_arc_str())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Symbol::mk(&s))
    }
}
