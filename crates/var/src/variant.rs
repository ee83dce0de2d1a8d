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

use crate::Uid;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};

/// Our series of types.
#[derive(Clone, Serialize, Deserialize)]
pub enum Variant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Uid(Uid),
}

impl Variant {
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::None => "none",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::Str(_) => "str",
            Variant::Uid(_) => "uid",
        }
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Variant::None, Variant::None) => true,
            (Variant::Bool(l), Variant::Bool(r)) => l == r,
            (Variant::Int(l), Variant::Int(r)) => l == r,
            (Variant::Float(l), Variant::Float(r)) => l == r,
            // Script string comparison is case-insensitive, like everything
            // else in the language.
            (Variant::Str(l), Variant::Str(r)) => l.eq_ignore_ascii_case(r),
            (Variant::Uid(l), Variant::Uid(r)) => l == r,
            (Variant::Int(l), Variant::Float(r)) | (Variant::Float(r), Variant::Int(l)) => {
                (*l as f64) == *r
            }
            _ => false,
        }
    }
}

impl Variant {
    /// Ordering for relational operators. `None` when the two types have no
    /// defined order (a script comparing a room to a string gets false).
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Variant::Int(l), Variant::Int(r)) => Some(l.cmp(r)),
            (Variant::Float(l), Variant::Float(r)) => Some(l.total_cmp(r)),
            (Variant::Int(l), Variant::Float(r)) => Some((*l as f64).total_cmp(r)),
            (Variant::Float(l), Variant::Int(r)) => Some(l.total_cmp(&(*r as f64))),
            (Variant::Str(l), Variant::Str(r)) => {
                Some(l.to_lowercase().cmp(&r.to_lowercase()))
            }
            _ => None,
        }
    }
}

impl Debug for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::None => f.write_str("None"),
            Variant::Bool(b) => write!(f, "Bool({b})"),
            Variant::Int(i) => write!(f, "Int({i})"),
            Variant::Float(fl) => write!(f, "Float({fl})"),
            Variant::Str(s) => write!(f, "Str({s:?})"),
            Variant::Uid(u) => write!(f, "Uid({u})"),
        }
    }
}
