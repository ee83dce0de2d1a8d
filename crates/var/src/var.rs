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

use crate::{Uid, Variant};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A script value. Cheap to clone; held in trigger variable environments and
/// produced/consumed by expression evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Var(Variant);

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum VarError {
    #[error("operands of incompatible types ({0} vs {1})")]
    Type(&'static str, &'static str),
    #[error("division by zero")]
    DivisionByZero,
}

pub fn v_none() -> Var {
    Var(Variant::None)
}

pub fn v_bool(b: bool) -> Var {
    Var(Variant::Bool(b))
}

pub fn v_int(i: i64) -> Var {
    Var(Variant::Int(i))
}

pub fn v_float(f: f64) -> Var {
    Var(Variant::Float(f))
}

pub fn v_str(s: &str) -> Var {
    Var(Variant::Str(s.to_string()))
}

pub fn v_string(s: String) -> Var {
    Var(Variant::Str(s))
}

pub fn v_uid(uid: Uid) -> Var {
    Var(Variant::Uid(uid))
}

impl Var {
    pub fn variant(&self) -> &Variant {
        &self.0
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn is_none(&self) -> bool {
        matches!(self.0, Variant::None)
    }

    /// Script truthiness: nothing, zero, and the empty string are false.
    pub fn is_true(&self) -> bool {
        match &self.0 {
            Variant::None => false,
            Variant::Bool(b) => *b,
            Variant::Int(i) => *i != 0,
            Variant::Float(f) => *f != 0.0,
            Variant::Str(s) => !s.is_empty(),
            Variant::Uid(u) => !u.is_nothing(),
        }
    }

    pub fn as_uid(&self) -> Option<Uid> {
        match &self.0 {
            Variant::Uid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match &self.0 {
            Variant::Int(i) => Some(*i),
            Variant::Float(f) => Some(*f as i64),
            Variant::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            Variant::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn add(&self, rhs: &Var) -> Result<Var, VarError> {
        match (&self.0, &rhs.0) {
            (Variant::Int(l), Variant::Int(r)) => Ok(v_int(l.wrapping_add(*r))),
            (Variant::Float(l), Variant::Float(r)) => Ok(v_float(l + r)),
            (Variant::Int(l), Variant::Float(r)) => Ok(v_float(*l as f64 + r)),
            (Variant::Float(l), Variant::Int(r)) => Ok(v_float(l + *r as f64)),
            (Variant::Str(l), Variant::Str(r)) => Ok(v_string(format!("{l}{r}"))),
            (l, r) => Err(VarError::Type(l.type_name(), r.type_name())),
        }
    }

    pub fn sub(&self, rhs: &Var) -> Result<Var, VarError> {
        self.numeric_op(rhs, i64::wrapping_sub, |l, r| l - r)
    }

    pub fn mul(&self, rhs: &Var) -> Result<Var, VarError> {
        self.numeric_op(rhs, i64::wrapping_mul, |l, r| l * r)
    }

    pub fn div(&self, rhs: &Var) -> Result<Var, VarError> {
        if matches!(rhs.0, Variant::Int(0)) {
            return Err(VarError::DivisionByZero);
        }
        self.numeric_op(rhs, i64::wrapping_div, |l, r| l / r)
    }

    fn numeric_op(
        &self,
        rhs: &Var,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Var, VarError> {
        match (&self.0, &rhs.0) {
            (Variant::Int(l), Variant::Int(r)) => Ok(v_int(int_op(*l, *r))),
            (Variant::Float(l), Variant::Float(r)) => Ok(v_float(float_op(*l, *r))),
            (Variant::Int(l), Variant::Float(r)) => Ok(v_float(float_op(*l as f64, *r))),
            (Variant::Float(l), Variant::Int(r)) => Ok(v_float(float_op(*l, *r as f64))),
            (l, r) => Err(VarError::Type(l.type_name(), r.type_name())),
        }
    }
}

impl From<Variant> for Var {
    fn from(value: Variant) -> Self {
        Var(value)
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Variant::None => Ok(()),
            // Scripts see booleans as the integers they came from.
            Variant::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Variant::Int(i) => write!(f, "{i}"),
            Variant::Float(fl) => write!(f, "{fl}"),
            Variant::Str(s) => f.write_str(s),
            Variant::Uid(u) => write!(f, "{u}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityKind;

    #[test]
    fn truthiness() {
        assert!(!v_none().is_true());
        assert!(!v_int(0).is_true());
        assert!(v_int(-3).is_true());
        assert!(!v_str("").is_true());
        assert!(v_str("hi").is_true());
        assert!(v_uid(Uid::mk(EntityKind::Mob, 1)).is_true());
        assert!(!v_uid(crate::NOTHING).is_true());
    }

    #[test]
    fn case_insensitive_string_eq() {
        assert_eq!(v_str("North"), v_str("north"));
        assert_ne!(v_str("north"), v_str("south"));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(v_int(2).add(&v_int(3)).unwrap(), v_int(5));
        assert_eq!(v_str("a").add(&v_str("b")).unwrap(), v_str("ab"));
        assert_eq!(v_int(7).div(&v_int(2)).unwrap(), v_int(3));
        assert_eq!(v_int(1).div(&v_int(0)), Err(VarError::DivisionByZero));
        assert!(matches!(
            v_int(1).add(&v_uid(crate::NOTHING)),
            Err(VarError::Type("int", "uid"))
        ));
    }
}
