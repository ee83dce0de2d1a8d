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

//! The in-memory form of a compiled trigger program.
//!
//! The textual statement language and its parser live in the content loader,
//! outside this engine; what arrives here is a flat op vector with absolute
//! jump labels, validated once at registration time. The interpreter's saved
//! resume point is an index into this vector.

use crate::{EntityKind, Symbol, Var};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// An absolute position in a program's op vector. A label equal to the
/// program length is a valid "fall off the end" target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Which variable environment a `Set`/`Unset` addresses.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum VarScope {
    /// The running instance's locals, discarded when the trigger finishes.
    Local,
    /// The owning entity's variables, shared by all its triggers.
    Entity,
}

/// Unit of a `wait` amount. The loader compiles `wait 10s` and friends down
/// to these; conversion to pulses happens against the engine config.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum WaitUnit {
    Pulses,
    Seconds,
    MudHours,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// An expression tree. Nothing here can suspend or mutate world state;
/// evaluation faults degrade to the null value rather than aborting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Value(Var),
    /// Read a variable: instance locals first, then the owner's entity vars,
    /// honoring the container's current context id.
    Read(Symbol),
    /// The entity this trigger is attached to.
    SelfRef,
    /// An attribute of an entity, resolved through the world. A dangling or
    /// non-uid base yields null.
    Attr { obj: Box<Expr>, name: Symbol },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// A world-mutating primitive invoked from a script. Arguments are
/// expressions evaluated at the call site; targets that resolve to nothing
/// make the call a no-op.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EffectCall {
    ModifyAttr {
        target: Expr,
        attr: Symbol,
        value: Expr,
    },
    ApplyAffect {
        target: Expr,
        affect: Symbol,
        duration: Expr,
        modifier: Expr,
    },
    RemoveAffect {
        target: Expr,
        affect: Symbol,
    },
    Damage {
        target: Expr,
        amount: Expr,
    },
    Heal {
        target: Expr,
        amount: Expr,
    },
    Teleport {
        target: Expr,
        to: Expr,
    },
    Terraform {
        room: Expr,
        sector: Expr,
    },
    DeedToEmpire {
        target: Expr,
        empire: Expr,
    },
    LoadEntity {
        kind: EntityKind,
        vnum: Expr,
        location: Expr,
    },
    Purge {
        target: Expr,
    },
    Echo {
        location: Expr,
        text: Expr,
    },
}

impl EffectCall {
    pub fn name(&self) -> &'static str {
        match self {
            EffectCall::ModifyAttr { .. } => "modify-attr",
            EffectCall::ApplyAffect { .. } => "apply-affect",
            EffectCall::RemoveAffect { .. } => "remove-affect",
            EffectCall::Damage { .. } => "damage",
            EffectCall::Heal { .. } => "heal",
            EffectCall::Teleport { .. } => "teleport",
            EffectCall::Terraform { .. } => "terraform",
            EffectCall::DeedToEmpire { .. } => "deed-to-empire",
            EffectCall::LoadEntity { .. } => "load",
            EffectCall::Purge { .. } => "purge",
            EffectCall::Echo { .. } => "echo",
        }
    }
}

/// One statement of a compiled trigger program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Op {
    Jump {
        label: Label,
    },
    JumpIfFalse {
        cond: Expr,
        label: Label,
    },
    Set {
        scope: VarScope,
        name: Symbol,
        value: Expr,
    },
    Unset {
        scope: VarScope,
        name: Symbol,
    },
    /// Switch the container's variable context id (`context` statement).
    SetContext {
        value: Expr,
    },
    /// Suspend this instance and resume after the given amount of game time.
    Wait {
        amount: Expr,
        unit: WaitUnit,
    },
    Effect(EffectCall),
    /// Set the trigger's result; execution continues. A false value blocks
    /// the raising event; -1 blocks it silently.
    Return {
        value: Expr,
    },
    Halt,
    Nop,
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ProgramError {
    #[error("jump target {label} out of range for program of {len} ops")]
    JumpOutOfRange { label: Label, len: usize },
    #[error("program has no ops")]
    Empty,
}

/// A validated, immutable, shared program. Prototypes hold one of these;
/// instances index into it with their saved pc.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program(Arc<Vec<Op>>);

impl Program {
    pub fn new(ops: Vec<Op>) -> Self {
        Program(Arc::new(ops))
    }

    pub fn ops(&self) -> &[Op] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Structural validation, run once when the prototype is registered.
    /// Anything caught here is a boot-time load error, never a runtime one.
    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.is_empty() {
            return Err(ProgramError::Empty);
        }
        let len = self.len();
        let check = |label: Label| {
            if label.0 as usize > len {
                Err(ProgramError::JumpOutOfRange { label, len })
            } else {
                Ok(())
            }
        };
        for op in self.ops() {
            match op {
                Op::Jump { label } | Op::JumpIfFalse { label, .. } => check(*label)?,
                _ => {}
            }
        }
        Ok(())
    }
}
