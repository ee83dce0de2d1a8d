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

use ember_common::World;
use ember_var::program::{BinaryOp, Expr, UnaryOp};
use ember_var::{Symbol, Uid, Var, Variant, v_bool, v_float, v_int, v_none, v_uid};
use std::cmp::Ordering;
use tracing::debug;

/// Everything an expression can see: the running instance's locals, the
/// owner's entity variables, the container's context id, and read-only
/// world state. Expressions cannot suspend and cannot mutate; any fault
/// (type mismatch, dangling reference, division by zero) degrades to the
/// null value so a sloppy script limps on rather than killing the pulse.
pub struct EvalScope<'a> {
    pub locals: &'a crate::script::VarEnv,
    pub entity: &'a crate::script::VarEnv,
    pub context: i64,
    pub owner: Uid,
    pub world: &'a dyn World,
}

impl EvalScope<'_> {
    pub fn eval(&self, expr: &Expr) -> Var {
        match expr {
            Expr::Value(v) => v.clone(),
            Expr::Read(name) => self.read(*name),
            Expr::SelfRef => v_uid(self.owner),
            Expr::Attr { obj, name } => self.attr(obj, *name),
            Expr::Unary(op, e) => self.unary(*op, e),
            Expr::Binary(op, l, r) => self.binary(*op, l, r),
        }
    }

    /// Locals shadow entity variables of the same name.
    fn read(&self, name: Symbol) -> Var {
        if let Some(v) = self.locals.get(name, 0) {
            return v.clone();
        }
        self.entity
            .get(name, self.context)
            .cloned()
            .unwrap_or_else(v_none)
    }

    fn attr(&self, obj: &Expr, name: Symbol) -> Var {
        let base = self.eval(obj);
        let Some(uid) = base.as_uid() else {
            debug!(base = %base.type_name(), attr = %name, "attribute read on non-entity value");
            return v_none();
        };
        self.world.attr(uid, name).unwrap_or_else(v_none)
    }

    fn unary(&self, op: UnaryOp, e: &Expr) -> Var {
        let v = self.eval(e);
        match op {
            UnaryOp::Not => v_bool(!v.is_true()),
            UnaryOp::Neg => match v.variant() {
                Variant::Int(i) => v_int(-i),
                Variant::Float(f) => v_float(-f),
                other => {
                    debug!(ty = other.type_name(), "negation of non-numeric value");
                    v_none()
                }
            },
        }
    }

    fn binary(&self, op: BinaryOp, l: &Expr, r: &Expr) -> Var {
        // And/Or short-circuit on the left operand's truthiness.
        match op {
            BinaryOp::And => {
                let lv = self.eval(l);
                return v_bool(lv.is_true() && self.eval(r).is_true());
            }
            BinaryOp::Or => {
                let lv = self.eval(l);
                return v_bool(lv.is_true() || self.eval(r).is_true());
            }
            _ => {}
        }
        let lv = self.eval(l);
        let rv = self.eval(r);
        match op {
            BinaryOp::Eq => v_bool(lv == rv),
            BinaryOp::Ne => v_bool(lv != rv),
            BinaryOp::Lt => self.relational(&lv, &rv, Ordering::is_lt),
            BinaryOp::Le => self.relational(&lv, &rv, Ordering::is_le),
            BinaryOp::Gt => self.relational(&lv, &rv, Ordering::is_gt),
            BinaryOp::Ge => self.relational(&lv, &rv, Ordering::is_ge),
            BinaryOp::Add => self.arith(lv.add(&rv)),
            BinaryOp::Sub => self.arith(lv.sub(&rv)),
            BinaryOp::Mul => self.arith(lv.mul(&rv)),
            BinaryOp::Div => self.arith(lv.div(&rv)),
            BinaryOp::And | BinaryOp::Or => unreachable!(),
        }
    }

    /// Unordered operands compare false, never fault.
    fn relational(&self, l: &Var, r: &Var, pred: fn(Ordering) -> bool) -> Var {
        match l.variant().compare(r.variant()) {
            Some(ord) => v_bool(pred(ord)),
            None => v_bool(false),
        }
    }

    fn arith(&self, result: Result<Var, ember_var::VarError>) -> Var {
        match result {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "arithmetic fault, yielding null");
                v_none()
            }
        }
    }
}
