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

//! Event dispatch: the per-category hook functions the host calls when
//! something observable happens, and the shared gating machinery that
//! decides which attached instances actually fire.

mod hooks;
mod random;

pub use random::RandomIndex;

use crate::matching;
use crate::registry::TriggerPrototype;
use ember_var::{Symbol, Var};
use rand::Rng;
use smallvec::SmallVec;
use tracing::warn;

/// Variables bound into each fired instance's locals at dispatch time:
/// the actor, the spoken text, the bribe amount, and so on, per category.
#[derive(Clone, Debug, Default)]
pub struct EventVars(SmallVec<[(Symbol, Var); 4]>);

impl EventVars {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: Var) -> Self {
        self.0.push((Symbol::mk(name), value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Symbol, Var)> {
        self.0.iter()
    }
}

/// The per-category admission test applied to each candidate instance,
/// interpreting the prototype's overloaded numeric argument.
#[derive(Copy, Clone, Debug)]
pub enum Gate<'a> {
    /// Fire unconditionally (timer, door, reboot, destroy).
    Always,
    /// `narg` is a percent chance, rolled per instance.
    Percent,
    /// `narg` is a minimum amount; the event's value must reach it.
    Amount(i64),
    /// `narg` selects substring (0) or whole-word (1) matching of the
    /// prototype's phrase list against what was said.
    Speech(&'a str),
    /// `narg` selects exact (0) or abbreviated (1) matching of the typed
    /// command against the prototype's command word.
    Command(&'a str),
}

impl Gate<'_> {
    pub(crate) fn passes(&self, proto: &TriggerPrototype, rng: &mut impl Rng) -> bool {
        match self {
            Gate::Always => true,
            Gate::Percent => rng.random_range(1..=100) <= proto.narg,
            Gate::Amount(amount) => *amount >= proto.narg,
            Gate::Speech(said) => {
                let Some(phrases) = proto.arg.as_deref() else {
                    warn!(trigger = %proto.id, "speech trigger has no phrase list, skipping");
                    return false;
                };
                if phrases == "*" {
                    return true;
                }
                if proto.narg == 1 {
                    matching::word_match(said, phrases)
                } else {
                    matching::is_substring(said, phrases)
                }
            }
            Gate::Command(typed) => {
                let Some(cmd) = proto.arg.as_deref() else {
                    warn!(trigger = %proto.id, "command trigger has no command word, skipping");
                    return false;
                };
                if cmd == "*" {
                    return true;
                }
                matching::command_match(cmd, typed, proto.narg == 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_common::{AttachKind, BitEnum, TrigEvent, TriggerId};
    use ember_var::program::{Op, Program};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn proto(narg: i64, arg: Option<&str>) -> TriggerPrototype {
        TriggerPrototype {
            id: TriggerId(1),
            name: "gate test".into(),
            attach: AttachKind::Mob,
            interest: BitEnum::new_with(TrigEvent::Speech),
            narg,
            arg: arg.map(str::to_string),
            allow_multiple: false,
            program: Program::new(vec![Op::Halt]),
        }
    }

    #[test]
    fn percent_extremes() {
        let mut rng = SmallRng::seed_from_u64(7);
        let always = proto(100, None);
        let never = proto(0, None);
        for _ in 0..50 {
            assert!(Gate::Percent.passes(&always, &mut rng));
            assert!(!Gate::Percent.passes(&never, &mut rng));
        }
    }

    #[test]
    fn amount_threshold() {
        let mut rng = SmallRng::seed_from_u64(7);
        let p = proto(500, None);
        assert!(Gate::Amount(500).passes(&p, &mut rng));
        assert!(Gate::Amount(501).passes(&p, &mut rng));
        assert!(!Gate::Amount(499).passes(&p, &mut rng));
    }

    #[test]
    fn speech_modes() {
        let mut rng = SmallRng::seed_from_u64(7);
        let substring = proto(0, Some("passw"));
        let word = proto(1, Some("password friend"));
        let wild = proto(0, Some("*"));
        let none = proto(0, None);
        assert!(Gate::Speech("the PASSWord is swordfish").passes(&substring, &mut rng));
        assert!(!Gate::Speech("the password is swordfish").passes(&word, &mut rng));
        assert!(Gate::Speech("speak friend and enter").passes(&word, &mut rng));
        assert!(Gate::Speech("anything").passes(&wild, &mut rng));
        assert!(!Gate::Speech("anything").passes(&none, &mut rng));
    }

    #[test]
    fn command_modes() {
        let mut rng = SmallRng::seed_from_u64(7);
        let exact = proto(0, Some("push"));
        let abbrev = proto(1, Some("push"));
        assert!(Gate::Command("push").passes(&exact, &mut rng));
        assert!(!Gate::Command("pu").passes(&exact, &mut rng));
        assert!(Gate::Command("pu").passes(&abbrev, &mut rng));
    }
}
