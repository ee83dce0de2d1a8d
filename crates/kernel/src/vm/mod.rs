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

//! The trigger interpreter: a flat op-vector walker with an explicit pc.
//! Suspension is just saving the pc and returning, so a `wait` costs
//! nothing more than a heap push and the engine's stack fully unwinds
//! between pulses.

mod eval;
mod exec;

#[cfg(test)]
mod vm_test;

pub use eval::EvalScope;
pub use exec::{DriverCtx, run};

use ember_common::HookOutcome;
use strum::Display;

/// How a driver activation starts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunMode {
    /// Fresh activation from the top: locals cleared, loop counter reset.
    New,
    /// Continue a suspended instance from its saved pc.
    Resume,
}

/// Why the driver gave up on an activation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Display)]
pub enum AbortReason {
    /// Nested dispatch exceeded the configured depth ceiling.
    DepthExceeded,
    /// The activation exhausted the backward-jump ceiling.
    LoopExceeded,
}

/// How a driver activation ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunDisposition {
    /// Ran to completion; carries the script's result for the raising event.
    Finished(HookOutcome),
    /// Hit a `wait` (or the auto-wait slice); a wake-up is queued.
    Suspended,
    Aborted(AbortReason),
    /// The script purged its own owner; the activation stopped at the next
    /// statement boundary and the caller must drop the container.
    OwnerPurged,
}
