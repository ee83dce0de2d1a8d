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

//! Bookkeeping for suspended trigger instances: the pulse-ordered wait
//! queue that wakes them, and the purge tracker that protects them from
//! entities dying out from under them while they sleep.

mod purge;
mod scheduler;

pub use purge::{PurgeRecord, PurgeTracker, WatchedEntity};
pub use scheduler::{DueWake, WaitHandle, WaitQueue};
