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

//! Config is created by the host at boot and passed to the engine at
//! construction. Holds the runaway-script limits and the game-time
//! conversion constants.

#[derive(Clone, Debug)]
pub struct Config {
    /// How deep triggers may invoke each other (a load effect firing a load
    /// trigger, and so on) before the nested dispatch is refused.
    pub max_script_depth: usize,
    /// Total backward jumps one instance may take in a single activation
    /// before it is aborted and logged.
    pub max_loop_iterations: u32,
    /// Consecutive backward jumps before the driver forces a one-pulse wait,
    /// so a long but legitimate loop can't monopolize the tick.
    pub loop_auto_wait_slice: u32,
    /// Main-loop pulses per real second; `wait Ns` converts through this.
    pub pulses_per_second: u64,
    /// Real seconds per game hour; `wait Nt` converts through this.
    pub seconds_per_mud_hour: u64,
    /// The random-trigger index is fully covered once every this many ticks.
    pub random_scan_cycle: usize,
    /// Seed for the percent-roll RNG. Fixed seed makes dispatch reproducible
    /// in tests.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_script_depth: 10,
            max_loop_iterations: 100,
            loop_auto_wait_slice: 30,
            pulses_per_second: 10,
            seconds_per_mud_hour: 75,
            random_scan_cycle: 5,
            rng_seed: 0,
        }
    }
}
