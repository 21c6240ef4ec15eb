//! Time allocation. Given the clock state, derive a target slice for this
//! move and a hard maximum; the search finishes the current iteration when
//! the target passes and aborts outright at the maximum.

use std::time::Instant;

use super::limits::SearchLimits;

/// Assume this many moves remain when the game has no explicit control.
const DEFAULT_MOVES_LEFT: u64 = 30;
/// Never think for less than this.
const MIN_THINK_MS: u64 = 5;
/// Reserve a little slack for move transmission.
const OVERHEAD_MS: u64 = 20;

/// The per-search time budget.
#[derive(Clone, Debug)]
pub struct TimeManager {
    start: Instant,
    /// Target slice: a finished iteration past this point ends the search.
    ideal_ms: Option<u64>,
    /// Hard ceiling: the search aborts mid-iteration here.
    maximum_ms: Option<u64>,
}

impl TimeManager {
    /// Builds the budget for one search. `moves_played` is the number of
    /// full moves already played in the game.
    pub fn start(limits: &SearchLimits, moves_played: u16, start: Instant) -> TimeManager {
        let (ideal_ms, maximum_ms) = match limits {
            SearchLimits::MoveTime(ms) => {
                let ms = (*ms).saturating_sub(OVERHEAD_MS).max(MIN_THINK_MS);
                (Some(ms), Some(ms))
            }
            SearchLimits::Clock(clock) => {
                let remaining = clock.remaining_ms.saturating_sub(OVERHEAD_MS);
                let moves_left = match clock.moves_to_go {
                    Some(mtg) => u64::from(mtg.max(1)),
                    None => DEFAULT_MOVES_LEFT.max(40_u64.saturating_sub(u64::from(moves_played / 2))),
                };
                let target = remaining / moves_left + clock.increment_ms * 3 / 4;
                let ceiling = remaining / 2;
                let ideal = target.min(ceiling).max(MIN_THINK_MS);
                let maximum = (target * 3).min(ceiling).max(MIN_THINK_MS);
                (Some(ideal), Some(maximum))
            }
            _ => (None, None),
        };
        TimeManager {
            start,
            ideal_ms,
            maximum_ms,
        }
    }

    /// An unbounded budget (depth, node and infinite searches).
    pub fn unbounded() -> TimeManager {
        TimeManager {
            start: Instant::now(),
            ideal_ms: None,
            maximum_ms: None,
        }
    }

    /// Milliseconds since the search began.
    pub fn elapsed_ms(&self) -> u64 {
        chrono::Duration::from_std(self.start.elapsed())
            .map(|d| d.num_milliseconds().max(0) as u64)
            .unwrap_or(u64::MAX)
    }

    /// True once the target slice is spent; the current iteration's result
    /// should be the last.
    pub fn past_ideal(&self) -> bool {
        match self.ideal_ms {
            Some(ideal) => self.elapsed_ms() >= ideal,
            None => false,
        }
    }

    /// True once the hard ceiling is hit; the search must stop now.
    pub fn past_maximum(&self) -> bool {
        match self.maximum_ms {
            Some(max) => self.elapsed_ms() >= max,
            None => false,
        }
    }
}
