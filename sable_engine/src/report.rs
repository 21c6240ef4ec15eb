//! Progress reports pushed from the search to its observer over a bounded
//! channel. The searching thread never blocks on a slow observer: when the
//! channel is full the report is dropped.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use sable::core::score::{is_mate_score, mate_distance, Value};
use sable::Move;

/// How the reported score relates to the true value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScoreType {
    /// An exact centipawn score.
    Exact,
    /// A fail-high: the true value is at least the reported score.
    LowerBound,
    /// A fail-low: the true value is at most the reported score.
    UpperBound,
    /// A forced mate in this many full moves; negative when being mated.
    MateIn(i32),
}

impl ScoreType {
    /// Classifies a score against the aspiration window it came from.
    pub fn classify(score: Value, alpha: Value, beta: Value) -> ScoreType {
        if is_mate_score(score) {
            ScoreType::MateIn(mate_distance(score))
        } else if score <= alpha {
            ScoreType::UpperBound
        } else if score >= beta {
            ScoreType::LowerBound
        } else {
            ScoreType::Exact
        }
    }
}

/// One progress update from the search.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// Iteration depth the report comes from.
    pub depth: u16,
    /// Score in centipawns (or the mate band) from the engine's side.
    pub score: Value,
    /// How to read `score`.
    pub score_type: ScoreType,
    /// Nodes searched so far across all workers.
    pub nodes: u64,
    /// Milliseconds since the search started.
    pub elapsed_ms: u64,
    /// The principal variation, best move first.
    pub pv: Vec<Move>,
    /// True on the last report of the search.
    pub finished: bool,
}

/// Capacity of the observer channel.
const REPORT_CHANNEL_CAP: usize = 256;

/// Creates the observer channel pair.
pub fn report_channel() -> (Reporter, Receiver<SearchReport>) {
    let (tx, rx) = bounded(REPORT_CHANNEL_CAP);
    (Reporter { tx }, rx)
}

/// The sending half held by the main search worker.
#[derive(Clone)]
pub struct Reporter {
    tx: Sender<SearchReport>,
}

impl Reporter {
    /// Sends a report without ever blocking the search; a full channel
    /// drops the update.
    pub fn send(&self, report: SearchReport) {
        match self.tx.try_send(report) {
            Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::core::score::{mate_in, mated_in};

    #[test]
    fn classification() {
        assert_eq!(ScoreType::classify(50, -100, 100), ScoreType::Exact);
        assert_eq!(ScoreType::classify(-150, -100, 100), ScoreType::UpperBound);
        assert_eq!(ScoreType::classify(150, -100, 100), ScoreType::LowerBound);
        assert_eq!(
            ScoreType::classify(mate_in(1), -100, 32_001),
            ScoreType::MateIn(1)
        );
        assert_eq!(
            ScoreType::classify(mated_in(4), -32_001, 32_001),
            ScoreType::MateIn(-2)
        );
    }

    #[test]
    fn full_channel_never_blocks() {
        let (tx, rx) = report_channel();
        for depth in 0..600 {
            tx.send(SearchReport {
                depth,
                score: 0,
                score_type: ScoreType::Exact,
                nodes: 0,
                elapsed_ms: 0,
                pv: Vec::new(),
                finished: false,
            });
        }
        assert_eq!(rx.len(), 256);
    }
}
