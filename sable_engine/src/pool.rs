//! The Lazy-SMP worker pool. Each search spawns one thread per configured
//! worker; every worker runs its own iterative deepening on a private
//! clone of the position and cooperates with the others only through the
//! shared hash tables, the stop flag and the node counter.
//!
//! A running search is controlled through its [`SearchHandle`]: request a
//! stop, drain progress reports, and collect the final outcome once the
//! workers have wound down.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Receiver;

use sable::core::score::Value;
use sable::{Move, Position};

use crate::eval::Evaluator;
use crate::options::EngineError;
use crate::report::{report_channel, SearchReport};
use crate::search::{SearchResult, Searcher};
use crate::tables::SharedTables;
use crate::time::limits::SearchLimits;
use crate::time::manager::TimeManager;

/// The final product of one search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// The best move found. Always a legal move of the root position.
    pub best_move: Move,
    /// Score of the best move from the engine's point of view.
    pub score: Value,
    /// Deepest fully completed iteration across the pool.
    pub depth: i16,
    /// Principal variation, best move first.
    pub pv: Vec<Move>,
    /// Total nodes searched by all workers.
    pub nodes: u64,
}

/// Spawns the workers for one search.
pub struct SearchPool {
    threads: usize,
}

impl SearchPool {
    pub fn new(threads: usize) -> SearchPool {
        SearchPool {
            threads: threads.max(1),
        }
    }

    /// Starts a search. Fails when the position has no legal moves to
    /// choose from.
    pub fn start(
        &self,
        pos: &Position,
        limits: SearchLimits,
        tables: Arc<SharedTables>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Result<SearchHandle, EngineError> {
        if pos.legal_moves().is_empty() {
            return Err(EngineError::NoLegalMoves);
        }

        tables.new_search();

        let started = Instant::now();
        let stop = Arc::new(AtomicBool::new(false));
        let nodes = Arc::new(AtomicU64::new(0));
        let (reporter, reports) = report_channel();

        let mut workers: Vec<JoinHandle<SearchResult>> = Vec::with_capacity(self.threads);
        for id in 0..self.threads {
            let searcher = Searcher::new(
                id,
                pos.clone(),
                Arc::clone(&tables),
                Arc::clone(&evaluator),
                Arc::clone(&stop),
                Arc::clone(&nodes),
                limits.clone(),
                TimeManager::start(&limits, pos.half_moves() / 2, started),
                if id == 0 { Some(reporter.clone()) } else { None },
            );
            workers.push(
                thread::Builder::new()
                    .name(format!("sable-search-{}", id))
                    .stack_size(8 * 1024 * 1024)
                    .spawn(move || searcher.run())
                    .expect("failed to spawn search worker"),
            );
        }

        Ok(SearchHandle {
            stop,
            nodes,
            workers,
            reports,
            outcome: None,
        })
    }
}

/// A running (or finished) search.
pub struct SearchHandle {
    stop: Arc<AtomicBool>,
    nodes: Arc<AtomicU64>,
    workers: Vec<JoinHandle<SearchResult>>,
    reports: Receiver<SearchReport>,
    outcome: Option<SearchOutcome>,
}

impl SearchHandle {
    /// Requests a cooperative stop. Workers observe the flag at node
    /// checkpoints, finish their in-flight node and return the best move
    /// of the last completed iteration.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// True once every worker has returned.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some() || self.workers.iter().all(|w| w.is_finished())
    }

    /// The stream of progress reports from the search.
    pub fn reports(&self) -> &Receiver<SearchReport> {
        &self.reports
    }

    /// Blocks until the search ends and returns its outcome. Repeated
    /// calls return the cached result.
    pub fn outcome(&mut self) -> &SearchOutcome {
        if self.outcome.is_none() {
            let results: Vec<SearchResult> = self
                .workers
                .drain(..)
                .map(|w| w.join().expect("search worker panicked"))
                .collect();
            let best = pick_best(&results);
            self.outcome = Some(SearchOutcome {
                best_move: best.best_move,
                score: best.score,
                depth: best.depth_completed,
                pv: best.pv.clone(),
                nodes: self.nodes.load(Ordering::Relaxed),
            });
        }
        self.outcome.as_ref().expect("outcome cached above")
    }

    /// Blocks until the search ends and returns the best move found.
    pub fn best_move(&mut self) -> Move {
        self.outcome().best_move
    }

    /// Blocks until the search ends and returns the principal variation.
    pub fn principal_variation(&mut self) -> Vec<Move> {
        self.outcome().pv.clone()
    }
}

/// Best result across workers: a deeper completed iteration wins, a better
/// score breaks ties at equal depth.
fn pick_best(results: &[SearchResult]) -> &SearchResult {
    let mut best = &results[0];
    for r in &results[1..] {
        let deeper = r.depth_completed > best.depth_completed;
        let equal_but_better =
            r.depth_completed == best.depth_completed && r.score > best.score;
        if (deeper || equal_but_better) && !r.best_move.is_null() {
            best = r;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::ClassicEval;

    fn pool_pieces() -> (Arc<SharedTables>, Arc<dyn Evaluator>) {
        (
            Arc::new(SharedTables::new(8, 2, 1).unwrap()),
            Arc::new(ClassicEval),
        )
    }

    #[test]
    fn depth_limited_search_finishes() {
        let (tables, eval) = pool_pieces();
        let pool = SearchPool::new(1);
        let pos = Position::start_pos();
        let mut handle = pool
            .start(&pos, SearchLimits::Depth(4), tables, eval)
            .unwrap();
        let outcome = handle.outcome().clone();
        assert!(pos.legal_moves().contains(outcome.best_move));
        assert!(outcome.depth >= 4);
        assert!(outcome.nodes > 0);
        assert!(!outcome.pv.is_empty());
        assert_eq!(outcome.pv[0], outcome.best_move);
    }

    #[test]
    fn no_legal_moves_is_an_error() {
        let (tables, eval) = pool_pieces();
        let pool = SearchPool::new(1);
        // Stalemate: black to move, no legal moves.
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(pos.stalemate());
        match pool.start(&pos, SearchLimits::Depth(3), tables, eval) {
            Err(EngineError::NoLegalMoves) => {}
            other => panic!("expected NoLegalMoves, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn multi_threaded_search_agrees_on_legality() {
        let (tables, eval) = pool_pieces();
        let pool = SearchPool::new(3);
        let pos =
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let mut handle = pool
            .start(&pos, SearchLimits::Depth(5), tables, eval)
            .unwrap();
        let best = handle.best_move();
        assert!(pos.legal_moves().contains(best));
    }
}
