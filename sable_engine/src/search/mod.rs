//! The iterative-deepening negamax search with alpha-beta pruning,
//! aspiration windows, a transposition table, null-move pruning, late-move
//! reductions, killer/history ordering and quiescence.
//!
//! One [`Searcher`] runs per worker thread. Workers share the hash tables,
//! a stop flag and a node counter; everything else (position, killers,
//! history, root move list) is thread-private.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;

use sable::core::score::{
    mate_in, mated_in, Value, DRAW, INFINITE, MATED_IN_MAX_PLY, MATE_IN_MAX_PLY, MAX_PLY,
    NEG_INFINITE,
};
use sable::{Move, Position};

use crate::consts::NODE_CHECK_MASK;
use crate::eval::Evaluator;
use crate::history::{HistoryTable, KillerTable};
use crate::ordering::MovePicker;
use crate::report::{Reporter, ScoreType, SearchReport};
use crate::tables::{Bound, SharedTables};
use crate::time::limits::SearchLimits;
use crate::time::manager::TimeManager;

/// Helper threads start at staggered depths and skip in different strides
/// so the pool does not search the same depth in lockstep.
const THREAD_DIST: usize = 20;
static SKIP_SIZE: [i16; THREAD_DIST] = [1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4];
static START_PLY: [i16; THREAD_DIST] = [0, 1, 0, 1, 2, 3, 0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5, 6, 7];

/// Margin per depth for the static-null (reverse futility) test.
const REVERSE_FUTILITY_MARGIN: Value = 175;
/// Aspiration half-window for the first re-search.
const ASPIRATION_DELTA: Value = 20;

lazy_static! {
    /// Late-move reduction amounts indexed by depth and move number.
    static ref REDUCTIONS: [[i16; 64]; 64] = {
        let mut table = [[0i16; 64]; 64];
        for (d, row) in table.iter_mut().enumerate().skip(1) {
            for (m, r) in row.iter_mut().enumerate().skip(1) {
                *r = ((d as f64).log2() * (m as f64).log2() / 1.95) as i16;
            }
        }
        table
    };
}

#[inline]
fn reduction(depth: i16, moves_played: u32) -> i16 {
    REDUCTIONS[(depth.max(0) as usize).min(63)][(moves_played as usize).min(63)]
}

/// Mate scores are stored in the table relative to the storing node, so a
/// mate found deeper in the tree reads back correctly elsewhere.
fn value_to_tt(v: Value, ply: u16) -> i16 {
    if v >= MATE_IN_MAX_PLY {
        (v + ply as Value) as i16
    } else if v <= MATED_IN_MAX_PLY {
        (v - ply as Value) as i16
    } else {
        v as i16
    }
}

fn value_from_tt(v: Value, ply: u16) -> Value {
    if v >= MATE_IN_MAX_PLY {
        v - ply as Value
    } else if v <= MATED_IN_MAX_PLY {
        v + ply as Value
    } else {
        v
    }
}

/// A root move with its scores from the current and previous iteration.
#[derive(Copy, Clone, Debug)]
struct RootMove {
    mv: Move,
    score: Value,
    prev_score: Value,
}

/// What one worker hands back when its search ends.
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: Value,
    pub depth_completed: i16,
    pub pv: Vec<Move>,
    pub nodes: u64,
}

/// One search worker.
pub struct Searcher {
    id: usize,
    pos: Position,
    tables: Arc<SharedTables>,
    evaluator: Arc<dyn Evaluator>,
    stop: Arc<AtomicBool>,
    global_nodes: Arc<AtomicU64>,
    limits: SearchLimits,
    time: TimeManager,
    reporter: Option<Reporter>,

    killers: KillerTable,
    history: HistoryTable,
    root_moves: Vec<RootMove>,
    nodes: u64,
    depth_completed: i16,
    best_move: Move,
    best_score: Value,
}

impl Searcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        pos: Position,
        tables: Arc<SharedTables>,
        evaluator: Arc<dyn Evaluator>,
        stop: Arc<AtomicBool>,
        global_nodes: Arc<AtomicU64>,
        limits: SearchLimits,
        time: TimeManager,
        reporter: Option<Reporter>,
    ) -> Searcher {
        let root_moves = pos
            .legal_moves()
            .iter()
            .map(|m| RootMove {
                mv: *m,
                score: NEG_INFINITE,
                prev_score: NEG_INFINITE,
            })
            .collect();
        Searcher {
            id,
            pos,
            tables,
            evaluator,
            stop,
            global_nodes,
            limits,
            time,
            reporter,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            root_moves,
            nodes: 0,
            depth_completed: 0,
            best_move: Move::null(),
            best_score: DRAW,
        }
    }

    #[inline(always)]
    fn is_main(&self) -> bool {
        self.id == 0
    }

    #[inline(always)]
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Counts a visited node and periodically consults the clock, the node
    /// budget and the stop flag.
    #[inline]
    fn count_node(&mut self) {
        self.nodes += 1;
        if self.nodes & NODE_CHECK_MASK == 0 {
            self.global_nodes
                .fetch_add(NODE_CHECK_MASK + 1, Ordering::Relaxed);
            self.check_limits();
        }
    }

    fn check_limits(&self) {
        if self.time.past_maximum() {
            self.stop.store(true, Ordering::SeqCst);
        }
        if let Some(limit) = self.limits.node_limit() {
            if self.global_nodes.load(Ordering::Relaxed) >= limit {
                self.stop.store(true, Ordering::SeqCst);
            }
        }
    }

    fn evaluate(&self) -> Value {
        self.evaluator.evaluate(&self.pos, &self.tables)
    }

    /// Total nodes across all workers, including this worker's unflushed
    /// remainder.
    fn nodes_now(&self) -> u64 {
        self.global_nodes.load(Ordering::Relaxed) + (self.nodes & NODE_CHECK_MASK)
    }

    /// Runs iterative deepening to completion and returns the result. The
    /// main worker (id 0) raises the stop flag on exit so helpers wind
    /// down with it.
    pub fn run(mut self) -> SearchResult {
        debug_assert!(!self.root_moves.is_empty());
        self.best_move = self.root_moves[0].mv;

        let max_depth = self
            .limits
            .depth_limit()
            .map(|d| d as i16)
            .unwrap_or(MAX_PLY as i16 - 1)
            .min(MAX_PLY as i16 - 1);

        let skip = SKIP_SIZE[self.id % THREAD_DIST];
        let mut depth: i16 = 1 + START_PLY[self.id % THREAD_DIST];
        let mut last_score: Value = NEG_INFINITE;

        while !self.stopped() && depth <= max_depth {
            for rm in self.root_moves.iter_mut() {
                rm.prev_score = rm.score;
            }
            self.history.halve();

            // Aspiration: open a narrow window around the previous score
            // and widen on failure, eventually to the full bounds.
            let mut delta = ASPIRATION_DELTA;
            let (mut alpha, mut beta) = if depth >= 5 && last_score > MATED_IN_MAX_PLY {
                (
                    (last_score - delta).max(NEG_INFINITE),
                    (last_score + delta).min(INFINITE),
                )
            } else {
                (NEG_INFINITE, INFINITE)
            };

            let mut score;
            loop {
                score = self.search_root(depth, alpha, beta);
                self.sort_root_moves();
                if self.stopped() {
                    break;
                }
                if score <= alpha {
                    beta = (alpha + beta) / 2;
                    alpha = (score - delta).max(NEG_INFINITE);
                } else if score >= beta {
                    beta = (score + delta).min(INFINITE);
                } else {
                    break;
                }
                delta += delta / 4 + 5;
            }

            if self.stopped() {
                break;
            }

            last_score = score;
            self.depth_completed = depth;
            self.best_move = self.root_moves[0].mv;
            self.best_score = score;

            if self.is_main() {
                self.report(depth as u16, score, false);
                // A finished iteration past the target slice is the last,
                // and a single legal reply needs no deeper look.
                if self.time.past_ideal()
                    || (self.limits.is_timed() && self.root_moves.len() == 1)
                {
                    self.stop.store(true, Ordering::SeqCst);
                    break;
                }
            }

            depth += skip;
        }

        self.global_nodes
            .fetch_add(self.nodes & NODE_CHECK_MASK, Ordering::Relaxed);

        let pv = self.recover_pv(16);
        if self.is_main() {
            self.report_final(&pv);
            self.stop.store(true, Ordering::SeqCst);
        }

        SearchResult {
            best_move: self.best_move,
            score: self.best_score,
            depth_completed: self.depth_completed,
            pv,
            nodes: self.nodes,
        }
    }

    /// Sorts root moves best-first: current score, previous score as the
    /// tie-break.
    fn sort_root_moves(&mut self) {
        self.root_moves
            .sort_by(|a, b| (b.score, b.prev_score).cmp(&(a.score, a.prev_score)));
    }

    /// One full-width search from the root. Root moves carry their own
    /// bookkeeping, so the root loop is explicit rather than a ply-zero
    /// case inside `search`.
    fn search_root(&mut self, depth: i16, mut alpha: Value, beta: Value) -> Value {
        let mut best_value = NEG_INFINITE;

        for i in 0..self.root_moves.len() {
            let m = self.root_moves[i].mv;
            self.pos.make_move(m);
            self.tables.tt.prefetch(self.pos.key());

            let value = if i == 0 {
                -self.search(-beta, -alpha, depth - 1, 1, true, true)
            } else {
                let zw = -self.search(-alpha - 1, -alpha, depth - 1, 1, false, true);
                if zw > alpha && zw < beta {
                    -self.search(-beta, -alpha, depth - 1, 1, true, true)
                } else {
                    zw
                }
            };
            self.pos.unmake_move();

            if self.stopped() {
                return 0;
            }

            if i == 0 || value > alpha {
                self.root_moves[i].score = value;
            } else {
                // Keep failed moves out of the way when sorting.
                self.root_moves[i].score = NEG_INFINITE;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    alpha = value;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        best_value
    }

    /// The negamax alpha-beta search.
    fn search(
        &mut self,
        mut alpha: Value,
        mut beta: Value,
        depth: i16,
        ply: u16,
        is_pv: bool,
        can_null: bool,
    ) -> Value {
        if depth <= 0 {
            return self.qsearch(alpha, beta, ply);
        }

        self.count_node();
        if self.stopped() {
            return 0;
        }

        // Draw by rule. A single earlier occurrence counts as a draw
        // inside the tree, which folds threefold lines to their value
        // without walking them out.
        if self.pos.fifty_move_rule()
            || self.pos.repetitions() >= 1
            || self.pos.insufficient_material()
        {
            return DRAW;
        }
        if ply >= MAX_PLY - 1 {
            return if self.pos.in_check() { DRAW } else { self.evaluate() };
        }

        // Mate-distance pruning: a mate further away than one already
        // proven cannot improve the result.
        alpha = alpha.max(mated_in(ply));
        beta = beta.min(mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }

        let in_check = self.pos.in_check();
        let key = self.pos.key();

        let tt_entry = self.tables.tt.get(key);
        let tt_move = tt_entry.and_then(|e| e.mv);
        if let Some(e) = tt_entry {
            if !is_pv && i16::from(e.depth) >= depth {
                let tt_value = value_from_tt(Value::from(e.score), ply);
                if e.bound.cuts(tt_value, beta) {
                    return tt_value;
                }
            }
        }

        let static_eval = if in_check { NEG_INFINITE } else { self.evaluate() };

        if !in_check && !is_pv {
            // Static null: when the standing evaluation beats beta by a
            // depth-scaled margin, trust it.
            if depth < 7
                && static_eval - REVERSE_FUTILITY_MARGIN * Value::from(depth) >= beta
                && static_eval < MATE_IN_MAX_PLY
            {
                return static_eval;
            }

            // Null move: hand the opponent a free tempo; if a reduced
            // search still fails high the position is good enough to cut.
            // Skipped without slider/knight material, where zugzwang
            // makes the free tempo an asset instead.
            if can_null
                && depth >= 2
                && static_eval >= beta
                && self.pos.non_pawn_material(self.pos.turn()) > 0
            {
                let r = 3 + depth / 6;
                self.pos.make_null_move();
                let value =
                    -self.search(-beta, -beta + 1, depth - 1 - r, ply + 1, false, false);
                self.pos.unmake_null_move();
                if self.stopped() {
                    return 0;
                }
                if value >= beta {
                    return if value >= MATE_IN_MAX_PLY { beta } else { value };
                }
            }
        }

        let killers = self.killers.probe(ply);
        let mut picker = MovePicker::main_search(&self.pos, tt_move, killers, &self.history);
        if picker.is_empty() {
            return if in_check { mated_in(ply) } else { DRAW };
        }

        let mut best_value = NEG_INFINITE;
        let mut best_move = Move::null();
        let mut moves_played: u32 = 0;

        while let Some(m) = picker.next() {
            moves_played += 1;
            let quiet = !m.is_tactical();

            self.pos.make_move(m);
            self.tables.tt.prefetch(self.pos.key());
            let gives_check = self.pos.in_check();
            let new_depth = depth - 1;

            let value = if moves_played == 1 {
                -self.search(-beta, -alpha, new_depth, ply + 1, is_pv, true)
            } else {
                // Late-move reduction for quiet moves well down the list,
                // then principal-variation re-searches as needed.
                let mut r = 0;
                if depth >= 3 && quiet && !in_check && !gives_check && moves_played > 3 {
                    r = reduction(depth, moves_played);
                    if is_pv && r > 0 {
                        r -= 1;
                    }
                }
                let mut value =
                    -self.search(-alpha - 1, -alpha, (new_depth - r).max(0), ply + 1, false, true);
                if value > alpha && r > 0 {
                    value = -self.search(-alpha - 1, -alpha, new_depth, ply + 1, false, true);
                }
                if is_pv && value > alpha && value < beta {
                    value = -self.search(-beta, -alpha, new_depth, ply + 1, true, true);
                }
                value
            };
            self.pos.unmake_move();

            if self.stopped() {
                return 0;
            }

            if quiet {
                self.history.visit(m);
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = m;
                    if value >= beta {
                        if quiet {
                            self.killers.insert(ply, m);
                            self.history.reward(m, depth);
                        }
                        break;
                    }
                    alpha = value;
                }
            }
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if is_pv && !best_move.is_null() {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tables.tt.put(
            key,
            best_move,
            value_to_tt(best_value, ply),
            depth.clamp(0, 255) as u8,
            bound,
        );

        best_value
    }

    /// Quiescence: only captures, promotions and check evasions, with the
    /// static evaluation as a stand-pat floor.
    fn qsearch(&mut self, mut alpha: Value, beta: Value, ply: u16) -> Value {
        self.count_node();
        if self.stopped() {
            return 0;
        }

        if self.pos.fifty_move_rule()
            || self.pos.repetitions() >= 1
            || self.pos.insufficient_material()
        {
            return DRAW;
        }

        let in_check = self.pos.in_check();
        if ply >= MAX_PLY - 1 {
            return if in_check { DRAW } else { self.evaluate() };
        }

        let key = self.pos.key();
        let tt_entry = self.tables.tt.get(key);
        let tt_move = tt_entry.and_then(|e| e.mv);
        if let Some(e) = tt_entry {
            let tt_value = value_from_tt(Value::from(e.score), ply);
            if e.bound.cuts(tt_value, beta) {
                return tt_value;
            }
        }

        let mut best_value;
        if in_check {
            best_value = NEG_INFINITE;
        } else {
            best_value = self.evaluate();
            if best_value >= beta {
                self.tables
                    .tt
                    .put(key, Move::null(), value_to_tt(best_value, ply), 0, Bound::Lower);
                return best_value;
            }
            if best_value > alpha {
                alpha = best_value;
            }
        }

        let mut picker = MovePicker::quiescence(&self.pos, tt_move);
        if in_check && picker.is_empty() {
            return mated_in(ply);
        }

        let alpha_orig = alpha;
        let mut best_move = Move::null();

        while let Some(m) = picker.next() {
            // Captures that lose material cannot rescue a quiet position.
            if !in_check && m.is_capture() && self.pos.see(m) < 0 {
                continue;
            }

            self.pos.make_move(m);
            let value = -self.qsearch(-beta, -alpha, ply + 1);
            self.pos.unmake_move();

            if self.stopped() {
                return 0;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = m;
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                }
            }
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if best_value > alpha_orig {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tables
            .tt
            .put(key, best_move, value_to_tt(best_value, ply), 0, bound);

        best_value
    }

    /// Rebuilds the principal variation by walking stored best moves from
    /// the root. Every recovered move is validated against the current
    /// legal moves, so stale or corrupt table entries end the walk instead
    /// of corrupting the line.
    fn recover_pv(&mut self, max_len: usize) -> Vec<Move> {
        let mut pv = Vec::new();
        if self.best_move.is_null() {
            return pv;
        }
        pv.push(self.best_move);
        self.pos.make_move(self.best_move);
        let mut made = 1;

        while pv.len() < max_len {
            let entry = match self.tables.tt.get(self.pos.key()) {
                Some(e) => e,
                None => break,
            };
            let m = match entry.mv {
                Some(m) => m,
                None => break,
            };
            if !self.pos.legal_moves().contains(m) || self.pos.repetitions() >= 1 {
                break;
            }
            pv.push(m);
            self.pos.make_move(m);
            made += 1;
        }

        for _ in 0..made {
            self.pos.unmake_move();
        }
        pv
    }

    fn report(&self, depth: u16, score: Value, finished: bool) {
        if let Some(reporter) = &self.reporter {
            reporter.send(SearchReport {
                depth,
                score,
                score_type: ScoreType::classify(score, NEG_INFINITE, INFINITE),
                nodes: self.nodes_now(),
                elapsed_ms: self.time.elapsed_ms(),
                pv: vec![self.best_move],
                finished,
            });
        }
    }

    fn report_final(&self, pv: &[Move]) {
        if let Some(reporter) = &self.reporter {
            reporter.send(SearchReport {
                depth: self.depth_completed.max(0) as u16,
                score: self.best_score,
                score_type: ScoreType::classify(self.best_score, NEG_INFINITE, INFINITE),
                nodes: self.nodes_now(),
                elapsed_ms: self.time.elapsed_ms(),
                pv: pv.to_vec(),
                finished: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions_grow() {
        assert_eq!(reduction(1, 1), 0);
        assert!(reduction(20, 20) >= reduction(4, 4));
        assert!(reduction(63, 63) > 0);
    }

    #[test]
    fn tt_value_normalization_round_trips() {
        use sable::core::score::MATE;
        let stored = value_to_tt(MATE - 7, 3);
        assert_eq!(value_from_tt(Value::from(stored), 3), MATE - 7);
        let stored = value_to_tt(-MATE + 9, 5);
        assert_eq!(value_from_tt(Value::from(stored), 5), -MATE + 9);
        let stored = value_to_tt(123, 9);
        assert_eq!(value_from_tt(Value::from(stored), 9), 123);
    }
}
