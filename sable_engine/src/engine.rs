//! The engine facade: owns the options, the shared hash tables and the
//! worker pool, and hands searches out behind a small API. The opening
//! book and endgame tablebases are external collaborators reached through
//! the narrow traits defined here.

use std::sync::Arc;

use sable::{Move, Position};

use crate::eval::{ClassicEval, Evaluator};
use crate::options::{EngineError, EngineOptions};
use crate::pool::{SearchHandle, SearchOutcome, SearchPool};
use crate::tables::SharedTables;
use crate::time::limits::SearchLimits;
use crate::{DEFAULT_ET_MB, DEFAULT_PT_MB};

/// An opening-book provider.
pub trait OpeningBook: Send + Sync {
    /// A book move for this position, if the book knows one.
    fn probe(&self, pos: &Position) -> Option<Move>;
}

/// Game-theoretic outcome from the probing side's point of view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

/// An endgame-tablebase provider.
pub trait Tablebase: Send + Sync {
    /// The proven outcome of this position, if the tables cover it.
    fn probe_outcome(&self, pos: &Position) -> Option<Outcome>;
}

/// The assembled engine.
pub struct Engine {
    options: EngineOptions,
    tables: Arc<SharedTables>,
    evaluator: Arc<dyn Evaluator>,
    book: Option<Box<dyn OpeningBook>>,
    tablebase: Option<Box<dyn Tablebase>>,
    active: Option<SearchHandle>,
}

impl Engine {
    /// Builds an engine from options, allocating the hash tables.
    pub fn new(options: EngineOptions) -> Result<Engine, EngineError> {
        options.validate()?;
        let tables = SharedTables::new(options.hash_size_mb, DEFAULT_ET_MB, DEFAULT_PT_MB)?;
        Ok(Engine {
            options,
            tables: Arc::new(tables),
            evaluator: Arc::new(ClassicEval),
            book: None,
            tablebase: None,
            active: None,
        })
    }

    /// Replaces the evaluator. Only possible while idle.
    pub fn set_evaluator(&mut self, evaluator: Arc<dyn Evaluator>) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.evaluator = evaluator;
        Ok(())
    }

    /// Attaches an opening book.
    pub fn set_book(&mut self, book: Box<dyn OpeningBook>) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.book = Some(book);
        Ok(())
    }

    /// Attaches a tablebase prober.
    pub fn set_tablebase(&mut self, tb: Box<dyn Tablebase>) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.tablebase = Some(tb);
        Ok(())
    }

    /// The current options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Applies new options. Only possible while idle; a changed hash
    /// budget reallocates the tables.
    pub fn set_options(&mut self, options: EngineOptions) -> Result<(), EngineError> {
        self.ensure_idle()?;
        options.validate()?;
        if options.hash_size_mb != self.options.hash_size_mb {
            self.tables = Arc::new(SharedTables::new(
                options.hash_size_mb,
                DEFAULT_ET_MB,
                DEFAULT_PT_MB,
            )?);
        }
        self.options = options;
        Ok(())
    }

    /// Forgets everything learned from previous searches.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.tables.clear();
        Ok(())
    }

    /// Approximate transposition-table fill ratio, for UIs.
    pub fn hash_load_factor(&self) -> f64 {
        self.tables.tt.load_factor()
    }

    /// Starts a search and returns its handle. Errors if a search is
    /// already running. When the book is enabled and knows the position,
    /// no search starts and the book move is returned instead.
    pub fn start_search(
        &mut self,
        pos: &Position,
        limits: SearchLimits,
    ) -> Result<SearchStart, EngineError> {
        self.ensure_idle()?;

        if self.options.use_book {
            if let Some(book) = &self.book {
                if let Some(m) = book.probe(pos) {
                    if pos.legal_moves().contains(m) {
                        return Ok(SearchStart::BookMove(m));
                    }
                }
            }
        }

        let pool = SearchPool::new(self.options.threads);
        let handle = pool.start(
            pos,
            limits,
            Arc::clone(&self.tables),
            Arc::clone(&self.evaluator),
        )?;
        self.active = Some(handle);
        Ok(SearchStart::Searching)
    }

    /// The handle of the running search, if any.
    pub fn handle(&mut self) -> Option<&mut SearchHandle> {
        self.active.as_mut()
    }

    /// Requests a stop of the running search.
    pub fn stop(&self) {
        if let Some(handle) = &self.active {
            handle.stop();
        }
    }

    /// Blocks until the running search finishes and returns its outcome.
    pub fn wait(&mut self) -> Option<SearchOutcome> {
        let mut handle = self.active.take()?;
        Some(handle.outcome().clone())
    }

    /// Convenience: run a full search to completion and return the
    /// outcome.
    pub fn search_blocking(
        &mut self,
        pos: &Position,
        limits: SearchLimits,
    ) -> Result<SearchOutcome, EngineError> {
        match self.start_search(pos, limits)? {
            SearchStart::BookMove(m) => Ok(SearchOutcome {
                best_move: m,
                score: 0,
                depth: 0,
                pv: vec![m],
                nodes: 0,
            }),
            SearchStart::Searching => Ok(self.wait().expect("search was just started")),
        }
    }

    /// The tablebase verdict for a position, when a prober is attached
    /// and covers it.
    pub fn probe_tablebase(&self, pos: &Position) -> Option<Outcome> {
        self.tablebase.as_ref().and_then(|tb| tb.probe_outcome(pos))
    }

    fn ensure_idle(&mut self) -> Result<(), EngineError> {
        if let Some(handle) = &self.active {
            if !handle.is_finished() {
                return Err(EngineError::SearchActive);
            }
        }
        self.active = None;
        Ok(())
    }
}

/// How a search request was resolved.
#[derive(Debug)]
pub enum SearchStart {
    /// The opening book answered; no search was started.
    BookMove(Move),
    /// Workers are running; drive them through [`Engine::handle`],
    /// [`Engine::stop`] and [`Engine::wait`].
    Searching,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("active", &self.active.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneMoveBook(Move);

    impl OpeningBook for OneMoveBook {
        fn probe(&self, _pos: &Position) -> Option<Move> {
            Some(self.0)
        }
    }

    #[test]
    fn blocking_search_returns_legal_move() {
        let mut engine = Engine::new(EngineOptions {
            threads: 1,
            hash_size_mb: 8,
            ..Default::default()
        })
        .unwrap();
        let pos = Position::start_pos();
        let outcome = engine.search_blocking(&pos, SearchLimits::Depth(4)).unwrap();
        assert!(pos.legal_moves().contains(outcome.best_move));
    }

    #[test]
    fn option_changes_rejected_mid_search() {
        let mut engine = Engine::new(EngineOptions {
            threads: 1,
            hash_size_mb: 8,
            ..Default::default()
        })
        .unwrap();
        let pos = Position::start_pos();
        engine
            .start_search(&pos, SearchLimits::Depth(30))
            .unwrap();
        assert_eq!(
            engine.set_options(EngineOptions::default()),
            Err(EngineError::SearchActive)
        );
        engine.stop();
        let outcome = engine.wait().unwrap();
        assert!(pos.legal_moves().contains(outcome.best_move));
        assert!(engine.set_options(EngineOptions::default()).is_ok());
    }

    #[test]
    fn book_move_short_circuits() {
        let mut engine = Engine::new(EngineOptions {
            threads: 1,
            hash_size_mb: 8,
            use_book: true,
            ..Default::default()
        })
        .unwrap();
        let pos = Position::start_pos();
        let book_move = pos.from_uci("d2d4").unwrap();
        engine.set_book(Box::new(OneMoveBook(book_move))).unwrap();
        let outcome = engine.search_blocking(&pos, SearchLimits::Depth(4)).unwrap();
        assert_eq!(outcome.best_move, book_move);
        assert_eq!(outcome.nodes, 0);
    }
}
