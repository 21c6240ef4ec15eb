//! The search half of the engine: concurrent hash tables, move ordering
//! statistics, an iterative-deepening negamax searcher and a Lazy-SMP
//! worker pool, driven through the [`Engine`] facade.
//!
//! The board representation, move generation and notation handling live in
//! the companion `sable` crate.
//!
//! # Usage
//!
//! ```no_run
//! use sable::Position;
//! use sable_engine::engine::Engine;
//! use sable_engine::time::limits::SearchLimits;
//!
//! let mut engine = Engine::new(Default::default()).unwrap();
//! let pos = Position::start_pos();
//! let outcome = engine.search_blocking(&pos, SearchLimits::Depth(8)).unwrap();
//! println!("best move {}", outcome.best_move);
//! ```
//!
//! [`Engine`]: engine/struct.Engine.html

pub mod consts;
pub mod engine;
pub mod eval;
pub mod history;
pub mod options;
pub mod ordering;
pub mod pool;
pub mod report;
pub mod search;
pub mod tables;
pub mod time;

pub use consts::*;
pub use engine::Engine;
pub use options::{EngineError, EngineOptions};
pub use report::{ScoreType, SearchReport};
