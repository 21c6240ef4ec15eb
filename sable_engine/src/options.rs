//! Engine configuration and the error surface of the engine crate.

use thiserror::Error;

use crate::consts::{DEFAULT_TT_MB, MAX_THREADS};

/// Errors surfaced by the engine facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A hash table budget that cannot be honored.
    #[error("bad hash configuration: {0}")]
    HashConfig(String),
    /// Options may only change, and searches only start, while idle.
    #[error("a search is already running")]
    SearchActive,
    /// The position has no legal moves, so there is nothing to search.
    #[error("no legal moves in the given position")]
    NoLegalMoves,
}

/// The tunable engine options. Options may only be changed while no
/// search is running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Transposition table size in megabytes.
    pub hash_size_mb: usize,
    /// Number of search workers.
    pub threads: usize,
    /// Consult the opening book before searching.
    pub use_book: bool,
    /// Path handed to the opening-book provider.
    pub book_path: Option<String>,
    /// Path handed to the endgame-tablebase provider.
    pub egtb_path: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> EngineOptions {
        EngineOptions {
            hash_size_mb: DEFAULT_TT_MB,
            threads: num_cpus::get(),
            use_book: false,
            book_path: None,
            egtb_path: None,
        }
    }
}

impl EngineOptions {
    /// Validates the option values against the limits the engine can
    /// honor.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.hash_size_mb == 0 {
            return Err(EngineError::HashConfig(
                "hash size must be at least 1 MB".to_owned(),
            ));
        }
        if self.hash_size_mb > 1 << 20 {
            return Err(EngineError::HashConfig(format!(
                "{} MB exceeds the addressable budget",
                self.hash_size_mb
            )));
        }
        if self.threads == 0 || self.threads > MAX_THREADS {
            return Err(EngineError::HashConfig(format!(
                "thread count {} outside 1..={}",
                self.threads, MAX_THREADS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_hash_rejected() {
        let opts = EngineOptions {
            hash_size_mb: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn thread_bounds() {
        let opts = EngineOptions {
            threads: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
        let opts = EngineOptions {
            threads: 10_000,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }
}
