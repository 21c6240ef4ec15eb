//! The per-move state snapshot. `Position::make_move` pushes one of these
//! before mutating, and `unmake_move` restores from it bit-for-bit. Only
//! the irreversible parts of the position live here; the piece placement
//! itself is undone by replaying the move backwards.

use super::castling::Castling;
use crate::core::bitboard::BitBoard;
use crate::core::sq::SQ;
use crate::core::Piece;

/// State captured before a move is made.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Castling rights before the move.
    pub castling: Castling,
    /// En-passant target square before the move, `NO_SQ` if none.
    pub ep_square: SQ,
    /// Halfmove clock before the move.
    pub rule_50: u16,
    /// The piece the move captured, `Piece::None` for quiet moves.
    pub captured: Piece,
    /// Pieces that were giving check before the move.
    pub checkers: BitBoard,
    /// Zobrist key before the move.
    pub key: u64,
    /// Pawn-and-king Zobrist key before the move.
    pub pawn_key: u64,
}
