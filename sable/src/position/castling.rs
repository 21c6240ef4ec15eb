//! Castling-rights tracking. A `Castling` is four bits, one per player/side
//! combination; a bit set means the relevant king and rook have not moved.

use std::fmt;

use bitflags::bitflags;

use crate::core::masks::*;
use crate::core::sq::SQ;
use crate::core::{CastleSide, Player};

bitflags! {
    /// The castling rights still available to both players.
    ///
    /// A set bit records possibility, not current legality: `WHITE_K` means
    /// neither the white king nor the h1 rook has moved, not that castling
    /// is playable this turn.
    pub struct Castling: u8 {
        const WHITE_K = C_WHITE_K_MASK;
        const WHITE_Q = C_WHITE_Q_MASK;
        const BLACK_K = C_BLACK_K_MASK;
        const BLACK_Q = C_BLACK_Q_MASK;
        const WHITE_ALL = Self::WHITE_K.bits | Self::WHITE_Q.bits;
        const BLACK_ALL = Self::BLACK_K.bits | Self::BLACK_Q.bits;
    }
}

impl Castling {
    /// True if `player` may still castle on `side`.
    #[inline]
    pub fn has(self, player: Player, side: CastleSide) -> bool {
        let flag = match (player, side) {
            (Player::White, CastleSide::King) => Castling::WHITE_K,
            (Player::White, CastleSide::Queen) => Castling::WHITE_Q,
            (Player::Black, CastleSide::King) => Castling::BLACK_K,
            (Player::Black, CastleSide::Queen) => Castling::BLACK_Q,
        };
        self.contains(flag)
    }

    /// Clears the rights invalidated by a move between `from` and `to`, and
    /// returns the bits that were actually removed (for the Zobrist fold).
    #[inline]
    pub fn update(&mut self, from: SQ, to: SQ) -> u8 {
        let mask = from.castle_rights_mask() | to.castle_rights_mask();
        let removed = self.bits & mask;
        self.bits &= !mask;
        removed
    }

    /// Adds a right from its FEN character. Unknown characters are an error
    /// handled by the FEN parser; `-` is a no-op.
    pub fn add_fen_char(&mut self, c: char) -> bool {
        self.bits |= match c {
            'K' => Castling::WHITE_K.bits,
            'Q' => Castling::WHITE_Q.bits,
            'k' => Castling::BLACK_K.bits,
            'q' => Castling::BLACK_Q.bits,
            '-' => 0,
            _ => return false,
        };
        true
    }

    /// FEN field for the rights, `-` when none remain.
    pub fn fen_string(self) -> String {
        if self.is_empty() {
            return "-".to_owned();
        }
        let mut s = String::with_capacity(4);
        if self.contains(Castling::WHITE_K) {
            s.push('K');
        }
        if self.contains(Castling::WHITE_Q) {
            s.push('Q');
        }
        if self.contains(Castling::BLACK_K) {
            s.push('k');
        }
        if self.contains(Castling::BLACK_Q) {
            s.push('q');
        }
        s
    }
}

impl fmt::Display for Castling {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(&self.fen_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_clears_by_square() {
        let mut c = Castling::all();
        let removed = c.update(SQ::E1, SQ(12));
        assert_eq!(removed, C_WHITE_K_MASK | C_WHITE_Q_MASK);
        assert!(!c.has(Player::White, CastleSide::King));
        assert!(c.has(Player::Black, CastleSide::Queen));

        let removed = c.update(SQ(48), SQ::H8);
        assert_eq!(removed, C_BLACK_K_MASK);
        assert_eq!(c, Castling::BLACK_Q);
    }

    #[test]
    fn fen_round_trip() {
        let mut c = Castling::empty();
        for ch in "Kq".chars() {
            assert!(c.add_fen_char(ch));
        }
        assert_eq!(c.fen_string(), "Kq");
        assert!(!c.add_fen_char('x'));
        assert_eq!(Castling::empty().fen_string(), "-");
    }
}
