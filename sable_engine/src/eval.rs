//! Position scoring. The search depends only on the [`Evaluator`] trait;
//! [`ClassicEval`] is the material + piece-square implementation shipped
//! with the engine, with its pawn-structure term cached in the shared pawn
//! table and whole evaluations cached in the evaluation table.

use sable::core::score::Value;
use sable::{lookup, BitBoard, PieceType, Player, Position, SQ};

use crate::tables::{Bound, SharedTables};

/// A static position scorer. Scores are centipawns from the side-to-move's
/// point of view.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, pos: &Position, tables: &SharedTables) -> Value;
}

/// Material + piece-square evaluation with a pawn-structure term.
pub struct ClassicEval;

// Piece-square tables from White's side, index 0 = a1.
#[rustfmt::skip]
static PAWN_PST: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
static KNIGHT_PST: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
static BISHOP_PST: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
static ROOK_PST: [i32; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
static QUEEN_PST: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -10,   5,   5,   5,   5,   5,   0, -10,
      0,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
static KING_PST: [i32; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

const ISOLATED_PAWN: i32 = -15;
const DOUBLED_PAWN: i32 = -10;
const PASSED_PAWN_BY_RANK: [i32; 8] = [0, 5, 10, 20, 35, 60, 100, 0];

fn pst(pt: PieceType, sq: SQ) -> i32 {
    let i = sq.0 as usize;
    match pt {
        PieceType::P => PAWN_PST[i],
        PieceType::N => KNIGHT_PST[i],
        PieceType::B => BISHOP_PST[i],
        PieceType::R => ROOK_PST[i],
        PieceType::Q => QUEEN_PST[i],
        PieceType::K => KING_PST[i],
        PieceType::None => 0,
    }
}

impl ClassicEval {
    /// Material and piece placement for one player, from that player's
    /// point of view.
    fn player_score(pos: &Position, player: Player) -> i32 {
        let mut score = 0;
        for pt in [
            PieceType::P,
            PieceType::N,
            PieceType::B,
            PieceType::R,
            PieceType::Q,
            PieceType::K,
        ] {
            let mut pieces = pos.piece_bb(player, pt);
            while let Some(sq) = pieces.pop_some_lsb() {
                score += pt.value();
                score += pst(pt, player.relative_square(sq));
            }
        }
        score
    }

    /// Pawn-structure score from White's point of view, cached in the
    /// shared pawn table under the pawn-and-king key.
    fn pawn_structure(pos: &Position, tables: &SharedTables) -> i32 {
        if let Some(entry) = tables.pt.get(pos.pawn_key()) {
            return entry.score as i32;
        }

        let mut score = 0;
        for player in [Player::White, Player::Black] {
            let own = pos.piece_bb(player, PieceType::P);
            let enemy = pos.piece_bb(player.other(), PieceType::P);
            let mut side = 0;
            let mut pawns = own;
            while let Some(sq) = pawns.pop_some_lsb() {
                if (lookup::adjacent_files(sq.file()) & own).is_empty() {
                    side += ISOLATED_PAWN;
                }
                if (lookup::forward_file_bb(player, sq) & own).is_not_empty() {
                    side += DOUBLED_PAWN;
                }
                if (lookup::passed_pawn_mask(player, sq) & enemy).is_empty() {
                    let rel_rank = player.relative_rank(sq.rank()) as usize;
                    side += PASSED_PAWN_BY_RANK[rel_rank];
                }
            }
            score += if player == Player::White { side } else { -side };
        }

        tables.pt.put(pos.pawn_key(), score.clamp(-30_000, 30_000) as i16);
        score
    }

    /// A small bonus for the bishop pair.
    fn bishop_pair(pos: &Position, player: Player) -> i32 {
        let bishops = pos.piece_bb(player, PieceType::B);
        if (bishops & BitBoard::DARK_SQUARES).is_not_empty()
            && (bishops & BitBoard::LIGHT_SQUARES).is_not_empty()
        {
            30
        } else {
            0
        }
    }
}

impl Evaluator for ClassicEval {
    fn evaluate(&self, pos: &Position, tables: &SharedTables) -> Value {
        if let Some(entry) = tables.et.get(pos.key()) {
            if entry.bound == Bound::Exact {
                return entry.score as Value;
            }
        }

        let white = ClassicEval::player_score(pos, Player::White)
            + ClassicEval::bishop_pair(pos, Player::White);
        let black = ClassicEval::player_score(pos, Player::Black)
            + ClassicEval::bishop_pair(pos, Player::Black);
        let mut score = white - black + ClassicEval::pawn_structure(pos, tables);

        if pos.turn() == Player::Black {
            score = -score;
        }
        // A tiny bonus for having the move keeps evaluation asymmetric.
        score += 10;

        let score = score.clamp(-30_000, 30_000);
        tables.et.put(pos.key(), score as i16, Bound::Exact);
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> SharedTables {
        SharedTables::new(1, 1, 1).unwrap()
    }

    #[test]
    fn start_pos_is_balanced() {
        let pos = Position::start_pos();
        let t = tables();
        let score = ClassicEval.evaluate(&pos, &t);
        // Symmetric position: only the side-to-move bonus remains.
        assert_eq!(score, 10);
    }

    #[test]
    fn extra_queen_wins_the_eval() {
        let pos = Position::from_fen("6k1/8/8/8/8/8/3Q4/6K1 w - - 0 1").unwrap();
        let t = tables();
        assert!(ClassicEval.evaluate(&pos, &t) > 800);
        // And from Black's point of view it is bad.
        let pos = Position::from_fen("6k1/8/8/8/8/8/3Q4/6K1 b - - 0 1").unwrap();
        assert!(ClassicEval.evaluate(&pos, &t) < -800);
    }

    #[test]
    fn eval_is_cached() {
        let pos = Position::start_pos();
        let t = tables();
        let first = ClassicEval.evaluate(&pos, &t);
        assert_eq!(t.et.get(pos.key()).unwrap().score as i32, first);
        assert!(t.pt.get(pos.pawn_key()).is_some());
        assert_eq!(ClassicEval.evaluate(&pos, &t), first);
    }

    #[test]
    fn passed_pawn_rewarded() {
        let t = tables();
        let with_passer =
            Position::from_fen("6k1/8/8/3P4/8/8/8/6K1 w - - 0 1").unwrap();
        let without =
            Position::from_fen("6k1/3p4/8/3P4/8/8/8/6K1 w - - 0 1").unwrap();
        let a = ClassicEval.evaluate(&with_passer, &t);
        let b = ClassicEval.evaluate(&without, &t);
        assert!(a > b);
    }
}
