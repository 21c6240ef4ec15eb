//! FEN (Forsyth–Edwards Notation) parsing and emission.
//!
//! Parsing is strict: the six fields must all be present, the placement
//! must name exactly one king per side with no pawns on the back ranks,
//! and the resulting position must be reachable in principle (the side not
//! on move may not be in check, at most two pieces may give check, and a
//! claimed en-passant square must sit behind an enemy pawn that could just
//! have double-pushed).

use thiserror::Error;

use crate::core::bitboard::BitBoard;
use crate::core::sq::{NO_SQ, SQ};
use crate::core::{File, Piece, PieceType, Player, Rank};

use super::castling::Castling;
use super::Position;

/// The FEN of the standard starting position.
pub const START_POS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Failure to build a position from a FEN string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 whitespace-separated fields, found {0}")]
    WrongFieldCount(usize),
    #[error("expected 8 ranks in the placement field, found {0}")]
    WrongRankCount(usize),
    #[error("rank {rank} describes {squares} squares")]
    BadRankWidth { rank: usize, squares: usize },
    #[error("unrecognized piece character {0:?}")]
    BadPiece(char),
    #[error("unrecognized side to move {0:?}")]
    BadSideToMove(String),
    #[error("unrecognized castling field {0:?}")]
    BadCastling(String),
    #[error("unreadable en-passant field {0:?}")]
    BadEnPassant(String),
    #[error("en-passant square {0} is impossible in this position")]
    ImpossibleEnPassant(String),
    #[error("unreadable clock field {0:?}")]
    BadClock(String),
    #[error("side {0} has {1} kings")]
    WrongKingCount(Player, u8),
    #[error("pawn on a back rank")]
    PawnOnBackRank,
    #[error("side {0} has {1} pawns")]
    TooManyPawns(Player, u8),
    #[error("the side not on move is in check")]
    OppositeCheck,
    #[error("{0} pieces give check at once")]
    TooManyCheckers(u8),
}

impl Position {
    /// Builds a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::WrongFieldCount(fields.len()));
        }

        let mut pos = Position::blank();

        // Piece placement, rank 8 first.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongRankCount(ranks.len()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let piece = Piece::from_char(c).ok_or(FenError::BadPiece(c))?;
                    if file >= 8 {
                        return Err(FenError::BadRankWidth {
                            rank: rank + 1,
                            squares: file + 1,
                        });
                    }
                    pos.place_for_setup(piece, SQ((rank * 8 + file) as u8));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BadRankWidth {
                    rank: rank + 1,
                    squares: file,
                });
            }
        }

        // Side to move.
        let turn = match fields[1] {
            "w" => Player::White,
            "b" => Player::Black,
            other => return Err(FenError::BadSideToMove(other.to_string())),
        };

        // Castling rights. Rights whose king or rook has left its start
        // square are dropped rather than rejected.
        let mut castling = Castling::empty();
        for c in fields[2].chars() {
            if !castling.add_fen_char(c) {
                return Err(FenError::BadCastling(fields[2].to_string()));
            }
        }
        retain_consistent_rights(&pos, &mut castling);

        // En-passant square.
        let ep_square = parse_ep_field(fields[3])?;

        // Clocks.
        let rule_50: u16 = fields[4]
            .parse()
            .map_err(|_| FenError::BadClock(fields[4].to_string()))?;
        let full_moves: u16 = fields[5]
            .parse()
            .map_err(|_| FenError::BadClock(fields[5].to_string()))?;
        let mut half_moves = full_moves.max(1).saturating_sub(1) * 2;
        if turn == Player::Black {
            half_moves += 1;
        }

        pos.setup_state(turn, castling, ep_square, rule_50, half_moves);
        pos.set_keys();
        pos.set_checkers();
        validate(&pos, fields[3])?;
        Ok(pos)
    }

    /// The FEN string of this position.
    pub fn fen(&self) -> String {
        let mut s = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                let piece = self.piece_at(SQ((rank * 8 + file) as u8));
                if piece.is_none() {
                    empty += 1;
                } else {
                    if empty > 0 {
                        s.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    s.push(piece.character());
                }
            }
            if empty > 0 {
                s.push((b'0' + empty) as char);
            }
            if rank > 0 {
                s.push('/');
            }
        }

        s.push(' ');
        s.push(if self.turn() == Player::White { 'w' } else { 'b' });
        s.push(' ');
        s.push_str(&self.castling().fen_string());
        s.push(' ');
        if self.ep_square() == NO_SQ {
            s.push('-');
        } else {
            s.push_str(&self.ep_square().to_string());
        }
        s.push(' ');
        s.push_str(&self.rule_50().to_string());
        s.push(' ');
        s.push_str(&(self.half_moves() / 2 + 1).to_string());
        s
    }
}

fn parse_ep_field(field: &str) -> Result<SQ, FenError> {
    if field == "-" {
        return Ok(NO_SQ);
    }
    let mut chars = field.chars();
    let file = chars
        .next()
        .and_then(File::from_char)
        .ok_or_else(|| FenError::BadEnPassant(field.to_string()))?;
    let rank = chars
        .next()
        .and_then(Rank::from_char)
        .ok_or_else(|| FenError::BadEnPassant(field.to_string()))?;
    if chars.next().is_some() {
        return Err(FenError::BadEnPassant(field.to_string()));
    }
    Ok(SQ::make(file, rank))
}

/// Drops castling rights whose king or rook is not on its start square.
fn retain_consistent_rights(pos: &Position, castling: &mut Castling) {
    let checks = [
        (Castling::WHITE_K, SQ::E1, Piece::WhiteKing, SQ::H1, Piece::WhiteRook),
        (Castling::WHITE_Q, SQ::E1, Piece::WhiteKing, SQ::A1, Piece::WhiteRook),
        (Castling::BLACK_K, SQ::E8, Piece::BlackKing, SQ::H8, Piece::BlackRook),
        (Castling::BLACK_Q, SQ::E8, Piece::BlackKing, SQ::A8, Piece::BlackRook),
    ];
    for (flag, k_sq, king, r_sq, rook) in checks {
        if castling.contains(flag)
            && (pos.piece_at(k_sq) != king || pos.piece_at(r_sq) != rook)
        {
            castling.remove(flag);
        }
    }
}

/// Position-level validation after the fields are assembled.
fn validate(pos: &Position, ep_field: &str) -> Result<(), FenError> {
    for player in [Player::White, Player::Black] {
        let kings = pos.piece_bb(player, PieceType::K).count_bits();
        if kings != 1 {
            return Err(FenError::WrongKingCount(player, kings));
        }
        let pawns = pos.piece_bb(player, PieceType::P).count_bits();
        if pawns > 8 {
            return Err(FenError::TooManyPawns(player, pawns));
        }
    }

    if (pos.piece_bb_both(PieceType::P) & (BitBoard::RANK_1 | BitBoard::RANK_8)).is_not_empty() {
        return Err(FenError::PawnOnBackRank);
    }

    if pos.king_attacked(pos.turn().other()) {
        return Err(FenError::OppositeCheck);
    }

    let checkers = pos.checkers().count_bits();
    if checkers > 2 {
        return Err(FenError::TooManyCheckers(checkers));
    }

    let ep = pos.ep_square();
    if ep != NO_SQ {
        let us = pos.turn();
        let them = us.other();
        let expected_rank = us.relative_rank(Rank::R6);
        let victim_sq = SQ((ep.0 as i8 - us.pawn_push()) as u8);
        let valid = ep.rank() == expected_rank
            && pos.piece_at(ep).is_none()
            && pos.piece_at(victim_sq) == Piece::make(them, PieceType::P);
        if !valid {
            return Err(FenError::ImpossibleEnPassant(ep_field.to_string()));
        }
    }
    Ok(())
}

/// A corpus of standard positions used across the test suites.
pub static TEST_FENS: &[&str] = &[
    START_POS_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2pP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "4rrk1/pp1n3p/3q2pQ/2p1pb2/2PP4/2P3N1/P2B2PP/4RRK1 b - - 7 19",
    "r1bq1rk1/ppp1nppp/4n3/3p3Q/3P4/1BP1B3/PP1N2PP/R4RK1 w - - 1 16",
    "2rqkb1r/ppp2p2/2npb1p1/1N1Nn2p/2P1PP2/8/PP2B1PP/R1BQK2R b KQ - 0 11",
    "8/6pk/1p6/8/PP3p1p/5P2/4KP1q/3Q4 w - - 0 1",
    "7k/3p2pp/4q3/8/4Q3/5Kp1/P6b/8 w - - 0 1",
    "8/2p5/8/2kPKp1p/2p4P/2P5/3P4/8 w - - 0 1",
    "8/1p3pp1/7p/5P1P/2k3P1/8/2K2P2/8 w - - 0 1",
    "5k2/7R/4P2p/5K2/p1r2P1p/8/8/8 b - - 0 1",
    "6k1/6p1/P6p/r1N5/5p2/7P/1b3PP1/4R1K1 w - - 0 1",
    "1r3k2/4q3/2Pp3b/3Bp3/2Q2p2/1p1P2P1/1P2KP2/3N4 w - - 0 1",
    "6k1/4pp1p/3p2p1/P1pPb3/R7/1r2P1PP/3B1P2/6K1 w - - 0 1",
    "8/3p3B/5p2/5P2/p7/PP5b/k7/6K1 w - - 0 1",
    "2K5/p7/7P/5pR1/8/5k2/r7/8 w - - 0 1",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pos_round_trip() {
        let pos = Position::start_pos();
        assert_eq!(pos.fen(), START_POS_FEN);
    }

    #[test]
    fn corpus_round_trips() {
        for fen in TEST_FENS {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(&pos.fen(), fen, "round trip failed");
        }
    }

    #[test]
    fn rejects_malformed() {
        assert!(Position::from_fen("").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err()); // no kings
        assert!(Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/7P/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        )
        .is_err()); // nine white pawns
        assert!(Position::from_fen("k7/8/8/8/8/8/8/KP6 w - - 0 1").is_err()); // pawn on rank 1
        assert!(Position::from_fen("kQ6/8/8/8/8/8/8/K7 w - - 0 1").is_err()); // opponent in check
        assert!(Position::from_fen("k7/8/8/8/8/8/8/K7 w - e6 0 1").is_err()); // phantom ep
        assert!(Position::from_fen("k7/8/8/8/8/8/8/K7 x - - 0 1").is_err());
        assert!(Position::from_fen("k7/8/8/8/8/8/8/K7 w - - 0").is_err());
    }

    #[test]
    fn inconsistent_rights_dropped() {
        // White king not on e1: all white rights go away.
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/R4K1R w KQ - 0 1").unwrap();
        assert!(pos.castling().is_empty());
    }
}
