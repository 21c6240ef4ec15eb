//! Move translation between the engine representation and the two common
//! text forms: UCI coordinate strings ("e2e4", "e7e8q") and Standard
//! Algebraic Notation ("Nf3", "exd5", "O-O", "e8=Q+").

use thiserror::Error;

use crate::core::move_list::MoveList;
use crate::core::piece_move::{Move, MoveKind};
use crate::core::sq::SQ;
use crate::core::{File, PieceType, Rank};

use super::Position;

/// Failure to resolve a move string against a position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("unreadable move string {0:?}")]
    Unreadable(String),
    #[error("{0:?} does not name a legal move in this position")]
    NotLegal(String),
    #[error("{0:?} matches more than one legal move")]
    Ambiguous(String),
}

impl Position {
    /// Resolves a UCI move string ("e2e4", "e7e8q") against the legal
    /// moves of this position.
    pub fn from_uci(&self, s: &str) -> Result<Move, MoveParseError> {
        let bytes = s.as_bytes();
        if bytes.len() < 4 || bytes.len() > 5 {
            return Err(MoveParseError::Unreadable(s.to_string()));
        }
        let from = parse_square(&s[0..2]).ok_or_else(|| MoveParseError::Unreadable(s.to_string()))?;
        let to = parse_square(&s[2..4]).ok_or_else(|| MoveParseError::Unreadable(s.to_string()))?;
        let promo = if bytes.len() == 5 {
            let pt = PieceType::from_char(bytes[4] as char)
                .filter(|pt| matches!(pt, PieceType::N | PieceType::B | PieceType::R | PieceType::Q))
                .ok_or_else(|| MoveParseError::Unreadable(s.to_string()))?;
            Some(pt)
        } else {
            None
        };

        self.legal_moves()
            .iter()
            .find(|m| {
                m.from() == from
                    && m.to() == to
                    && match promo {
                        Some(pt) => m.promotion_piece() == pt,
                        None => !m.is_promotion(),
                    }
            })
            .copied()
            .ok_or_else(|| MoveParseError::NotLegal(s.to_string()))
    }

    /// The SAN string of a legal move, with `+`/`#` suffix.
    pub fn to_san(&self, m: Move) -> String {
        let mut san = self.san_body(m);
        // Check or mate suffix comes from actually making the move.
        let mut probe = self.clone();
        probe.make_move(m);
        if probe.in_check() {
            san.push(if probe.checkmate() { '#' } else { '+' });
        }
        san
    }

    /// SAN without the check suffix.
    fn san_body(&self, m: Move) -> String {
        match m.kind() {
            MoveKind::ShortCastle => return "O-O".to_owned(),
            MoveKind::LongCastle => return "O-O-O".to_owned(),
            _ => {}
        }

        let pt = m.moved_piece().type_of();
        let mut san = String::with_capacity(8);

        if pt == PieceType::P {
            if m.is_capture() {
                san.push(m.from().file().char());
                san.push('x');
            }
            san.push_str(&m.to().to_string());
            if m.is_promotion() {
                san.push('=');
                san.push(m.promotion_piece().char_upper());
            }
        } else {
            san.push(pt.char_upper());
            san.push_str(&self.disambiguation(m));
            if m.is_capture() {
                san.push('x');
            }
            san.push_str(&m.to().to_string());
        }
        san
    }

    /// The disambiguation infix for a piece move: nothing when unique, the
    /// file when it settles it, the rank when the file does not, both when
    /// neither alone does.
    fn disambiguation(&self, m: Move) -> String {
        let pt = m.moved_piece().type_of();
        if pt == PieceType::K {
            return String::new();
        }
        let mut same_to = Vec::new();
        for other in self.legal_moves().iter() {
            if other.to() == m.to()
                && other.moved_piece() == m.moved_piece()
                && other.from() != m.from()
                && other.kind() == m.kind()
            {
                same_to.push(*other);
            }
        }
        if same_to.is_empty() {
            return String::new();
        }
        let from = m.from();
        let file_unique = !same_to.iter().any(|o| o.from().file() == from.file());
        let rank_unique = !same_to.iter().any(|o| o.from().rank() == from.rank());
        if file_unique {
            from.file().char().to_string()
        } else if rank_unique {
            from.rank().char().to_string()
        } else {
            from.to_string()
        }
    }

    /// Resolves a SAN string against the legal moves of this position.
    /// Decorations (`+`, `#`, `!`, `?`) are ignored.
    pub fn from_san(&self, s: &str) -> Result<Move, MoveParseError> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, '+' | '#' | '!' | '?'))
            .collect();
        if wanted.is_empty() {
            return Err(MoveParseError::Unreadable(s.to_string()));
        }

        let legal: MoveList = self.legal_moves();
        let mut matched: Option<Move> = None;
        for m in legal.iter() {
            if self.san_body(*m) == wanted {
                if matched.is_some() {
                    return Err(MoveParseError::Ambiguous(s.to_string()));
                }
                matched = Some(*m);
            }
        }
        matched.ok_or_else(|| MoveParseError::NotLegal(s.to_string()))
    }
}

fn parse_square(s: &str) -> Option<SQ> {
    let mut chars = s.chars();
    let file = File::from_char(chars.next()?)?;
    let rank = Rank::from_char(chars.next()?)?;
    Some(SQ::make(file, rank))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uci_round_trip() {
        let pos = Position::start_pos();
        let m = pos.from_uci("e2e4").unwrap();
        assert_eq!(m.to_uci(), "e2e4");
        assert!(pos.from_uci("e2e5").is_err());
        assert!(pos.from_uci("xyz").is_err());
    }

    #[test]
    fn uci_promotion() {
        let pos = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let m = pos.from_uci("a7a8q").unwrap();
        assert_eq!(m.promotion_piece(), PieceType::Q);
        let n = pos.from_uci("a7a8n").unwrap();
        assert_eq!(n.promotion_piece(), PieceType::N);
        assert!(pos.from_uci("a7a8").is_err());
    }

    #[test]
    fn san_basics() {
        let pos = Position::start_pos();
        let m = pos.from_san("Nf3").unwrap();
        assert_eq!(m.to_uci(), "g1f3");
        let m = pos.from_san("e4").unwrap();
        assert_eq!(m.to_uci(), "e2e4");
        assert!(pos.from_san("Ke2").is_err());
    }

    #[test]
    fn san_castling_and_checks() {
        let pos = Position::from_fen("5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let m = pos.from_san("O-O-O").unwrap();
        assert_eq!(m.kind(), MoveKind::LongCastle);
        // The rook lift to d1 does not give check to the h8 king; Rd8 would.
        assert_eq!(pos.to_san(m), "O-O-O");
    }

    #[test]
    fn san_disambiguation() {
        // Two knights can reach d2.
        let pos = Position::from_fen("k7/8/8/8/8/5N2/8/KN6 w - - 0 1").unwrap();
        let from_b1 = pos.from_san("Nbd2").unwrap();
        assert_eq!(from_b1.from(), SQ::B1);
        let from_f3 = pos.from_san("Nfd2").unwrap();
        assert_eq!(from_f3.from(), SQ(21));
        assert!(pos.from_san("Nd2").is_err());
    }

    #[test]
    fn san_mate_suffix() {
        let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1").unwrap();
        let m = pos.from_uci("e1e8").unwrap();
        assert_eq!(pos.to_san(m), "Re8#");
    }
}
