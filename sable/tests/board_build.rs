//! Building positions from FEN strings and checking structural invariants.

use sable::position::fen::TEST_FENS;
use sable::{PieceType, Player, Position};

#[test]
fn corpus_builds_clean() {
    for fen in TEST_FENS {
        let pos = Position::from_fen(fen).unwrap();
        pos.is_okay().unwrap();
        // The side not on move must never stand in check.
        assert!(!pos.king_attacked(pos.turn().other()), "fen: {}", fen);
    }
}

#[test]
fn start_pos_contents() {
    let pos = Position::start_pos();
    assert_eq!(pos.turn(), Player::White);
    assert_eq!(pos.occupied().count_bits(), 32);
    assert_eq!(pos.piece_bb(Player::White, PieceType::P).count_bits(), 8);
    assert_eq!(pos.piece_bb(Player::Black, PieceType::N).count_bits(), 2);
    assert_eq!(pos.king_sq(Player::White).to_string(), "e1");
    assert_eq!(pos.king_sq(Player::Black).to_string(), "e8");
    assert!(!pos.in_check());
    assert_eq!(pos.rule_50(), 0);
}

#[test]
fn keys_match_full_rehash_on_build() {
    for fen in TEST_FENS {
        let pos = Position::from_fen(fen).unwrap();
        let (key, pawn_key) = pos.rehash();
        assert_eq!(pos.key(), key);
        assert_eq!(pos.pawn_key(), pawn_key);
    }
}

#[test]
fn distinct_positions_distinct_keys() {
    let mut seen = std::collections::HashSet::new();
    for fen in TEST_FENS {
        let pos = Position::from_fen(fen).unwrap();
        assert!(seen.insert(pos.key()), "key collision for {}", fen);
    }
}
