//! Make/unmake round trips: after undoing a move the position must be
//! bit-for-bit what it was, Zobrist keys included, along random game walks
//! from every corpus position.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sable::position::fen::TEST_FENS;
use sable::{Move, Position};

fn random_walk(pos: &mut Position, rng: &mut StdRng, plies: usize) -> Vec<Move> {
    let mut played = Vec::new();
    for _ in 0..plies {
        let moves = pos.legal_moves();
        if moves.is_empty() {
            break;
        }
        let m = moves[rng.gen_range(0..moves.len())];
        pos.make_move(m);
        played.push(m);
    }
    played
}

#[test]
fn unmake_restores_exactly() {
    let mut rng = StdRng::seed_from_u64(0x5AB1E);
    for fen in TEST_FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        let reference = pos.clone();
        let played = random_walk(&mut pos, &mut rng, 40);
        for _ in 0..played.len() {
            pos.unmake_move();
        }
        assert_eq!(pos, reference, "walk did not unwind for {}", fen);
        assert_eq!(pos.fen(), reference.fen());
        assert_eq!(pos.key(), reference.key());
        assert_eq!(pos.pawn_key(), reference.pawn_key());
    }
}

#[test]
fn single_make_unmake_every_move() {
    for fen in TEST_FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        let reference = pos.clone();
        let moves = pos.legal_moves();
        for m in moves.iter() {
            pos.make_move(*m);
            pos.is_okay().unwrap();
            pos.unmake_move();
            assert_eq!(pos, reference, "move {} broke {}", m, fen);
        }
    }
}

#[test]
fn incremental_keys_match_rehash() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for fen in TEST_FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        for _ in 0..40 {
            let moves = pos.legal_moves();
            if moves.is_empty() {
                break;
            }
            let m = moves[rng.gen_range(0..moves.len())];
            pos.make_move(m);
            let (key, pawn_key) = pos.rehash();
            assert_eq!(pos.key(), key, "incremental key diverged in {}", fen);
            assert_eq!(pos.pawn_key(), pawn_key);
        }
    }
}

#[test]
fn null_move_round_trip() {
    for fen in TEST_FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        if pos.in_check() {
            continue;
        }
        let reference = pos.clone();
        pos.make_null_move();
        assert_eq!(pos.turn(), reference.turn().other());
        let (key, _) = pos.rehash();
        assert_eq!(pos.key(), key);
        pos.unmake_null_move();
        assert_eq!(pos, reference);
    }
}

#[test]
fn mover_never_leaves_own_king_attacked() {
    let mut rng = StdRng::seed_from_u64(991);
    for fen in TEST_FENS {
        let mut pos = Position::from_fen(fen).unwrap();
        for _ in 0..60 {
            let moves = pos.legal_moves();
            if moves.is_empty() {
                break;
            }
            let m = moves[rng.gen_range(0..moves.len())];
            let mover = pos.turn();
            pos.make_move(m);
            assert!(
                !pos.king_attacked(mover),
                "{} left its king in check after {} in {}",
                mover,
                m,
                fen
            );
        }
    }
}
