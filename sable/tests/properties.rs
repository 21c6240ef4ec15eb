//! Property-based invariants over random move sequences.

use proptest::prelude::*;

use sable::position::fen::TEST_FENS;
use sable::Position;

/// Plays the move picked by each index in `picks` (modulo the number of
/// legal moves) and returns the resulting position.
fn play_walk(mut pos: Position, picks: &[usize]) -> Position {
    for &pick in picks {
        let moves = pos.legal_moves();
        if moves.is_empty() {
            break;
        }
        pos.make_move(moves[pick % moves.len()]);
    }
    pos
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn dual_representation_agrees(
        fen_idx in 0..TEST_FENS.len(),
        picks in prop::collection::vec(0usize..256, 0..32),
    ) {
        let pos = play_walk(Position::from_fen(TEST_FENS[fen_idx]).unwrap(), &picks);
        prop_assert!(pos.is_okay().is_ok());
    }

    #[test]
    fn zobrist_incremental_equals_full(
        fen_idx in 0..TEST_FENS.len(),
        picks in prop::collection::vec(0usize..256, 0..32),
    ) {
        let pos = play_walk(Position::from_fen(TEST_FENS[fen_idx]).unwrap(), &picks);
        let (key, pawn_key) = pos.rehash();
        prop_assert_eq!(pos.key(), key);
        prop_assert_eq!(pos.pawn_key(), pawn_key);
    }

    #[test]
    fn side_not_to_move_never_in_check(
        fen_idx in 0..TEST_FENS.len(),
        picks in prop::collection::vec(0usize..256, 0..32),
    ) {
        let pos = play_walk(Position::from_fen(TEST_FENS[fen_idx]).unwrap(), &picks);
        prop_assert!(!pos.king_attacked(pos.turn().other()));
    }

    #[test]
    fn legal_equals_filtered_pseudo_legal(
        fen_idx in 0..TEST_FENS.len(),
        picks in prop::collection::vec(0usize..256, 0..24),
    ) {
        let pos = play_walk(Position::from_fen(TEST_FENS[fen_idx]).unwrap(), &picks);
        let legal = pos.legal_moves();

        // Filter the pseudo-legal list by actually making each move and
        // testing whether the mover's king is attacked afterwards.
        let mut probe = pos.clone();
        let mover = probe.turn();
        let mut filtered = Vec::new();
        for m in pos.pseudo_legal_moves().iter() {
            probe.make_move(*m);
            if !probe.king_attacked(mover) {
                filtered.push(*m);
            }
            probe.unmake_move();
        }

        prop_assert_eq!(legal.len(), filtered.len());
        for m in legal.iter() {
            prop_assert!(filtered.contains(m));
        }
    }

    #[test]
    fn unmake_inverts_make(
        fen_idx in 0..TEST_FENS.len(),
        picks in prop::collection::vec(0usize..256, 1..24),
    ) {
        let start = Position::from_fen(TEST_FENS[fen_idx]).unwrap();
        let mut pos = start.clone();
        let mut made = 0;
        for &pick in &picks {
            let moves = pos.legal_moves();
            if moves.is_empty() {
                break;
            }
            pos.make_move(moves[pick % moves.len()]);
            made += 1;
        }
        for _ in 0..made {
            pos.unmake_move();
        }
        prop_assert_eq!(pos, start);
    }
}
