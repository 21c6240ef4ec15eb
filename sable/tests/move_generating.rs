//! Perft counts against the canonical seed positions. The moderate depths
//! run in CI; the full-depth counts are expensive and marked `#[ignore]`.

use sable::position::perft::{perft, perft_parallel};
use sable::Position;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2pP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

#[test]
fn perft_start_pos() {
    let pos = Position::start_pos();
    assert_eq!(perft(&pos, 1), 20);
    assert_eq!(perft(&pos, 2), 400);
    assert_eq!(perft(&pos, 3), 8_902);
    assert_eq!(perft(&pos, 4), 197_281);
    assert_eq!(perft(&pos, 5), 4_865_609);
}

#[test]
fn perft_kiwipete() {
    let pos = Position::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft(&pos, 1), 48);
    assert_eq!(perft(&pos, 2), 2_039);
    assert_eq!(perft(&pos, 3), 97_862);
    assert_eq!(perft(&pos, 4), 4_085_603);
}

#[test]
fn perft_position_3() {
    let pos = Position::from_fen(POSITION_3).unwrap();
    assert_eq!(perft(&pos, 1), 14);
    assert_eq!(perft(&pos, 2), 191);
    assert_eq!(perft(&pos, 3), 2_812);
    assert_eq!(perft(&pos, 4), 43_238);
    assert_eq!(perft(&pos, 5), 674_624);
}

#[test]
fn perft_position_4() {
    let pos = Position::from_fen(POSITION_4).unwrap();
    assert_eq!(perft(&pos, 1), 6);
    assert_eq!(perft(&pos, 2), 264);
    assert_eq!(perft(&pos, 3), 9_467);
    assert_eq!(perft(&pos, 4), 422_333);
}

#[test]
fn perft_position_5() {
    let pos = Position::from_fen(POSITION_5).unwrap();
    assert_eq!(perft(&pos, 1), 44);
    assert_eq!(perft(&pos, 2), 1_486);
    assert_eq!(perft(&pos, 3), 62_379);
    assert_eq!(perft(&pos, 4), 2_103_487);
}

#[test]
#[ignore = "minutes of work; run with --ignored for the full certification"]
fn perft_deep_certification() {
    let pos = Position::start_pos();
    assert_eq!(perft_parallel(&pos, 6), 119_060_324);

    let pos = Position::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft_parallel(&pos, 5), 193_690_690);

    let pos = Position::from_fen(POSITION_3).unwrap();
    assert_eq!(perft_parallel(&pos, 6), 11_030_083);

    let pos = Position::from_fen(POSITION_4).unwrap();
    assert_eq!(perft_parallel(&pos, 5), 15_833_292);
}
