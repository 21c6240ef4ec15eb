//! Zobrist keys. Drawn once per process from the seeded generator; stable
//! within a run, which is all the hash tables require.

use crate::core::masks::*;
use crate::core::sq::SQ;
use crate::core::Piece;
use crate::tools::prng::Prng;

const ZOBRIST_SEED: u64 = 23_081;

static mut PIECE_SQUARE: [[u64; PIECE_CNT]; SQ_CNT] = [[0; PIECE_CNT]; SQ_CNT];
static mut EN_PASSANT_FILE: [u64; FILE_CNT] = [0; FILE_CNT];
static mut CASTLE: [u64; ALL_CASTLING_RIGHTS] = [0; ALL_CASTLING_RIGHTS];
static mut SIDE: u64 = 0;

/// Fills the key tables. The key for a rights combination is the XOR of the
/// keys of its individual rights, so incremental updates can fold rights in
/// and out one mask at a time.
#[cold]
pub fn init_zobrist() {
    let mut rng = Prng::init(ZOBRIST_SEED);
    unsafe {
        for sq in 0..SQ_CNT {
            for piece in 1..PIECE_CNT {
                PIECE_SQUARE[sq][piece] = rng.rand();
            }
        }
        for file in 0..FILE_CNT {
            EN_PASSANT_FILE[file] = rng.rand();
        }

        let mut single: [u64; 4] = [0; 4];
        for (i, key) in single.iter_mut().enumerate() {
            *key = rng.rand();
            CASTLE[1 << i] = *key;
        }
        for rights in 0..ALL_CASTLING_RIGHTS {
            let mut k = 0;
            for (i, key) in single.iter().enumerate() {
                if rights & (1 << i) != 0 {
                    k ^= *key;
                }
            }
            CASTLE[rights] = k;
        }

        SIDE = rng.rand();
    }
}

/// Key for a piece standing on a square.
#[inline(always)]
pub fn z_piece(sq: SQ, piece: Piece) -> u64 {
    debug_assert!(sq.is_okay());
    debug_assert!(piece.is_some());
    unsafe {
        *PIECE_SQUARE
            .get_unchecked(sq.0 as usize)
            .get_unchecked(piece as usize)
    }
}

/// Key for an en-passant target on the square's file.
#[inline(always)]
pub fn z_ep(sq: SQ) -> u64 {
    debug_assert!(sq.is_okay());
    unsafe { *EN_PASSANT_FILE.get_unchecked(sq.file_idx() as usize) }
}

/// Key for a castling-rights combination (4 bits).
#[inline(always)]
pub fn z_castle(rights: u8) -> u64 {
    debug_assert!((rights as usize) < ALL_CASTLING_RIGHTS);
    unsafe { *CASTLE.get_unchecked(rights as usize) }
}

/// Key folded in when Black is to move.
#[inline(always)]
pub fn z_side() -> u64 {
    unsafe { SIDE }
}
