//! The transposition table: maps position keys to the best move found, the
//! score, the depth it was searched to and the bound kind of that score.

use sable::Move;

use super::{SlotArray, GENERATION_MASK};
use crate::options::EngineError;

/// How a stored score relates to the true value of the position.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Bound {
    /// The score failed high: a lower bound on the true value.
    Lower = 1,
    /// The score failed low: an upper bound on the true value.
    Upper = 2,
    /// The score is exact.
    Exact = 3,
}

impl Bound {
    #[inline]
    fn from_bits(bits: u64) -> Bound {
        match bits & 0b11 {
            1 => Bound::Lower,
            2 => Bound::Upper,
            _ => Bound::Exact,
        }
    }

    /// True if a stored score with this bound can settle a node whose
    /// current value relative to the probe window is `score >= beta`.
    #[inline]
    pub fn cuts(self, score: i32, beta: i32) -> bool {
        if score >= beta {
            self as u8 & Bound::Lower as u8 != 0
        } else {
            self as u8 & Bound::Upper as u8 != 0
        }
    }
}

/// A decoded transposition entry.
#[derive(Copy, Clone, Debug)]
pub struct TransEntry {
    /// The stored best move. `None` when the entry carries no move or the
    /// move bits failed validation.
    pub mv: Option<Move>,
    /// Stored score, normalized to distance-from-root by the writer.
    pub score: i16,
    /// Search depth the score came from.
    pub depth: u8,
    /// Bound kind of the score.
    pub bound: Bound,
    /// Generation the entry was written in.
    pub generation: u8,
}

// Payload layout: move 32 | score 16 | depth 8 | bound 2 | generation 6.
fn encode(mv: Move, score: i16, depth: u8, bound: Bound, generation: u8) -> u64 {
    (mv.raw() as u64)
        | ((score as u16 as u64) << 32)
        | ((depth as u64) << 48)
        | ((bound as u64) << 56)
        | (((generation as u64) & GENERATION_MASK) << 58)
}

fn decode(payload: u64) -> TransEntry {
    TransEntry {
        mv: Move::from_raw(payload as u32).filter(|m| !m.is_null()),
        score: (payload >> 32) as u16 as i16,
        depth: (payload >> 48) as u8,
        bound: Bound::from_bits(payload >> 56),
        generation: ((payload >> 58) & GENERATION_MASK) as u8,
    }
}

/// The shared transposition table.
pub struct TransTable {
    array: SlotArray,
}

impl TransTable {
    /// Allocates a table of roughly `megabytes` MB.
    pub fn new(megabytes: usize) -> Result<TransTable, EngineError> {
        Ok(TransTable {
            array: SlotArray::with_budget(megabytes)?,
        })
    }

    /// Looks the key up in both probe slots.
    pub fn get(&self, key: u64) -> Option<TransEntry> {
        let (first, second) = self.array.probe_pair(key);
        first
            .read(key)
            .or_else(|| second.read(key))
            .map(decode)
    }

    /// Stores an entry. An existing entry for the same key survives unless
    /// the newcomer searched at least as deep and does not replace an
    /// exact score with a mere bound; entries from earlier generations
    /// always lose.
    pub fn put(&self, key: u64, mv: Move, score: i16, depth: u8, bound: Bound) {
        let generation = self.array.generation();
        let payload = encode(mv, score, depth, bound, generation);
        let (first, second) = self.array.probe_pair(key);

        for slot in [first, second] {
            if let Some(old) = slot.read(key) {
                let old = decode(old);
                let stale = old.generation != generation;
                let deeper = depth >= old.depth
                    && (bound == Bound::Exact || old.bound != Bound::Exact);
                if stale || deeper {
                    slot.write(key, payload);
                }
                return;
            }
            if slot.is_empty() {
                slot.write(key, payload);
                return;
            }
        }
        second.write(key, payload);
    }

    pub fn new_generation(&self) {
        self.array.new_generation();
    }

    pub fn clear(&self) {
        self.array.clear();
    }

    /// Approximate fill ratio in [0, 1].
    pub fn load_factor(&self) -> f64 {
        self.array.load_factor()
    }

    /// Number of entries the table can hold.
    pub fn capacity(&self) -> usize {
        self.array.capacity()
    }

    /// Brings the probe slots for `key` into cache ahead of a probe.
    #[inline(always)]
    pub fn prefetch(&self, key: u64) {
        super::prefetch_slot(&self.array, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::core::sq::SQ;
    use sable::{MoveKind, Piece};

    fn mv(from: u8, to: u8) -> Move {
        Move::make(SQ(from), SQ(to), Piece::WhiteKnight, Piece::None, MoveKind::Normal)
    }

    #[test]
    fn store_and_probe() {
        let tt = TransTable::new(1).unwrap();
        tt.put(0x1234_5678_9ABC_DEF0, mv(1, 18), 77, 9, Bound::Exact);
        let e = tt.get(0x1234_5678_9ABC_DEF0).unwrap();
        assert_eq!(e.mv, Some(mv(1, 18)));
        assert_eq!(e.score, 77);
        assert_eq!(e.depth, 9);
        assert_eq!(e.bound, Bound::Exact);
        assert!(tt.get(0x1234_5678_9ABC_DEF1).is_none());
    }

    #[test]
    fn shallow_does_not_replace_deep() {
        let tt = TransTable::new(1).unwrap();
        let key = 0xABCD_EF01_2345_6789;
        tt.put(key, mv(1, 18), 50, 12, Bound::Exact);
        tt.put(key, mv(2, 19), -3, 4, Bound::Exact);
        let e = tt.get(key).unwrap();
        assert_eq!(e.depth, 12);
        assert_eq!(e.mv, Some(mv(1, 18)));
    }

    #[test]
    fn bound_does_not_replace_exact_at_same_depth() {
        let tt = TransTable::new(1).unwrap();
        let key = 0x1111_2222_3333_4444;
        tt.put(key, mv(1, 18), 50, 8, Bound::Exact);
        tt.put(key, mv(2, 19), 99, 8, Bound::Lower);
        assert_eq!(tt.get(key).unwrap().score, 50);
        tt.put(key, mv(2, 19), 99, 9, Bound::Exact);
        assert_eq!(tt.get(key).unwrap().score, 99);
    }

    #[test]
    fn stale_generation_always_loses() {
        let tt = TransTable::new(1).unwrap();
        let key = 0x5555_6666_7777_8888;
        tt.put(key, mv(1, 18), 50, 20, Bound::Exact);
        tt.new_generation();
        tt.put(key, mv(2, 19), 10, 1, Bound::Lower);
        let e = tt.get(key).unwrap();
        assert_eq!(e.depth, 1);
        assert_eq!(e.mv, Some(mv(2, 19)));
    }

    #[test]
    fn garbage_move_bits_read_back_as_none() {
        let e = decode(encode(Move::null(), 0, 0, Bound::Lower, 0));
        assert_eq!(e.mv, None);
    }

    #[test]
    fn negative_scores_survive() {
        let tt = TransTable::new(1).unwrap();
        tt.put(9_876_543, mv(1, 18), -31_500, 3, Bound::Upper);
        assert_eq!(tt.get(9_876_543).unwrap().score, -31_500);
    }
}
