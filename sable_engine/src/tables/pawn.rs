//! The pawn-structure cache, keyed by the pawn-and-king Zobrist key. Pawn
//! structure changes far more slowly than the rest of the position, so
//! these entries enjoy very high hit rates.

use super::{SlotArray, GENERATION_MASK};
use crate::options::EngineError;

/// A decoded pawn-structure entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PawnEntry {
    /// Pawn-structure score from White's point of view.
    pub score: i16,
    /// Generation the entry was written in.
    pub generation: u8,
}

// Payload layout: score 16 | generation 6 | tag bit 63. The tag keeps a
// zero-score entry distinguishable from an empty slot.
const TAG: u64 = 1 << 63;

fn encode(score: i16, generation: u8) -> u64 {
    (score as u16 as u64) | (((generation as u64) & GENERATION_MASK) << 16) | TAG
}

fn decode(payload: u64) -> PawnEntry {
    PawnEntry {
        score: payload as u16 as i16,
        generation: ((payload >> 16) & GENERATION_MASK) as u8,
    }
}

/// The shared pawn-structure cache.
pub struct PawnTable {
    array: SlotArray,
}

impl PawnTable {
    pub fn new(megabytes: usize) -> Result<PawnTable, EngineError> {
        Ok(PawnTable {
            array: SlotArray::with_budget(megabytes)?,
        })
    }

    pub fn get(&self, pawn_key: u64) -> Option<PawnEntry> {
        let (first, second) = self.array.probe_pair(pawn_key);
        first.read(pawn_key).or_else(|| second.read(pawn_key)).map(decode)
    }

    /// Stores an entry; a same-key entry is simply refreshed.
    pub fn put(&self, pawn_key: u64, score: i16) {
        let payload = encode(score, self.array.generation());
        let (first, second) = self.array.probe_pair(pawn_key);

        for slot in [first, second] {
            if slot.holds(pawn_key) || slot.is_empty() {
                slot.write(pawn_key, payload);
                return;
            }
        }
        second.write(pawn_key, payload);
    }

    pub fn new_generation(&self) {
        self.array.new_generation();
    }

    pub fn clear(&self) {
        self.array.clear();
    }

    pub fn load_factor(&self) -> f64 {
        self.array.load_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_including_zero() {
        let pt = PawnTable::new(1).unwrap();
        pt.put(99, 0);
        assert_eq!(pt.get(99), Some(PawnEntry { score: 0, generation: 0 }));
        pt.put(99, -44);
        assert_eq!(pt.get(99).unwrap().score, -44);
    }
}
