//! The evaluation cache: position key to static evaluation.

use super::transposition::Bound;
use super::{SlotArray, GENERATION_MASK};
use crate::options::EngineError;

/// A decoded evaluation entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvalEntry {
    /// Static evaluation from the side-to-move's point of view.
    pub score: i16,
    /// Bound kind; `Exact` for full evaluations, bounds for lazy exits.
    pub bound: Bound,
    /// Generation the entry was written in.
    pub generation: u8,
}

// Payload layout: score 16 | bound 2 | generation 6.
fn encode(score: i16, bound: Bound, generation: u8) -> u64 {
    (score as u16 as u64)
        | ((bound as u64) << 16)
        | (((generation as u64) & GENERATION_MASK) << 18)
}

fn decode(payload: u64) -> EvalEntry {
    EvalEntry {
        score: payload as u16 as i16,
        bound: match (payload >> 16) & 0b11 {
            1 => Bound::Lower,
            2 => Bound::Upper,
            _ => Bound::Exact,
        },
        generation: ((payload >> 18) & GENERATION_MASK) as u8,
    }
}

/// The shared evaluation cache.
pub struct EvalTable {
    array: SlotArray,
}

impl EvalTable {
    pub fn new(megabytes: usize) -> Result<EvalTable, EngineError> {
        Ok(EvalTable {
            array: SlotArray::with_budget(megabytes)?,
        })
    }

    pub fn get(&self, key: u64) -> Option<EvalEntry> {
        let (first, second) = self.array.probe_pair(key);
        first.read(key).or_else(|| second.read(key)).map(decode)
    }

    /// Stores an entry. A newer generation always wins; within the same
    /// generation an exact score is not replaced by a bound.
    pub fn put(&self, key: u64, score: i16, bound: Bound) {
        let generation = self.array.generation();
        let payload = encode(score, bound, generation);
        let (first, second) = self.array.probe_pair(key);

        for slot in [first, second] {
            if let Some(old) = slot.read(key) {
                let old = decode(old);
                if old.generation != generation
                    || bound == Bound::Exact
                    || old.bound != Bound::Exact
                {
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

    pub fn load_factor(&self) -> f64 {
        self.array.load_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let et = EvalTable::new(1).unwrap();
        et.put(42, -250, Bound::Exact);
        let e = et.get(42).unwrap();
        assert_eq!(e.score, -250);
        assert_eq!(e.bound, Bound::Exact);
        assert!(et.get(43).is_none());
    }

    #[test]
    fn bound_respects_exact_within_generation() {
        let et = EvalTable::new(1).unwrap();
        et.put(7, 100, Bound::Exact);
        et.put(7, 500, Bound::Lower);
        assert_eq!(et.get(7).unwrap().score, 100);
        et.new_generation();
        et.put(7, 500, Bound::Lower);
        assert_eq!(et.get(7).unwrap().score, 500);
    }
}
