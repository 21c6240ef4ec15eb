//! Fixed-capacity concurrent hash tables shared by all search workers.
//!
//! Every table here uses the same slot scheme: a slot is two `AtomicU64`s
//! storing `(key ^ payload, payload)`. A reader recomputes the XOR and
//! rejects the slot when it does not match the probed key, so a write torn
//! across the two words can never be mistaken for valid data — it simply
//! reads as a miss. This is the lock-free realization chosen for this
//! engine; readers accept stale entries, and the search re-validates any
//! recovered move against the current position before trusting it.
//!
//! Addressing is double-probe: the two candidate slots for a key come from
//! the two 32-bit halves of the key, each reduced modulo the capacity. A
//! store goes to the first slot holding the same key or an empty slot, and
//! otherwise evicts the second slot.

pub mod evaluation;
pub mod pawn;
pub mod transposition;

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::options::EngineError;

pub use self::evaluation::{EvalEntry, EvalTable};
pub use self::pawn::{PawnEntry, PawnTable};
pub use self::transposition::{Bound, TransEntry, TransTable};

/// Generations wrap at six bits; entry payloads reserve that many.
pub const GENERATION_BITS: u64 = 6;
pub const GENERATION_MASK: u64 = (1 << GENERATION_BITS) - 1;

/// One lock-free slot: `key_xor` holds `key ^ payload`.
#[derive(Default)]
pub(crate) struct Slot {
    key_xor: AtomicU64,
    payload: AtomicU64,
}

impl Slot {
    /// Reads the payload if the slot currently holds `key` and the two
    /// words are consistent with each other.
    #[inline]
    pub fn read(&self, key: u64) -> Option<u64> {
        let payload = self.payload.load(Ordering::Relaxed);
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        if payload != 0 && key_xor ^ payload == key {
            Some(payload)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.load(Ordering::Relaxed) == 0
    }

    /// True if the slot holds `key` (consistent read).
    #[inline]
    pub fn holds(&self, key: u64) -> bool {
        self.read(key).is_some()
    }

    #[inline]
    pub fn write(&self, key: u64, payload: u64) {
        debug_assert_ne!(payload, 0);
        self.key_xor.store(key ^ payload, Ordering::Relaxed);
        self.payload.store(payload, Ordering::Relaxed);
    }

    #[inline]
    pub fn erase(&self) {
        self.key_xor.store(0, Ordering::Relaxed);
        self.payload.store(0, Ordering::Relaxed);
    }
}

/// The double-probe slot array with a generation counter. The concrete
/// tables wrap this with their own payload encodings and replacement rules.
pub(crate) struct SlotArray {
    slots: Vec<Slot>,
    generation: AtomicU8,
}

impl SlotArray {
    /// Allocates a table filling `megabytes` of memory.
    pub fn with_budget(megabytes: usize) -> Result<SlotArray, EngineError> {
        let bytes = megabytes
            .checked_mul(1024 * 1024)
            .ok_or_else(|| EngineError::HashConfig(format!("{} MB overflows", megabytes)))?;
        let capacity = bytes / std::mem::size_of::<Slot>();
        if capacity == 0 {
            return Err(EngineError::HashConfig(format!(
                "{} MB leaves no room for entries",
                megabytes
            )));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::default);
        Ok(SlotArray {
            slots,
            generation: AtomicU8::new(0),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The two candidate slots for a key, first and second probe.
    #[inline]
    pub fn probe_pair(&self, key: u64) -> (&Slot, &Slot) {
        let cap = self.slots.len() as u64;
        let first = (key & 0xFFFF_FFFF) % cap;
        let second = (key >> 32) % cap;
        (&self.slots[first as usize], &self.slots[second as usize])
    }

    /// Current generation, 6 bits.
    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed) & GENERATION_MASK as u8
    }

    /// Advances the generation. Called once per root search.
    pub fn new_generation(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    /// Erases every slot.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.erase();
        }
    }

    /// Approximate fill ratio in [0, 1], sampled over a slot prefix.
    pub fn load_factor(&self) -> f64 {
        let sample = self.slots.len().min(1000);
        if sample == 0 {
            return 0.0;
        }
        let filled = self.slots[..sample]
            .iter()
            .filter(|s| !s.is_empty())
            .count();
        filled as f64 / sample as f64
    }
}

/// Prefetches the first probe slot of `key` into cache. Compiles to
/// nothing off x86.
#[inline(always)]
pub fn prefetch_slot(array: &SlotArray, key: u64) {
    let (first, _) = array.probe_pair(key);
    prefetch_ptr(first as *const Slot);
}

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse"))]
#[inline(always)]
fn prefetch_ptr<T>(ptr: *const T) {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::_mm_prefetch;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::_mm_prefetch;
    unsafe {
        _mm_prefetch(ptr as *const i8, 3);
    }
}

#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse")))]
#[inline(always)]
fn prefetch_ptr<T>(_ptr: *const T) {}

/// The three shared tables bundled for the workers.
pub struct SharedTables {
    pub tt: TransTable,
    pub et: EvalTable,
    pub pt: PawnTable,
}

impl SharedTables {
    pub fn new(tt_mb: usize, et_mb: usize, pt_mb: usize) -> Result<SharedTables, EngineError> {
        Ok(SharedTables {
            tt: TransTable::new(tt_mb)?,
            et: EvalTable::new(et_mb)?,
            pt: PawnTable::new(pt_mb)?,
        })
    }

    /// Advances every generation counter. Called when a new root search
    /// begins.
    pub fn new_search(&self) {
        self.tt.new_generation();
        self.et.new_generation();
        self.pt.new_generation();
    }

    /// Erases all three tables.
    pub fn clear(&self) {
        self.tt.clear();
        self.et.clear();
        self.pt.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_xor_detects_mismatch() {
        let slot = Slot::default();
        slot.write(0xDEAD_BEEF, 42);
        assert_eq!(slot.read(0xDEAD_BEEF), Some(42));
        assert_eq!(slot.read(0xDEAD_BEE0), None);
        slot.erase();
        assert_eq!(slot.read(0xDEAD_BEEF), None);
    }

    #[test]
    fn budget_sizing() {
        let arr = SlotArray::with_budget(1).unwrap();
        assert_eq!(arr.capacity(), 1024 * 1024 / 16);
        assert!(SlotArray::with_budget(0).is_err());
    }

    #[test]
    fn generation_wraps_in_six_bits() {
        let arr = SlotArray::with_budget(1).unwrap();
        for _ in 0..70 {
            arr.new_generation();
        }
        assert_eq!(arr.generation(), 70 % 64);
    }

    #[test]
    fn load_factor_counts() {
        let arr = SlotArray::with_budget(1).unwrap();
        assert_eq!(arr.load_factor(), 0.0);
        let (first, _) = arr.probe_pair(7);
        first.write(7, 1);
        assert!(arr.load_factor() > 0.0);
    }
}
