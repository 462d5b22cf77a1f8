/*!
 * Slot Occupancy Bitmap
 * First-fit free slot search over 64-bit words
 */

use crate::core::limits::BITMAP_WORD_BITS;

/// Fixed-size occupancy bitmap, one bit per slot
#[derive(Debug, Clone)]
pub(crate) struct SlotBitmap {
    words: Box<[u64]>,
    capacity: usize,
    occupied: usize,
}

impl SlotBitmap {
    pub fn new(capacity: usize) -> Self {
        let words = capacity.div_ceil(BITMAP_WORD_BITS);
        Self {
            words: vec![0u64; words].into_boxed_slice(),
            capacity,
            occupied: 0,
        }
    }

    /// Lowest unoccupied index
    ///
    /// Bits past `capacity` in the last word are never set, so a word that
    /// is full up to capacity yields an index >= capacity and is rejected.
    #[inline]
    pub fn first_free(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, word)| **word != u64::MAX)
            .map(|(w, word)| w * BITMAP_WORD_BITS + word.trailing_ones() as usize)
            .filter(|&index| index < self.capacity)
    }

    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        index < self.capacity && self.words[index / BITMAP_WORD_BITS] & Self::mask(index) != 0
    }

    /// Mark `index` occupied; returns false if it already was
    pub fn set(&mut self, index: usize) -> bool {
        if index >= self.capacity || self.is_set(index) {
            return false;
        }
        self.words[index / BITMAP_WORD_BITS] |= Self::mask(index);
        self.occupied += 1;
        true
    }

    /// Mark `index` free; returns false if it already was
    pub fn clear(&mut self, index: usize) -> bool {
        if !self.is_set(index) {
            return false;
        }
        self.words[index / BITMAP_WORD_BITS] &= !Self::mask(index);
        self.occupied -= 1;
        true
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Occupied indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity).filter(move |&index| self.is_set(index))
    }

    #[inline(always)]
    fn mask(index: usize) -> u64 {
        1u64 << (index % BITMAP_WORD_BITS)
    }
}
