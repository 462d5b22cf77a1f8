/*!
 * Stream Tokens
 * Opaque stand-ins for stdio stream handles
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque stream token handed out for an occupied slot
///
/// Encodes the slot index and the generation of the occupancy it was
/// issued for, so a token kept past unregistration never resolves to
/// whatever file later lands in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamToken {
    index: u32,
    generation: u32,
}

impl StreamToken {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into a single integer for callers that pass tokens through
    /// pointer-sized fields
    #[inline]
    pub const fn as_raw(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        }
    }
}

impl fmt::Display for StreamToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}@{}", self.index, self.generation)
    }
}
