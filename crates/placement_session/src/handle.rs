//! Identity handles for scene objects

use core::fmt;
use serde::{Deserialize, Serialize};

/// Opaque reference to a scene object.
///
/// Equality is identity: two handles are equal only if they name the same
/// slot *and* the same generation of that slot, so a handle to a deleted
/// object never aliases whatever the host puts in the slot afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHandle {
    /// Lower 32 bits: index, Upper 32 bits: generation
    bits: u64,
}

impl ObjectHandle {
    /// Create a handle from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
        }
    }

    /// Get the index portion
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    /// Get the generation portion
    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    /// Get the raw bits
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    /// Create from raw bits
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// Key used to tag physics bodies and colliders owned by this object
    #[inline]
    pub const fn entity_key(&self) -> u128 {
        self.bits as u128
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_parts() {
        let h = ObjectHandle::new(7, 3);
        assert_eq!(h.index(), 7);
        assert_eq!(h.generation(), 3);
        assert_eq!(ObjectHandle::from_bits(h.to_bits()), h);
    }

    #[test]
    fn test_generation_distinguishes_reused_slot() {
        assert_ne!(ObjectHandle::new(2, 0), ObjectHandle::new(2, 1));
        assert_eq!(format!("{}", ObjectHandle::new(2, 1)), "2v1");
    }
}
