//! Per-block visibility mask: one bit per face, set when the face is exposed.

use std::fmt;

use super::block_side::BlockSide;

/// A 6-bit set of exposed faces, indexed by [`BlockSide`].
///
/// A set bit means the adjacent position is empty (or outside the world) and the face
/// must be drawn. The raw bits follow the `BlockSide` discriminants.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct FaceMask(u8);

impl FaceMask {
    /// No face exposed.
    pub const NONE: FaceMask = FaceMask(0);
    /// Every face exposed.
    pub const ALL: FaceMask = FaceMask(0b11_1111);

    /// Builds a mask from raw bits; bits above the sixth are dropped.
    pub fn from_bits(bits: u8) -> Self {
        FaceMask(bits & Self::ALL.0)
    }

    /// The raw 6-bit value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether `side` is exposed.
    pub fn is_exposed(self, side: BlockSide) -> bool {
        self.0 & (1 << side as u8) != 0
    }

    /// Marks `side` as exposed or hidden.
    pub fn set_exposed(&mut self, side: BlockSide, exposed: bool) {
        if exposed {
            self.0 |= 1 << side as u8;
        } else {
            self.0 &= !(1 << side as u8);
        }
    }

    /// Returns a copy with `side` set to `exposed`.
    pub fn with(mut self, side: BlockSide, exposed: bool) -> Self {
        self.set_exposed(side, exposed);
        self
    }

    /// Number of exposed faces.
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether no face is exposed.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Exposed faces in canonical order.
    pub fn exposed_sides(self) -> impl Iterator<Item = BlockSide> {
        (0..6u32)
            .filter(move |bit| self.0 & (1 << *bit) != 0)
            .filter_map(BlockSide::from_index)
    }
}

impl fmt::Debug for FaceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaceMask({:06b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_individual_faces() {
        let mut mask = FaceMask::NONE;
        mask.set_exposed(BlockSide::RIGHT, true);
        mask.set_exposed(BlockSide::TOP, true);
        assert!(mask.is_exposed(BlockSide::RIGHT));
        assert!(mask.is_exposed(BlockSide::TOP));
        assert!(!mask.is_exposed(BlockSide::LEFT));
        assert_eq!(mask.count(), 2);

        mask.set_exposed(BlockSide::RIGHT, false);
        assert_eq!(mask.count(), 1);
        assert_eq!(mask.bits(), 1);
    }

    #[test]
    fn exposed_sides_follow_canonical_order() {
        let mask = FaceMask::NONE
            .with(BlockSide::LEFT, true)
            .with(BlockSide::BOTTOM, true)
            .with(BlockSide::BACK, true);
        let sides: Vec<_> = mask.exposed_sides().collect();
        assert_eq!(sides, vec![BlockSide::BOTTOM, BlockSide::BACK, BlockSide::LEFT]);
    }

    #[test]
    fn from_bits_masks_to_six_bits() {
        assert_eq!(FaceMask::from_bits(0xFF), FaceMask::ALL);
        assert_eq!(FaceMask::ALL.count(), 6);
        assert!(FaceMask::NONE.is_empty());
    }
}
