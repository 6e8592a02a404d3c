//! Bit-packed propagation queue entries.
//!
//! A `QueueEntry` packs all propagation metadata into a single u64:
//! - Bits 0-3: light level (0-15)
//! - Bits 4-9: direction flags (6 directions, ordinal-indexed)
//! - Bit 10: increase-from-emission flag
//!
//! A u64 (rather than u16) keeps the value at native word size on 64-bit
//! CPUs.

use super::direction::Direction;

/// A queue entry encoding the level to propagate and which directions to
/// propagate it in.
///
/// Direction flags let an increase skip the face it arrived through, and let
/// edge checks push toward a single boundary face only. The emission flag
/// marks entries whose level must be applied to the position itself rather
/// than merely confirmed against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry(u64);

impl QueueEntry {
    /// Mask for the light level (bits 0-3).
    const LEVEL_MASK: u64 = 0x0F;

    /// Mask for all direction flags (bits 4-9).
    const DIRECTIONS_MASK: u64 = 0x3F0;

    /// Flag for increase from a light source (bit 10).
    const EMISSION_FLAG: u64 = 0x400;

    /// Gets the light level carried by this entry (0-15).
    #[must_use]
    #[inline]
    pub fn level(self) -> u8 {
        (self.0 & Self::LEVEL_MASK) as u8
    }

    /// Checks if light should propagate in the given direction.
    #[must_use]
    #[inline]
    pub fn should_propagate(self, dir: Direction) -> bool {
        (self.0 & (1u64 << (dir as u8 + 4))) != 0
    }

    /// Checks if this entry carries a source level to apply at the position.
    #[must_use]
    #[inline]
    pub fn is_from_emission(self) -> bool {
        (self.0 & Self::EMISSION_FLAG) != 0
    }

    #[must_use]
    #[inline]
    fn with_level(self, level: u8) -> Self {
        debug_assert!(level <= 15, "Light level must be 0-15");
        Self((self.0 & !Self::LEVEL_MASK) | (u64::from(level) & Self::LEVEL_MASK))
    }

    #[must_use]
    #[inline]
    fn with_direction(self, dir: Direction) -> Self {
        Self(self.0 | (1u64 << (dir as u8 + 4)))
    }

    #[must_use]
    #[inline]
    fn without_direction(self, dir: Direction) -> Self {
        Self(self.0 & !(1u64 << (dir as u8 + 4)))
    }

    /// Entry scheduling a position for decrease-phase re-evaluation.
    ///
    /// The level is a hint only; the decrease phase recomputes from cached
    /// state, so stale duplicates collapse to no-ops.
    #[must_use]
    pub fn decrease(level: u8) -> Self {
        Self(Self::DIRECTIONS_MASK).with_level(level)
    }

    /// Entry applying a source level at the position, then spreading in all
    /// directions.
    #[must_use]
    pub fn increase_from_emission(level: u8) -> Self {
        Self(Self::DIRECTIONS_MASK | Self::EMISSION_FLAG).with_level(level)
    }

    /// Entry spreading an increase in all directions except the one the
    /// light arrived through.
    #[must_use]
    pub fn increase_skip_one_direction(level: u8, skip_dir: Direction) -> Self {
        Self(Self::DIRECTIONS_MASK)
            .without_direction(skip_dir)
            .with_level(level)
    }

    /// Entry spreading an increase toward a single face, used by chunk edge
    /// checks.
    #[must_use]
    pub fn increase_only_one_direction(level: u8, dir: Direction) -> Self {
        Self(0).with_direction(dir).with_level(level)
    }

    /// Entry for a falling sky-light column: full level, downward plus
    /// horizontals, never back up.
    #[must_use]
    pub fn increase_sky_column(level: u8) -> Self {
        Self(Self::DIRECTIONS_MASK)
            .without_direction(Direction::Up)
            .with_level(level)
    }
}
