//! Packed 4-bit light storage for chunk sections.
//!
//! Light values are stored as 4-bit values (0-15), packed as two values per
//! byte. For a 16x16x16 section this requires 2048 bytes (4096 voxels / 2).
//!
//! Published data is never mutated in place: the writer stages changes in a
//! private buffer and swaps a fresh snapshot into the visible cell, so a
//! reader holding a snapshot can keep using it without synchronization.

use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

/// The number of bytes needed to store light data for a 16x16x16 section.
/// 16*16*16 voxels = 4096 voxels, at 4 bits per voxel = 2048 bytes
pub const NIBBLE_ARRAY_SIZE: usize = 2048;

/// Computes the packed index of a voxel within a section.
///
/// # Panics
/// Panics when any coordinate is outside 0-15. Light correctness depends on
/// every access being in range, so this stays checked in release builds.
#[inline]
pub(crate) fn voxel_index(x: usize, y: usize, z: usize) -> usize {
    assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
    y * 256 + z * 16 + x
}

/// Reads the nibble at the given voxel index from a packed buffer.
#[inline]
pub(crate) fn get_nibble(data: &[u8; NIBBLE_ARRAY_SIZE], index: usize) -> u8 {
    let byte = data[index >> 1];
    if index & 1 == 1 { (byte >> 4) & 0x0F } else { byte & 0x0F }
}

/// Writes the nibble at the given voxel index into a packed buffer.
#[inline]
pub(crate) fn set_nibble(data: &mut [u8; NIBBLE_ARRAY_SIZE], index: usize, level: u8) {
    debug_assert!(level <= 15, "Light level must be 0-15");
    let byte = &mut data[index >> 1];
    if index & 1 == 1 {
        *byte = (*byte & 0x0F) | ((level & 0x0F) << 4);
    } else {
        *byte = (*byte & 0xF0) | (level & 0x0F);
    }
}

/// Packs a uniform level into both nibbles of a byte.
#[inline]
pub(crate) const fn packed_pair(level: u8) -> u8 {
    (level & 0x0F) | ((level & 0x0F) << 4)
}

/// Error raised when persisted light data cannot be interpreted.
#[derive(Debug, Error)]
pub enum NibbleDataError {
    /// The packed buffer does not hold exactly [`NIBBLE_ARRAY_SIZE`] bytes.
    #[error("packed light buffer must be {NIBBLE_ARRAY_SIZE} bytes, got {0}")]
    WrongLength(usize),
    /// A uniform marker carried a level above 15.
    #[error("uniform light level must be 0-15, got {0}")]
    InvalidLevel(u8),
}

/// Immutable light data for one section, in one of three states.
///
/// `Uninitialized` reads as all-zero without allocating, `Uniform` is a cheap
/// shared constant (e.g. all-15 for untouched sky columns), and `Explicit`
/// holds a fully materialized packed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NibbleData {
    /// No light has been computed for this section yet; reads as all-zero.
    Uninitialized,
    /// Every voxel in the section has the same light level (0-15).
    Uniform(u8),
    /// Voxels have different light levels, stored as packed nibbles.
    Explicit(Arc<[u8; NIBBLE_ARRAY_SIZE]>),
}

impl NibbleData {
    /// Gets the light level at the given section-relative position.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        let index = voxel_index(x, y, z);
        match self {
            Self::Uninitialized => 0,
            Self::Uniform(level) => *level,
            Self::Explicit(data) => get_nibble(data, index),
        }
    }

    /// Whether this section has not been computed yet.
    ///
    /// The host's persisted format distinguishes "no data yet" from an
    /// explicit all-zero array; this mirrors that tri-state marker.
    #[must_use]
    pub const fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }

    /// Converts persisted packed bytes back into light data.
    ///
    /// `None` means "no data yet". The buffer length is validated and never
    /// silently coerced; light correctness is the whole point of this system.
    pub fn from_packed_bytes(bytes: Option<&[u8]>) -> Result<Self, NibbleDataError> {
        let Some(bytes) = bytes else {
            return Ok(Self::Uninitialized);
        };
        let data: &[u8; NIBBLE_ARRAY_SIZE] = bytes
            .try_into()
            .map_err(|_| NibbleDataError::WrongLength(bytes.len()))?;
        Ok(Self::Explicit(Arc::new(*data)))
    }

    /// Converts a uniform marker into light data.
    pub fn from_uniform_level(level: u8) -> Result<Self, NibbleDataError> {
        if level > 15 {
            return Err(NibbleDataError::InvalidLevel(level));
        }
        Ok(Self::Uniform(level))
    }

    /// Converts this data to the persisted 2048-byte packed layout.
    ///
    /// Returns `None` for uninitialized sections; uniform sections are
    /// expanded into a full buffer.
    #[must_use]
    pub fn to_packed_bytes(&self) -> Option<Box<[u8; NIBBLE_ARRAY_SIZE]>> {
        match self {
            Self::Uninitialized => None,
            Self::Uniform(level) => Some(Box::new([packed_pair(*level); NIBBLE_ARRAY_SIZE])),
            Self::Explicit(data) => Some(Box::new(**data)),
        }
    }
}

/// Single-writer/many-reader light storage for one section.
///
/// Readers capture the visible snapshot once per query and read it directly;
/// the writer publishes whole replacement snapshots via [`publish`]. Because
/// a published [`NibbleData`] is immutable, no lock is needed on either side.
///
/// [`publish`]: SwmrNibbleArray::publish
#[derive(Debug)]
pub struct SwmrNibbleArray {
    visible: ArcSwap<NibbleData>,
}

impl SwmrNibbleArray {
    /// Creates storage with no computed data; reads as all-zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible: ArcSwap::from_pointee(NibbleData::Uninitialized),
        }
    }

    /// Creates storage with every voxel at the given level.
    #[must_use]
    pub fn new_uniform(level: u8) -> Self {
        debug_assert!(level <= 15, "Light level must be 0-15");
        Self {
            visible: ArcSwap::from_pointee(NibbleData::Uniform(level)),
        }
    }

    /// Gets the published light level at the given section-relative position.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.visible.load().get(x, y, z)
    }

    /// Captures the currently published snapshot.
    ///
    /// The returned data is never mutated afterwards; later writes swap in a
    /// new snapshot instead.
    #[must_use]
    pub fn snapshot(&self) -> Arc<NibbleData> {
        self.visible.load_full()
    }

    /// Publishes a replacement snapshot, making it visible to new readers.
    ///
    /// Writer-only. Readers holding the previous snapshot are unaffected.
    pub fn publish(&self, data: NibbleData) {
        self.visible.store(Arc::new(data));
    }
}

impl Default for SwmrNibbleArray {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_reads_zero() {
        let storage = SwmrNibbleArray::new();
        assert_eq!(storage.get(0, 0, 0), 0);
        assert_eq!(storage.get(15, 15, 15), 0);
        assert!(storage.snapshot().is_uninitialized());
    }

    #[test]
    fn test_uniform_get() {
        let storage = SwmrNibbleArray::new_uniform(15);
        assert_eq!(storage.get(0, 0, 0), 15);
        assert_eq!(storage.get(15, 15, 15), 15);
    }

    #[test]
    fn test_snapshot_unaffected_by_publish() {
        let storage = SwmrNibbleArray::new_uniform(3);
        let before = storage.snapshot();

        let mut data = Box::new([0u8; NIBBLE_ARRAY_SIZE]);
        set_nibble(&mut data, voxel_index(5, 5, 5), 14);
        storage.publish(NibbleData::Explicit(Arc::from(data)));

        assert_eq!(before.get(5, 5, 5), 3);
        assert_eq!(storage.get(5, 5, 5), 14);
    }

    #[test]
    fn test_packed_adjacent_nibbles() {
        let mut data = Box::new([0u8; NIBBLE_ARRAY_SIZE]);
        set_nibble(&mut data, voxel_index(0, 0, 0), 5);
        set_nibble(&mut data, voxel_index(1, 0, 0), 10);

        let nibble = NibbleData::Explicit(Arc::from(data));
        assert_eq!(nibble.get(0, 0, 0), 5);
        assert_eq!(nibble.get(1, 0, 0), 10);
    }

    #[test]
    fn test_packed_bytes_round_trip() {
        let mut data = Box::new([0u8; NIBBLE_ARRAY_SIZE]);
        set_nibble(&mut data, voxel_index(7, 3, 9), 12);
        let nibble = NibbleData::Explicit(Arc::from(data));

        let bytes = nibble.to_packed_bytes().expect("explicit data has bytes");
        let restored = NibbleData::from_packed_bytes(Some(bytes.as_slice()))
            .expect("valid length");
        assert_eq!(restored.get(7, 3, 9), 12);
        assert_eq!(restored, nibble);
    }

    #[test]
    fn test_uninitialized_round_trip() {
        let nibble = NibbleData::from_packed_bytes(None).expect("no data is valid");
        assert!(nibble.is_uninitialized());
        assert!(nibble.to_packed_bytes().is_none());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = NibbleData::from_packed_bytes(Some(&[0u8; 100]));
        assert!(matches!(err, Err(NibbleDataError::WrongLength(100))));
    }

    #[test]
    fn test_uniform_expands_to_bytes() {
        let nibble = NibbleData::from_uniform_level(9).expect("valid level");
        let bytes = nibble.to_packed_bytes().expect("uniform data has bytes");
        assert!(bytes.iter().all(|&b| b == packed_pair(9)));
        assert!(NibbleData::from_uniform_level(16).is_err());
    }

    #[test]
    #[should_panic(expected = "Coordinates must be 0-15")]
    fn test_out_of_range_coordinate_panics() {
        let storage = SwmrNibbleArray::new();
        let _ = storage.get(16, 0, 0);
    }
}
