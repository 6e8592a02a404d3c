//! Per-chunk accumulators for deferred work.
//!
//! Everything here is writer-owned: change intake between passes, boundary
//! checks waiting on a neighbor, load replays waiting on the chunk itself,
//! and the per-section emptiness metadata the sky shortcut depends on.
//! Accumulators are drained exactly once per pass via `mem::take`, so
//! reentrant insertions land in the next pass's accumulation.

use lumen_utils::{BlockPos, ChunkPos};
use rustc_hash::{FxHashMap, FxHashSet};

use super::chunk_light::WorldHeight;

/// Section-y indices accumulated for one chunk.
pub(crate) type SectionSet = FxHashSet<i32>;

/// Changes queued against one chunk since the last pass.
#[derive(Debug, Default)]
pub(crate) struct ChunkChanges {
    /// Voxels whose opacity or emission may have changed. Set semantics:
    /// repeated reports of the same position collapse.
    pub positions: FxHashSet<BlockPos>,
    /// Sections whose emptiness toggled, with the new emptiness. A later
    /// toggle of the same section wins.
    pub section_toggles: FxHashMap<i32, bool>,
}

impl ChunkChanges {
    pub(crate) fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.section_toggles.is_empty()
    }
}

/// A load request queued until its chunk becomes resolvable.
#[derive(Debug)]
pub(crate) struct PendingLoad {
    /// Emptiness per in-world section, bottom-up.
    pub emptiness: Box<[bool]>,
}

/// Writer-side record of which sections contain no opaque geometry.
///
/// Sky light falling straight down at full level crosses empty sections
/// without attenuation, so this is consulted on every downward step. Border
/// sections are always empty; unknown chunks are never empty.
#[derive(Debug)]
pub(crate) struct EmptinessMap {
    height: WorldHeight,
    chunks: FxHashMap<u64, Box<[bool]>>,
}

impl EmptinessMap {
    pub(crate) fn new(height: WorldHeight) -> Self {
        Self {
            height,
            chunks: FxHashMap::default(),
        }
    }

    /// Replaces a chunk's emptiness snapshot wholesale (chunk load).
    ///
    /// # Panics
    /// Panics when the snapshot length does not match the world height; a
    /// mismatched bitmap would silently corrupt sky light.
    pub(crate) fn load(&mut self, chunk: ChunkPos, emptiness: Box<[bool]>) {
        assert_eq!(
            emptiness.len(),
            self.height.section_count,
            "emptiness snapshot must cover every in-world section"
        );
        self.chunks.insert(chunk.key(), emptiness);
    }

    /// Updates a single section's emptiness (section status toggle).
    pub(crate) fn set(&mut self, chunk: ChunkPos, section_y: i32, empty: bool) {
        if !self.height.is_in_world(section_y) {
            return;
        }
        let height = self.height;
        let sections = self
            .chunks
            .entry(chunk.key())
            .or_insert_with(|| vec![false; height.section_count].into_boxed_slice());
        sections[(section_y - height.min_section_y) as usize] = empty;
    }

    /// Whether the section at `section_y` of `chunk` holds no opaque
    /// geometry.
    pub(crate) fn is_empty(&self, chunk: ChunkPos, section_y: i32) -> bool {
        if !self.height.is_in_world(section_y) {
            // Border and out-of-world sections never hold geometry.
            return self.height.storage_index(section_y).is_some()
                || self.height.is_above_storage(section_y);
        }
        self.chunks
            .get(&chunk.key())
            .is_some_and(|sections| sections[(section_y - self.height.min_section_y) as usize])
    }

    /// Forgets a chunk (unload).
    pub(crate) fn remove(&mut self, chunk: ChunkPos) {
        self.chunks.remove(&chunk.key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEIGHT: WorldHeight = WorldHeight {
        min_section_y: -1,
        section_count: 3,
    };

    #[test]
    fn test_borders_are_empty() {
        let map = EmptinessMap::new(HEIGHT);
        let chunk = ChunkPos::new(0, 0);
        assert!(map.is_empty(chunk, -2));
        assert!(map.is_empty(chunk, 2));
        assert!(map.is_empty(chunk, 9));
        assert!(!map.is_empty(chunk, 0));
    }

    #[test]
    fn test_set_and_load() {
        let mut map = EmptinessMap::new(HEIGHT);
        let chunk = ChunkPos::new(1, 1);

        map.set(chunk, 1, true);
        assert!(map.is_empty(chunk, 1));
        assert!(!map.is_empty(chunk, 0));

        map.load(chunk, vec![true, false, true].into_boxed_slice());
        assert!(map.is_empty(chunk, -1));
        assert!(!map.is_empty(chunk, 0));
        assert!(map.is_empty(chunk, 1));

        map.remove(chunk);
        assert!(!map.is_empty(chunk, 1));
    }

    #[test]
    #[should_panic(expected = "emptiness snapshot")]
    fn test_wrong_snapshot_length_panics() {
        let mut map = EmptinessMap::new(HEIGHT);
        map.load(ChunkPos::new(0, 0), vec![true].into_boxed_slice());
    }
}
