//! Per-chunk light state and the concurrently readable chunk map.

use std::sync::Arc;

use lumen_utils::{BlockPos, ChunkPos};

use super::nibble::SwmrNibbleArray;
use super::{LightKind, MAX_LIGHT_LEVEL};

/// Vertical extent of the world, in 16-voxel sections.
///
/// Light storage carries one extra border section below and above the world;
/// the top border is where sky light enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldHeight {
    /// Section y of the lowest in-world section.
    pub min_section_y: i32,
    /// Number of in-world sections.
    pub section_count: usize,
}

impl WorldHeight {
    /// Number of stored light sections per chunk, including both borders.
    #[must_use]
    pub const fn stored_sections(self) -> usize {
        self.section_count + 2
    }

    /// Maps a section y to its storage index, if it is within the stored
    /// range (borders included).
    #[must_use]
    pub fn storage_index(self, section_y: i32) -> Option<usize> {
        let offset = section_y - (self.min_section_y - 1);
        (0..self.stored_sections() as i32)
            .contains(&offset)
            .then_some(offset as usize)
    }

    /// Maps a storage index back to its section y.
    #[must_use]
    pub const fn section_y(self, index: usize) -> i32 {
        self.min_section_y - 1 + index as i32
    }

    /// Whether a section y lies above the stored range.
    #[must_use]
    pub const fn is_above_storage(self, section_y: i32) -> bool {
        section_y > self.min_section_y + self.section_count as i32
    }

    /// Whether a section y is an in-world section (borders excluded).
    #[must_use]
    pub const fn is_in_world(self, section_y: i32) -> bool {
        section_y >= self.min_section_y
            && section_y < self.min_section_y + self.section_count as i32
    }
}

/// All light storage for one chunk: one nibble array per stored section, per
/// light type.
///
/// The contained [`SwmrNibbleArray`]s are safe to read while the writer
/// publishes replacements, which is what lets the whole state sit behind a
/// shared `Arc`.
#[derive(Debug)]
pub struct ChunkLightState {
    block: Box<[SwmrNibbleArray]>,
    sky: Box<[SwmrNibbleArray]>,
}

impl ChunkLightState {
    /// Creates fully uninitialized light state for a chunk.
    #[must_use]
    pub fn new(height: WorldHeight) -> Self {
        let block = (0..height.stored_sections())
            .map(|_| SwmrNibbleArray::new())
            .collect();
        let sky = (0..height.stored_sections())
            .map(|_| SwmrNibbleArray::new())
            .collect();
        Self { block, sky }
    }

    /// The nibble arrays for one light type, indexed by storage index.
    #[must_use]
    pub fn nibbles(&self, kind: LightKind) -> &[SwmrNibbleArray] {
        match kind {
            LightKind::Block => &self.block,
            LightKind::Sky => &self.sky,
        }
    }

    /// The nibble array for one stored section of one light type.
    #[must_use]
    pub fn nibble(&self, kind: LightKind, index: usize) -> &SwmrNibbleArray {
        &self.nibbles(kind)[index]
    }
}

/// Chunk-keyed light storage shared between the writer and all readers.
///
/// The map itself must tolerate readers racing writer insert/remove during
/// chunk load/unload, so it is an `scc::HashMap` rather than a plain map
/// behind a lock.
#[derive(Debug)]
pub struct LightStore {
    chunks: scc::HashMap<u64, Arc<ChunkLightState>>,
    height: WorldHeight,
}

impl LightStore {
    /// Creates an empty store for a world of the given height.
    #[must_use]
    pub fn new(height: WorldHeight) -> Self {
        Self {
            chunks: scc::HashMap::new(),
            height,
        }
    }

    /// The world height this store was created for.
    #[must_use]
    pub const fn height(&self) -> WorldHeight {
        self.height
    }

    /// Gets the light state for a chunk, if light is enabled for it.
    #[must_use]
    pub fn chunk(&self, pos: ChunkPos) -> Option<Arc<ChunkLightState>> {
        self.chunks
            .read_sync(&pos.key(), |_, state| Arc::clone(state))
    }

    /// Whether light is enabled for a chunk.
    #[must_use]
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_sync(&pos.key())
    }

    /// Registers fresh light state for a chunk, replacing any previous state.
    pub(crate) fn insert(&self, pos: ChunkPos, state: Arc<ChunkLightState>) {
        let key = pos.key();
        self.chunks.remove_sync(&key);
        // The entry was just removed and only one writer exists.
        let _ = self.chunks.insert_sync(key, state);
    }

    /// Discards a chunk's light state. Readers holding the `Arc` keep their
    /// snapshots; new queries see the chunk as unloaded.
    pub(crate) fn remove(&self, pos: ChunkPos) -> bool {
        self.chunks.remove_sync(&pos.key()).is_some()
    }

    /// Reads the published light level at a position.
    ///
    /// Unloaded chunks read as 0. For loaded chunks, sky light above the
    /// stored range reads as full daylight and anything below reads as 0.
    #[must_use]
    pub fn light_level(&self, kind: LightKind, pos: BlockPos) -> u8 {
        let Some(state) = self.chunk(pos.chunk()) else {
            return 0;
        };
        let section_y = pos.0.y >> 4;
        let Some(index) = self.height.storage_index(section_y) else {
            if kind == LightKind::Sky && self.height.is_above_storage(section_y) {
                return MAX_LIGHT_LEVEL;
            }
            return 0;
        };
        let (x, y, z) = pos.section_relative();
        state.nibble(kind, index).get(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEIGHT: WorldHeight = WorldHeight {
        min_section_y: 0,
        section_count: 4,
    };

    #[test]
    fn test_storage_index_covers_borders() {
        assert_eq!(HEIGHT.storage_index(-1), Some(0));
        assert_eq!(HEIGHT.storage_index(0), Some(1));
        assert_eq!(HEIGHT.storage_index(4), Some(5));
        assert_eq!(HEIGHT.storage_index(5), None);
        assert_eq!(HEIGHT.storage_index(-2), None);
        assert_eq!(HEIGHT.section_y(0), -1);
        assert_eq!(HEIGHT.section_y(5), 4);
    }

    #[test]
    fn test_unloaded_chunk_reads_zero() {
        let store = LightStore::new(HEIGHT);
        assert_eq!(
            store.light_level(LightKind::Block, BlockPos::new(0, 10, 0)),
            0
        );
        assert_eq!(store.light_level(LightKind::Sky, BlockPos::new(0, 10, 0)), 0);
    }

    #[test]
    fn test_sky_above_storage_is_full() {
        let store = LightStore::new(HEIGHT);
        let pos = ChunkPos::new(0, 0);
        store.insert(pos, Arc::new(ChunkLightState::new(HEIGHT)));

        let above = BlockPos::new(0, 16 * 6, 0);
        assert_eq!(store.light_level(LightKind::Sky, above), MAX_LIGHT_LEVEL);
        assert_eq!(store.light_level(LightKind::Block, above), 0);
    }

    #[test]
    fn test_remove_disables_chunk() {
        let store = LightStore::new(HEIGHT);
        let pos = ChunkPos::new(3, -2);
        store.insert(pos, Arc::new(ChunkLightState::new(HEIGHT)));
        assert!(store.contains(pos));
        assert!(store.remove(pos));
        assert!(!store.contains(pos));
        assert!(!store.remove(pos));
    }
}
