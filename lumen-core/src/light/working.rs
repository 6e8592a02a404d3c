//! Writer-side staging for light mutations.
//!
//! The propagator never touches published nibble data directly. Each pass
//! stages its writes in private [`WorkingNibble`] buffers, materialized
//! copy-on-write from the published snapshots, and publishes the dirty ones
//! in one step at the end of the pass. Readers holding earlier snapshots are
//! structurally unaffected.

use std::sync::Arc;

use lumen_utils::{BlockPos, ChunkPos};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::chunk_light::{ChunkLightState, LightStore, WorldHeight};
use super::nibble::{NIBBLE_ARRAY_SIZE, NibbleData, get_nibble, packed_pair, set_nibble, voxel_index};
use super::{LightKind, MAX_LIGHT_LEVEL};

/// Staged contents of one section.
#[derive(Debug)]
enum WorkingData {
    /// Every voxel at the same level; owns no buffer.
    Uniform(u8),
    /// Unmodified view of the published buffer.
    Shared(Arc<[u8; NIBBLE_ARRAY_SIZE]>),
    /// Privately owned buffer the writer may mutate freely.
    Owned(Box<[u8; NIBBLE_ARRAY_SIZE]>),
}

/// A writer-private copy-on-write view of one section's light data.
#[derive(Debug)]
pub(crate) struct WorkingNibble {
    data: WorkingData,
    dirty: bool,
}

impl WorkingNibble {
    /// Creates a working view over a published snapshot without copying.
    pub(crate) fn from_snapshot(snapshot: &NibbleData) -> Self {
        let data = match snapshot {
            NibbleData::Uninitialized => WorkingData::Uniform(0),
            NibbleData::Uniform(level) => WorkingData::Uniform(*level),
            NibbleData::Explicit(buffer) => WorkingData::Shared(Arc::clone(buffer)),
        };
        Self { data, dirty: false }
    }

    /// Gets the staged light level at a section-relative position.
    pub(crate) fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        let index = voxel_index(x, y, z);
        match &self.data {
            WorkingData::Uniform(level) => *level,
            WorkingData::Shared(buffer) => get_nibble(buffer, index),
            WorkingData::Owned(buffer) => get_nibble(buffer, index),
        }
    }

    /// Stages a light level, materializing a private buffer on the first
    /// divergent write. Returns whether the value actually changed.
    pub(crate) fn set(&mut self, x: usize, y: usize, z: usize, level: u8) -> bool {
        debug_assert!(level <= MAX_LIGHT_LEVEL, "Light level must be 0-15");
        if self.get(x, y, z) == level {
            return false;
        }

        let index = voxel_index(x, y, z);
        match &mut self.data {
            WorkingData::Owned(buffer) => set_nibble(buffer, index, level),
            WorkingData::Uniform(current) => {
                let mut buffer = Box::new([packed_pair(*current); NIBBLE_ARRAY_SIZE]);
                set_nibble(&mut buffer, index, level);
                self.data = WorkingData::Owned(buffer);
            }
            WorkingData::Shared(buffer) => {
                let mut buffer = Box::new(**buffer);
                set_nibble(&mut buffer, index, level);
                self.data = WorkingData::Owned(buffer);
            }
        }
        self.dirty = true;
        true
    }

    /// Stages a uniform fill of the whole section.
    pub(crate) fn set_uniform(&mut self, level: u8) -> bool {
        if let WorkingData::Uniform(current) = self.data
            && current == level
        {
            return false;
        }
        self.data = WorkingData::Uniform(level);
        self.dirty = true;
        true
    }

    /// Converts the staged data into a publishable snapshot, or `None` if
    /// nothing changed.
    fn into_publishable(self) -> Option<NibbleData> {
        if !self.dirty {
            return None;
        }
        Some(match self.data {
            WorkingData::Uniform(level) => NibbleData::Uniform(level),
            // Shared data is never dirty; keep the compiler honest anyway.
            WorkingData::Shared(buffer) => NibbleData::Explicit(buffer),
            WorkingData::Owned(buffer) => NibbleData::Explicit(Arc::from(buffer)),
        })
    }
}

/// 2-element LRU cache for chunk state lookups during propagation.
///
/// Flood fill touches the same chunk for long runs; two slots cover the
/// common boundary ping-pong without a map probe per voxel.
struct ChunkStateCache {
    keys: [u64; 2],
    states: [Option<Arc<ChunkLightState>>; 2],
    stamps: [u64; 2],
    counter: u64,
}

impl ChunkStateCache {
    fn new() -> Self {
        Self {
            keys: [u64::MAX; 2],
            states: [None, None],
            stamps: [0; 2],
            counter: 0,
        }
    }

    fn get(&mut self, key: u64) -> Option<Option<Arc<ChunkLightState>>> {
        for i in 0..2 {
            if self.keys[i] == key {
                self.counter += 1;
                self.stamps[i] = self.counter;
                return Some(self.states[i].clone());
            }
        }
        None
    }

    fn insert(&mut self, key: u64, state: Option<Arc<ChunkLightState>>) {
        let slot = if self.stamps[0] <= self.stamps[1] { 0 } else { 1 };
        self.counter += 1;
        self.keys[slot] = key;
        self.states[slot] = state;
        self.stamps[slot] = self.counter;
    }
}

/// A section whose published value changed during a pass.
pub(crate) type ChangedSection = (ChunkPos, i32);

/// All staged sections of one pass, for one light type.
pub(crate) struct WorkingSet {
    kind: LightKind,
    height: WorldHeight,
    sections: FxHashMap<(u64, usize), WorkingNibble>,
    cache: ChunkStateCache,
}

impl WorkingSet {
    pub(crate) fn new(kind: LightKind, height: WorldHeight) -> Self {
        Self {
            kind,
            height,
            sections: FxHashMap::default(),
            cache: ChunkStateCache::new(),
        }
    }

    /// Drops cached chunk lookups. Chunk resolvability changes between
    /// passes (loads and unloads), so a cached miss must not outlive the
    /// pass that recorded it.
    pub(crate) fn invalidate_chunk_cache(&mut self) {
        self.cache = ChunkStateCache::new();
    }

    fn chunk_state(&mut self, store: &LightStore, chunk: ChunkPos) -> Option<Arc<ChunkLightState>> {
        let key = chunk.key();
        if let Some(cached) = self.cache.get(key) {
            return cached;
        }
        let state = store.chunk(chunk);
        self.cache.insert(key, state.clone());
        state
    }

    /// Whether light state exists for the chunk containing `pos`.
    pub(crate) fn is_resolved(&mut self, store: &LightStore, pos: BlockPos) -> bool {
        self.chunk_state(store, pos.chunk()).is_some()
    }

    /// Reads the staged (or, if untouched, published) level at a position.
    ///
    /// Returns `None` when the chunk has no light state; positions outside
    /// the stored vertical range read as the ambient default instead.
    pub(crate) fn level(&mut self, store: &LightStore, pos: BlockPos) -> Option<u8> {
        let chunk = pos.chunk();
        let state = self.chunk_state(store, chunk)?;
        let section_y = pos.0.y >> 4;
        let Some(index) = self.height.storage_index(section_y) else {
            let above = self.height.is_above_storage(section_y);
            return Some(if self.kind == LightKind::Sky && above {
                MAX_LIGHT_LEVEL
            } else {
                0
            });
        };

        let (x, y, z) = pos.section_relative();
        let key = (chunk.key(), index);
        if let Some(working) = self.sections.get(&key) {
            return Some(working.get(x, y, z));
        }
        Some(state.nibble(self.kind, index).get(x, y, z))
    }

    /// Stages a level at a position. Returns whether the value changed.
    ///
    /// Writes outside the stored range or into unresolved chunks are
    /// programming errors upstream and are ignored here.
    pub(crate) fn set_level(&mut self, store: &LightStore, pos: BlockPos, level: u8) -> bool {
        let chunk = pos.chunk();
        let Some(state) = self.chunk_state(store, chunk) else {
            debug_assert!(false, "set_level on unresolved chunk");
            return false;
        };
        let Some(index) = self.height.storage_index(pos.0.y >> 4) else {
            return false;
        };

        let (x, y, z) = pos.section_relative();
        let kind = self.kind;
        let working = self
            .sections
            .entry((chunk.key(), index))
            .or_insert_with(|| WorkingNibble::from_snapshot(&state.nibble(kind, index).snapshot()));
        working.set(x, y, z, level)
    }

    /// Stages a uniform fill for one stored section of a chunk.
    pub(crate) fn set_section_uniform(
        &mut self,
        store: &LightStore,
        chunk: ChunkPos,
        index: usize,
        level: u8,
    ) -> bool {
        let Some(state) = self.chunk_state(store, chunk) else {
            debug_assert!(false, "set_section_uniform on unresolved chunk");
            return false;
        };
        let kind = self.kind;
        let working = self
            .sections
            .entry((chunk.key(), index))
            .or_insert_with(|| WorkingNibble::from_snapshot(&state.nibble(kind, index).snapshot()));
        working.set_uniform(level)
    }

    /// Publishes every dirty section and returns which sections changed.
    pub(crate) fn publish(&mut self, store: &LightStore) -> SmallVec<[ChangedSection; 8]> {
        let mut changed = SmallVec::new();
        let sections = std::mem::take(&mut self.sections);
        for ((chunk_key, index), working) in sections {
            let Some(data) = working.into_publishable() else {
                continue;
            };
            let chunk = ChunkPos::from_key(chunk_key);
            // The chunk may have been unloaded reentrantly; nothing to do.
            let Some(state) = store.chunk(chunk) else {
                continue;
            };
            state.nibble(self.kind, index).publish(data);
            changed.push((chunk, self.height.section_y(index)));
        }
        changed
    }
}
