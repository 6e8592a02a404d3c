//! Writer-side entry point: event intake, pass orchestration, publishing.

use std::mem;
use std::sync::Arc;

use lumen_utils::{BlockPos, ChunkPos, SectionPos};
use rustc_hash::FxHashMap;

use super::access::{ChunkSource, LightListener};
use super::chunk_light::{ChunkLightState, LightStore, WorldHeight};
use super::pending::{ChunkChanges, EmptinessMap, PendingLoad, SectionSet};
use super::propagator::{PropagationContext, Propagator};
use super::reader::LightReader;
use super::LightKind;

/// Coordinates both light propagators over shared storage.
///
/// All methods taking `&mut self` form the single-writer surface; the host
/// is responsible for serializing calls to them. Everything queued here is
/// pure bookkeeping until [`propagate_changes`] runs: that is the only place
/// storage is mutated and the listener is invoked.
///
/// [`propagate_changes`]: LightCoordinator::propagate_changes
pub struct LightCoordinator {
    store: Arc<LightStore>,
    source: Arc<dyn ChunkSource>,
    listener: Arc<dyn LightListener>,
    block: Propagator,
    sky: Propagator,
    emptiness: EmptinessMap,
    /// Block/section changes accumulated since the last pass, per chunk.
    changes: FxHashMap<u64, ChunkChanges>,
    /// Load replays waiting for their chunk to become resolvable.
    queued_loads: FxHashMap<u64, PendingLoad>,
    /// Edge checks scheduled for the next pass, per chunk, per light type.
    queued_edge_checks_block: FxHashMap<u64, SectionSet>,
    queued_edge_checks_sky: FxHashMap<u64, SectionSet>,
    /// Boundaries recorded against chunks that were unresolved when
    /// propagation reached them; activated when the keyed chunk loads.
    pending_edges_block: FxHashMap<u64, SectionSet>,
    pending_edges_sky: FxHashMap<u64, SectionSet>,
}

impl LightCoordinator {
    /// Creates a coordinator for a world of the given height.
    #[must_use]
    pub fn new(
        height: WorldHeight,
        source: Arc<dyn ChunkSource>,
        listener: Arc<dyn LightListener>,
    ) -> Self {
        let store = Arc::new(LightStore::new(height));
        Self {
            block: Propagator::new(LightKind::Block, &store),
            sky: Propagator::new(LightKind::Sky, &store),
            emptiness: EmptinessMap::new(height),
            store,
            source,
            listener,
            changes: FxHashMap::default(),
            queued_loads: FxHashMap::default(),
            queued_edge_checks_block: FxHashMap::default(),
            queued_edge_checks_sky: FxHashMap::default(),
            pending_edges_block: FxHashMap::default(),
            pending_edges_sky: FxHashMap::default(),
        }
    }

    /// Records that the voxel at `pos` may have changed opacity or
    /// emission. Queuing only; repeated calls for the same position
    /// collapse.
    pub fn block_change(&mut self, pos: BlockPos) {
        self.changes
            .entry(pos.chunk().key())
            .or_default()
            .positions
            .insert(pos);
    }

    /// Records that a section's emptiness toggled, forcing a full recheck
    /// of that section's light next pass.
    pub fn section_change(&mut self, section: SectionPos, became_empty: bool) {
        self.changes
            .entry(section.chunk().key())
            .or_default()
            .section_toggles
            .insert(section.0.y, became_empty);
    }

    /// Queues a load replay, seeding light state from the emptiness
    /// snapshot once the chunk resolves.
    pub fn load_in_chunk(&mut self, chunk_x: i32, chunk_z: i32, emptiness: Box<[bool]>) {
        let chunk = ChunkPos::new(chunk_x, chunk_z);
        self.queued_loads
            .insert(chunk.key(), PendingLoad { emptiness });
    }

    /// Schedules sky-light boundary rechecks for the named sections.
    pub fn check_sky_edges(
        &mut self,
        chunk_x: i32,
        chunk_z: i32,
        sections: impl IntoIterator<Item = i32>,
    ) {
        let key = ChunkPos::new(chunk_x, chunk_z).key();
        self.queued_edge_checks_sky
            .entry(key)
            .or_default()
            .extend(sections);
    }

    /// Schedules block-light boundary rechecks for the named sections.
    pub fn check_block_edges(
        &mut self,
        chunk_x: i32,
        chunk_z: i32,
        sections: impl IntoIterator<Item = i32>,
    ) {
        let key = ChunkPos::new(chunk_x, chunk_z).key();
        self.queued_edge_checks_block
            .entry(key)
            .or_default()
            .extend(sections);
    }

    /// Discards all light state and pending work for a chunk.
    pub fn unload_chunk(&mut self, chunk_x: i32, chunk_z: i32) {
        let chunk = ChunkPos::new(chunk_x, chunk_z);
        let key = chunk.key();
        self.store.remove(chunk);
        self.emptiness.remove(chunk);
        self.changes.remove(&key);
        self.queued_loads.remove(&key);
        self.queued_edge_checks_block.remove(&key);
        self.queued_edge_checks_sky.remove(&key);
        self.pending_edges_block.remove(&key);
        self.pending_edges_sky.remove(&key);
    }

    /// Whether any input queue is non-empty. Does not run propagation.
    #[must_use]
    pub fn has_updates(&self) -> bool {
        !self.changes.is_empty()
            || !self.queued_loads.is_empty()
            || !self.queued_edge_checks_block.is_empty()
            || !self.queued_edge_checks_sky.is_empty()
    }

    /// A read-only view for one light type, usable concurrently with
    /// ongoing passes.
    #[must_use]
    pub fn reader(&self, kind: LightKind) -> LightReader {
        LightReader::new(Arc::clone(&self.store), kind)
    }

    /// Reads `max(sky - ambient_darkness, block)` at a position.
    #[must_use]
    pub fn get_light(&self, pos: BlockPos, ambient_darkness: u8) -> u8 {
        let sky = self.store.light_level(LightKind::Sky, pos);
        let block = self.store.light_level(LightKind::Block, pos);
        sky.saturating_sub(ambient_darkness).max(block)
    }

    /// Drains every queue, runs both propagators to fixpoint, publishes the
    /// results and notifies the listener once per changed section.
    ///
    /// Returns whether any published light value changed.
    pub fn propagate_changes(&mut self) -> bool {
        if !self.has_updates() {
            return false;
        }

        // Chunks may have loaded or unloaded since the last pass.
        self.block.invalidate_chunk_cache();
        self.sky.invalidate_chunk_cache();

        self.replay_loads();
        self.drain_changes();
        self.drain_edge_checks();

        let mut ctx = PropagationContext {
            store: self.store.as_ref(),
            source: self.source.as_ref(),
            emptiness: &self.emptiness,
            pending_edges: &mut self.pending_edges_block,
        };
        self.block.propagate(&mut ctx);

        let mut ctx = PropagationContext {
            store: self.store.as_ref(),
            source: self.source.as_ref(),
            emptiness: &self.emptiness,
            pending_edges: &mut self.pending_edges_sky,
        };
        self.sky.propagate(&mut ctx);

        let mut changed_sections = 0usize;
        for propagator in [&mut self.block, &mut self.sky] {
            let kind = propagator.kind();
            for (chunk, section_y) in propagator.publish(&self.store) {
                changed_sections += 1;
                self.listener.on_section_change(
                    kind,
                    SectionPos::new(chunk.0.x, section_y, chunk.0.y),
                );
            }
        }
        log::trace!("light pass published {changed_sections} changed sections");
        changed_sections > 0
    }

    /// Replays queued chunk loads whose chunks have become resolvable;
    /// the rest are re-queued for the next pass.
    fn replay_loads(&mut self) {
        let height = self.store.height();
        let loads = mem::take(&mut self.queued_loads);
        for (key, load) in loads {
            let chunk = ChunkPos::from_key(key);
            if !self.source.is_resolvable(chunk) {
                log::debug!("light load for {chunk:?} deferred, chunk not resolvable yet");
                self.queued_loads.insert(key, load);
                continue;
            }

            self.emptiness.load(chunk, load.emptiness);
            self.store
                .insert(chunk, Arc::new(ChunkLightState::new(height)));

            let mut ctx = PropagationContext {
                store: self.store.as_ref(),
                source: self.source.as_ref(),
                emptiness: &self.emptiness,
                pending_edges: &mut self.pending_edges_sky,
            };
            self.sky.seed_chunk_sky(&mut ctx, chunk);

            // Boundaries that were deferred waiting on this chunk can run
            // now, along with this chunk's own faces against loaded
            // neighbors.
            if let Some(sections) = self.pending_edges_block.remove(&key) {
                self.queued_edge_checks_block
                    .entry(key)
                    .or_default()
                    .extend(sections);
            }
            if let Some(sections) = self.pending_edges_sky.remove(&key) {
                self.queued_edge_checks_sky
                    .entry(key)
                    .or_default()
                    .extend(sections);
            }
            for index in 0..height.stored_sections() {
                let section_y = height.section_y(index);
                self.queued_edge_checks_block
                    .entry(key)
                    .or_default()
                    .insert(section_y);
                self.queued_edge_checks_sky
                    .entry(key)
                    .or_default()
                    .insert(section_y);
            }
        }
    }

    /// Applies queued block/section changes to the propagator queues.
    fn drain_changes(&mut self) {
        let changes = mem::take(&mut self.changes);
        for (key, change) in changes {
            let chunk = ChunkPos::from_key(key);
            if !self.store.contains(chunk) {
                if !change.is_empty() {
                    log::debug!("dropping light changes for {chunk:?}, light not enabled");
                }
                continue;
            }

            for (&section_y, &empty) in &change.section_toggles {
                self.emptiness.set(chunk, section_y, empty);
            }
            // An emptiness toggle invalidates the section shortcut, so every
            // voxel of the section gets re-evaluated.
            for (&section_y, _) in &change.section_toggles {
                let base = BlockPos::new(chunk.0.x * 16, section_y * 16, chunk.0.y * 16);
                for y in 0..16 {
                    for z in 0..16 {
                        for x in 0..16 {
                            let pos = base.offset(x, y, z);
                            self.block.check_position(pos);
                            self.sky.check_position(pos);
                        }
                    }
                }
            }

            for pos in change.positions {
                self.block.check_position(pos);
                self.sky.check_position(pos);
            }
        }
    }

    /// Runs scheduled boundary checks; unresolved faces are re-deferred
    /// inside `check_edges`.
    fn drain_edge_checks(&mut self) {
        let checks = mem::take(&mut self.queued_edge_checks_block);
        for (key, sections) in checks {
            let chunk = ChunkPos::from_key(key);
            let mut ctx = PropagationContext {
                store: self.store.as_ref(),
                source: self.source.as_ref(),
                emptiness: &self.emptiness,
                pending_edges: &mut self.pending_edges_block,
            };
            for section_y in sections {
                self.block.check_edges(&mut ctx, chunk, section_y);
            }
        }

        let checks = mem::take(&mut self.queued_edge_checks_sky);
        for (key, sections) in checks {
            let chunk = ChunkPos::from_key(key);
            let mut ctx = PropagationContext {
                store: self.store.as_ref(),
                source: self.source.as_ref(),
                emptiness: &self.emptiness,
                pending_edges: &mut self.pending_edges_sky,
            };
            for section_y in sections {
                self.sky.check_edges(&mut ctx, chunk, section_y);
            }
        }
    }
}
