//! Two-phase flood-fill light propagation.
//!
//! Each pass drains the decrease queue, then the increase queue. The
//! decrease phase recomputes queued positions from their own source value
//! and their neighbors' cached levels, lowering and spreading where the
//! cached value can no longer be justified. The increase phase pushes
//! `level - attenuation` outward until no neighbor can be raised. The final
//! levels equal a from-scratch flood fill over the same scene and do not
//! depend on queue order.
//!
//! Propagation that would cross into a chunk without light state records the
//! boundary in that chunk's pending edge set instead of guessing a value.

use lumen_utils::{BlockPos, ChunkPos};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::access::ChunkSource;
use super::chunk_light::LightStore;
use super::direction::Direction;
use super::light_queue::LightQueue;
use super::pending::{EmptinessMap, SectionSet};
use super::queue_entry::QueueEntry;
use super::working::{ChangedSection, WorkingSet};
use super::{LightKind, MAX_LIGHT_LEVEL};

/// Everything a propagation pass needs besides the propagator's own state.
pub(crate) struct PropagationContext<'a> {
    pub store: &'a LightStore,
    pub source: &'a dyn ChunkSource,
    pub emptiness: &'a EmptinessMap,
    /// Deferred boundary checks, keyed by the unresolved chunk that unblocks
    /// them.
    pub pending_edges: &'a mut FxHashMap<u64, SectionSet>,
}

/// BFS fixpoint solver for one light type.
///
/// The block and sky instances are fully independent; they share only the
/// storage access pattern and the host's opacity/emission capability.
pub(crate) struct Propagator {
    kind: LightKind,
    increase_queue: LightQueue,
    decrease_queue: LightQueue,
    working: WorkingSet,
}

impl Propagator {
    pub(crate) fn new(kind: LightKind, store: &LightStore) -> Self {
        Self {
            kind,
            increase_queue: LightQueue::new(),
            decrease_queue: LightQueue::new(),
            working: WorkingSet::new(kind, store.height()),
        }
    }

    pub(crate) const fn kind(&self) -> LightKind {
        self.kind
    }

    /// Forgets chunk lookups cached by earlier passes.
    pub(crate) fn invalidate_chunk_cache(&mut self) {
        self.working.invalidate_chunk_cache();
    }

    /// Schedules a position for re-evaluation in the next pass.
    pub(crate) fn check_position(&mut self, pos: BlockPos) {
        self.decrease_queue.enqueue(pos, QueueEntry::decrease(0));
    }

    /// Runs both phases to fixpoint.
    pub(crate) fn propagate(&mut self, ctx: &mut PropagationContext<'_>) {
        self.run_decreases(ctx);
        self.run_increases(ctx);
        debug_assert!(self.decrease_queue.is_empty() && self.increase_queue.is_empty());
    }

    /// Publishes staged writes, returning the sections whose published
    /// value changed.
    pub(crate) fn publish(&mut self, store: &LightStore) -> SmallVec<[ChangedSection; 8]> {
        self.working.publish(store)
    }

    /// The light source value a position holds on its own.
    fn source_level(&mut self, ctx: &PropagationContext<'_>, pos: BlockPos) -> u8 {
        match self.kind {
            LightKind::Block => {
                if ctx.store.height().is_in_world(pos.0.y >> 4) {
                    ctx.source.emission(pos)
                } else {
                    0
                }
            }
            // Sky light has no in-world sources; it enters through the
            // always-lit border section above the world.
            LightKind::Sky => 0,
        }
    }

    /// Light lost crossing into `target` when traveling in `travel_dir`.
    ///
    /// At least 1 per voxel, except full-level sky light falling straight
    /// down into a section known to hold no geometry, which crosses free.
    fn attenuation_into(
        &self,
        ctx: &PropagationContext<'_>,
        target: BlockPos,
        incoming_level: u8,
        travel_dir: Direction,
    ) -> u8 {
        let section_y = target.0.y >> 4;
        if self.kind == LightKind::Sky
            && travel_dir == Direction::Down
            && incoming_level == MAX_LIGHT_LEVEL
            && ctx.emptiness.is_empty(target.chunk(), section_y)
        {
            return 0;
        }
        let opacity = if ctx.store.height().is_in_world(section_y) {
            ctx.source.opacity(target)
        } else {
            0
        };
        opacity.max(1)
    }

    /// Best level derivable for `pos` from its own source value and its
    /// neighbors' currently cached levels.
    fn compute_level(&mut self, ctx: &mut PropagationContext<'_>, pos: BlockPos) -> u8 {
        let mut level = self.source_level(ctx, pos);
        for dir in Direction::ALL {
            if level >= MAX_LIGHT_LEVEL {
                break;
            }
            let neighbor = dir.relative(pos);
            let Some(neighbor_level) = self.working.level(ctx.store, neighbor) else {
                self.defer_edge(ctx, neighbor);
                continue;
            };
            if neighbor_level <= level {
                continue;
            }
            // Light travels from the neighbor toward pos.
            let attenuation = self.attenuation_into(ctx, pos, neighbor_level, dir.opposite());
            level = level.max(neighbor_level.saturating_sub(attenuation));
        }
        level
    }

    /// Records a boundary against an unresolved chunk for a later retry.
    fn defer_edge(&mut self, ctx: &mut PropagationContext<'_>, neighbor: BlockPos) {
        let chunk = neighbor.chunk();
        let section_y = neighbor.0.y >> 4;
        if ctx
            .pending_edges
            .entry(chunk.key())
            .or_default()
            .insert(section_y)
        {
            log::trace!(
                "deferred {:?} light edge into unresolved chunk {:?} section {section_y}",
                self.kind,
                chunk
            );
        }
    }

    fn run_decreases(&mut self, ctx: &mut PropagationContext<'_>) {
        while let Some((pos, _entry)) = self.decrease_queue.dequeue() {
            if ctx.store.height().storage_index(pos.0.y >> 4).is_none() {
                continue;
            }
            // The chunk may have unloaded since this was queued.
            let Some(cached) = self.working.level(ctx.store, pos) else {
                continue;
            };

            let computed = self.compute_level(ctx, pos);
            if computed < cached {
                self.working.set_level(ctx.store, pos, computed);
                for dir in Direction::ALL {
                    let neighbor = dir.relative(pos);
                    if self.working.is_resolved(ctx.store, neighbor) {
                        self.decrease_queue.enqueue(neighbor, QueueEntry::decrease(cached));
                    } else {
                        self.defer_edge(ctx, neighbor);
                    }
                }
                if computed > 0 {
                    self.increase_queue
                        .enqueue(pos, QueueEntry::increase_from_emission(computed));
                }
            } else {
                // Still justified (or risen); confirm and spread from here.
                self.increase_queue
                    .enqueue(pos, QueueEntry::increase_from_emission(computed));
            }
        }
    }

    fn run_increases(&mut self, ctx: &mut PropagationContext<'_>) {
        while let Some((pos, entry)) = self.increase_queue.dequeue() {
            if ctx.store.height().storage_index(pos.0.y >> 4).is_none() {
                continue;
            }
            let Some(cached) = self.working.level(ctx.store, pos) else {
                continue;
            };

            let level = if entry.is_from_emission() {
                // The decrease phase queues these with the level that was
                // justified at the time; later lowering can invalidate it,
                // so recompute before trusting the entry.
                let computed = self.compute_level(ctx, pos);
                if computed > cached {
                    self.working.set_level(ctx.store, pos, computed);
                }
                computed.max(cached)
            } else {
                // A non-source entry whose level no longer matches the
                // cached value is stale; whatever changed it requeued.
                if cached != entry.level() {
                    continue;
                }
                entry.level()
            };
            if level <= 1 {
                continue;
            }

            for dir in Direction::ALL {
                if !entry.should_propagate(dir) {
                    continue;
                }
                let neighbor = dir.relative(pos);
                if ctx.store.height().storage_index(neighbor.0.y >> 4).is_none() {
                    continue;
                }
                let Some(neighbor_level) = self.working.level(ctx.store, neighbor) else {
                    self.defer_edge(ctx, neighbor);
                    continue;
                };

                let attenuation = self.attenuation_into(ctx, neighbor, level, dir);
                let candidate = level.saturating_sub(attenuation);
                if candidate <= neighbor_level {
                    continue;
                }

                if self.kind == LightKind::Sky
                    && dir == Direction::Down
                    && candidate == MAX_LIGHT_LEVEL
                {
                    // Full sky light entering an empty section falls to its
                    // floor in one jump instead of one BFS step per voxel.
                    self.sky_fall(ctx, neighbor);
                } else {
                    self.working.set_level(ctx.store, neighbor, candidate);
                    self.increase_queue.enqueue(
                        neighbor,
                        QueueEntry::increase_skip_one_direction(candidate, dir.opposite()),
                    );
                }
            }
        }
    }

    /// Drops a full-level sky column through consecutive empty sections.
    ///
    /// Every voxel written is queued for horizontal spread; the entry at the
    /// lowest voxel carries the fall into non-empty territory via the normal
    /// per-voxel path.
    fn sky_fall(&mut self, ctx: &mut PropagationContext<'_>, start: BlockPos) {
        debug_assert!(self.kind == LightKind::Sky);
        let mut pos = start;
        loop {
            if !self.working.set_level(ctx.store, pos, MAX_LIGHT_LEVEL) {
                break;
            }
            self.increase_queue
                .enqueue(pos, QueueEntry::increase_sky_column(MAX_LIGHT_LEVEL));

            let below = Direction::Down.relative(pos);
            if ctx.store.height().storage_index(below.0.y >> 4).is_none()
                || !ctx.emptiness.is_empty(below.chunk(), below.0.y >> 4)
            {
                break;
            }
            pos = below;
        }
    }

    /// Seeds a freshly loaded chunk's sky light.
    ///
    /// The border section above the world becomes uniformly lit, every
    /// consecutive empty section below it is filled wholesale, and the
    /// bottom face of the lowest filled section is queued so the fall
    /// continues into the first section holding geometry.
    pub(crate) fn seed_chunk_sky(&mut self, ctx: &mut PropagationContext<'_>, chunk: ChunkPos) {
        debug_assert!(self.kind == LightKind::Sky);
        let height = ctx.store.height();
        let top_border = height.stored_sections() - 1;
        self.working
            .set_section_uniform(ctx.store, chunk, top_border, MAX_LIGHT_LEVEL);

        let mut lowest_filled = top_border;
        while lowest_filled > 1 {
            let below = lowest_filled - 1;
            if !ctx.emptiness.is_empty(chunk, height.section_y(below)) {
                break;
            }
            self.working
                .set_section_uniform(ctx.store, chunk, below, MAX_LIGHT_LEVEL);
            lowest_filled = below;
        }

        let base_x = chunk.0.x * 16;
        let base_z = chunk.0.y * 16;
        let floor_y = height.section_y(lowest_filled) * 16;
        for z in 0..16 {
            for x in 0..16 {
                self.increase_queue.enqueue(
                    BlockPos::new(base_x + x, floor_y, base_z + z),
                    QueueEntry::increase_sky_column(MAX_LIGHT_LEVEL),
                );
            }
        }
    }

    /// Re-examines one section's boundary faces against resolved neighbor
    /// chunks, queueing light flow in both directions. Faces against
    /// unresolved neighbors are re-deferred.
    pub(crate) fn check_edges(
        &mut self,
        ctx: &mut PropagationContext<'_>,
        chunk: ChunkPos,
        section_y: i32,
    ) {
        let height = ctx.store.height();
        if height.storage_index(section_y).is_none() || !ctx.store.contains(chunk) {
            return;
        }

        for dir in Direction::HORIZONTAL {
            let (dx, _, dz) = dir.offset();
            let neighbor_chunk = chunk.offset(dx, dz);
            if !ctx.store.contains(neighbor_chunk) {
                ctx.pending_edges
                    .entry(neighbor_chunk.key())
                    .or_default()
                    .insert(section_y);
                continue;
            }

            let base_y = section_y * 16;
            for i in 0..16 {
                for y in 0..16 {
                    let (our_x, our_z) = match dir {
                        Direction::West => (chunk.0.x * 16, chunk.0.y * 16 + i),
                        Direction::East => (chunk.0.x * 16 + 15, chunk.0.y * 16 + i),
                        Direction::North => (chunk.0.x * 16 + i, chunk.0.y * 16),
                        Direction::South => (chunk.0.x * 16 + i, chunk.0.y * 16 + 15),
                        Direction::Down | Direction::Up => unreachable!(),
                    };
                    let ours = BlockPos::new(our_x, base_y + y, our_z);
                    let theirs = dir.relative(ours);

                    let our_level = self.working.level(ctx.store, ours).unwrap_or(0);
                    let their_level = self.working.level(ctx.store, theirs).unwrap_or(0);
                    if their_level > 1 {
                        self.increase_queue.enqueue(
                            theirs,
                            QueueEntry::increase_only_one_direction(their_level, dir.opposite()),
                        );
                    }
                    if our_level > 1 {
                        self.increase_queue
                            .enqueue(ours, QueueEntry::increase_only_one_direction(our_level, dir));
                    }
                }
            }
        }
    }
}
