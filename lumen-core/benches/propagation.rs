//! Benchmarks for the hot propagation paths: initial chunk lighting, a
//! single emitter update, and emitter removal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use lumen_core::light::{
    BlockAccess, ChunkSource, LightCoordinator, NoopListener, WorldHeight,
};
use lumen_utils::{BlockPos, ChunkPos};

const HEIGHT: WorldHeight = WorldHeight {
    min_section_y: 0,
    section_count: 24,
};

/// Flat world: opaque ground below y = 64, air above, no emitters.
struct FlatWorld;

impl BlockAccess for FlatWorld {
    fn opacity(&self, pos: BlockPos) -> u8 {
        if pos.0.y < 64 { 15 } else { 0 }
    }

    fn emission(&self, _pos: BlockPos) -> u8 {
        0
    }
}

impl ChunkSource for FlatWorld {
    fn is_resolvable(&self, _chunk: ChunkPos) -> bool {
        true
    }
}

fn emptiness() -> Box<[bool]> {
    // Sections fully below ground are solid; the rest are air.
    (0..HEIGHT.section_count).map(|i| i >= 4).collect()
}

fn bench_chunk_load(c: &mut Criterion) {
    c.bench_function("light_3x3_chunk_area", |b| {
        b.iter_batched(
            || {
                let mut coordinator =
                    LightCoordinator::new(HEIGHT, Arc::new(FlatWorld), Arc::new(NoopListener));
                for x in -1..=1 {
                    for z in -1..=1 {
                        coordinator.load_in_chunk(x, z, emptiness());
                    }
                }
                coordinator
            },
            |mut coordinator| coordinator.propagate_changes(),
            BatchSize::SmallInput,
        );
    });
}

/// World identical to [`FlatWorld`] plus one toggleable full-strength
/// emitter.
struct EmitterWorld {
    emitter: BlockPos,
    active: AtomicBool,
}

impl EmitterWorld {
    fn new(emitter: BlockPos) -> Self {
        Self {
            emitter,
            active: AtomicBool::new(true),
        }
    }
}

impl BlockAccess for EmitterWorld {
    fn opacity(&self, pos: BlockPos) -> u8 {
        FlatWorld.opacity(pos)
    }

    fn emission(&self, pos: BlockPos) -> u8 {
        if pos == self.emitter && self.active.load(Ordering::Relaxed) {
            15
        } else {
            0
        }
    }
}

impl ChunkSource for EmitterWorld {
    fn is_resolvable(&self, _chunk: ChunkPos) -> bool {
        true
    }
}

fn bench_emitter_placed(c: &mut Criterion) {
    let emitter = BlockPos::new(8, 70, 8);
    c.bench_function("place_full_strength_emitter", |b| {
        b.iter_batched(
            || {
                let mut coordinator = LightCoordinator::new(
                    HEIGHT,
                    Arc::new(EmitterWorld::new(emitter)),
                    Arc::new(NoopListener),
                );
                for x in -1..=1 {
                    for z in -1..=1 {
                        coordinator.load_in_chunk(x, z, emptiness());
                    }
                }
                coordinator.propagate_changes();
                coordinator.block_change(emitter);
                coordinator
            },
            |mut coordinator| coordinator.propagate_changes(),
            BatchSize::SmallInput,
        );
    });
}

fn bench_emitter_removed(c: &mut Criterion) {
    let emitter = BlockPos::new(8, 70, 8);
    c.bench_function("remove_full_strength_emitter", |b| {
        b.iter_batched(
            || {
                let world = Arc::new(EmitterWorld::new(emitter));
                let mut coordinator = LightCoordinator::new(
                    HEIGHT,
                    Arc::clone(&world) as Arc<dyn ChunkSource>,
                    Arc::new(NoopListener),
                );
                for x in -1..=1 {
                    for z in -1..=1 {
                        coordinator.load_in_chunk(x, z, emptiness());
                    }
                }
                coordinator.block_change(emitter);
                coordinator.propagate_changes();

                // Deactivate the emitter; the measured pass tears its light
                // down.
                world.active.store(false, Ordering::Relaxed);
                coordinator.block_change(emitter);
                coordinator
            },
            |mut coordinator| coordinator.propagate_changes(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_chunk_load,
    bench_emitter_placed,
    bench_emitter_removed
);
criterion_main!(benches);
