//! Capability traits supplied by the host world.

use lumen_utils::{BlockPos, ChunkPos, SectionPos};

use super::LightKind;

/// Read access to block properties relevant to light.
///
/// Queried during propagation and never cached by the engine beyond one
/// pass, so hosts are free to mutate blocks between passes.
pub trait BlockAccess: Send + Sync {
    /// How much light is absorbed crossing into this voxel (0-15).
    ///
    /// The engine enforces a minimum attenuation of 1 per voxel regardless
    /// of the returned value; anything above 1 models translucent geometry.
    fn opacity(&self, pos: BlockPos) -> u8;

    /// How much block light this voxel emits (0-15).
    fn emission(&self, pos: BlockPos) -> u8;
}

/// Resolves which chunks currently have usable light-bearing state.
pub trait ChunkSource: BlockAccess {
    /// Whether the chunk at the given position can be read right now.
    ///
    /// Returning `false` is not an error; work touching the chunk is
    /// deferred and retried once it resolves.
    fn is_resolvable(&self, chunk: ChunkPos) -> bool;
}

/// Sink notified once per section whose published light changed in a pass.
///
/// Hosts typically mark the section for retransmission or re-render.
pub trait LightListener: Send + Sync {
    /// Called from inside `propagate_changes` after the new values have been
    /// published.
    fn on_section_change(&self, kind: LightKind, section: SectionPos);
}

/// Listener that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl LightListener for NoopListener {
    fn on_section_change(&self, _kind: LightKind, _section: SectionPos) {}
}
