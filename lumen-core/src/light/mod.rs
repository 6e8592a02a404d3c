//! Incremental flood-fill light propagation with lock-free reads.

mod access;
mod chunk_light;
mod coordinator;
pub mod direction;
pub mod light_queue;
mod nibble;
mod pending;
mod propagator;
pub mod queue_entry;
mod reader;
mod working;

pub use access::{BlockAccess, ChunkSource, LightListener, NoopListener};
pub use chunk_light::{ChunkLightState, LightStore, WorldHeight};
pub use coordinator::LightCoordinator;
pub use direction::Direction;
pub use light_queue::LightQueue;
pub use nibble::{NIBBLE_ARRAY_SIZE, NibbleData, NibbleDataError, SwmrNibbleArray};
pub use queue_entry::QueueEntry;
pub use reader::LightReader;

/// The maximum light level a voxel can hold.
pub const MAX_LIGHT_LEVEL: u8 = 15;

/// The two independently computed light types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Light emitted by blocks.
    Block,
    /// Light derived from the sky.
    Sky,
}

impl LightKind {
    /// Both light kinds, in storage order.
    pub const ALL: [LightKind; 2] = [LightKind::Block, LightKind::Sky];
}
