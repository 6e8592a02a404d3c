//! Shared coordinate and math primitives for the lumen workspace.

/// Small fixed-size vector types.
pub mod math;
mod types;

pub use types::{BlockPos, ChunkPos, SectionPos};
