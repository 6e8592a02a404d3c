//! # Lumen
//!
//! Incremental light propagation over a voxel world with single-writer,
//! many-reader storage. One writer context drives queued updates to a
//! fixpoint while readers query published light values without locking.

/// The light propagation engine.
pub mod light;
