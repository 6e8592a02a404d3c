//! Lock-free read-side views over published light data.

use std::sync::Arc;

use lumen_utils::{BlockPos, SectionPos};

use super::chunk_light::LightStore;
use super::nibble::NibbleData;
use super::LightKind;

/// A read-only view of one light type.
///
/// Readers are cheap to clone and never block: every query loads the
/// published snapshot for the section it touches, so values observed are
/// always complete published states, never half-applied passes.
#[derive(Debug, Clone)]
pub struct LightReader {
    store: Arc<LightStore>,
    kind: LightKind,
}

impl LightReader {
    pub(crate) fn new(store: Arc<LightStore>, kind: LightKind) -> Self {
        Self { store, kind }
    }

    /// The light type this reader serves.
    #[must_use]
    pub const fn kind(&self) -> LightKind {
        self.kind
    }

    /// Reads the published light level at a position.
    ///
    /// Unloaded chunks read as 0; sky light above the stored range of a
    /// loaded chunk reads as full daylight.
    #[must_use]
    pub fn get_light(&self, pos: BlockPos) -> u8 {
        self.store.light_level(self.kind, pos)
    }

    /// A consistent snapshot of one stored section, for serialization.
    ///
    /// Returns `None` when the chunk has no light state or the section lies
    /// outside the stored range.
    #[must_use]
    pub fn section_snapshot(&self, section: SectionPos) -> Option<Arc<NibbleData>> {
        let state = self.store.chunk(section.chunk())?;
        let index = self.store.height().storage_index(section.0.y)?;
        Some(state.nibble(self.kind, index).snapshot())
    }
}
