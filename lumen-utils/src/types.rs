// Wrapper types making it harder to accidentally use the wrong underlying type.

use crate::math::{vector2::Vector2, vector3::Vector3};

/// A block position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos(pub Vector3<i32>);

/// A chunk column position (block coordinates divided by 16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos(pub Vector2<i32>);

/// A 16x16x16 section position: chunk x, section y, chunk z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a block position from raw coordinates.
    #[must_use]
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// Returns this position offset by the given deltas.
    #[must_use]
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self(Vector3::new(self.0.x + dx, self.0.y + dy, self.0.z + dz))
    }

    /// Returns the chunk column containing this position.
    #[must_use]
    #[inline]
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos(Vector2::new(self.0.x >> 4, self.0.z >> 4))
    }

    /// Returns the section containing this position.
    #[must_use]
    #[inline]
    pub const fn section(self) -> SectionPos {
        SectionPos(Vector3::new(self.0.x >> 4, self.0.y >> 4, self.0.z >> 4))
    }

    /// Returns the coordinates relative to the containing section (each 0-15).
    #[must_use]
    #[inline]
    pub const fn section_relative(self) -> (usize, usize, usize) {
        (
            (self.0.x & 15) as usize,
            (self.0.y & 15) as usize,
            (self.0.z & 15) as usize,
        )
    }
}

impl ChunkPos {
    /// Creates a chunk position from raw coordinates.
    #[must_use]
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// Packs this position into a single map key.
    ///
    /// The low 32 bits hold x and the high 32 bits hold z, so nearby chunks
    /// hash to distinct keys without collisions anywhere in the world.
    #[must_use]
    #[inline]
    pub const fn key(self) -> u64 {
        (self.0.x as u32 as u64) | ((self.0.y as u32 as u64) << 32)
    }

    /// Unpacks a key produced by [`ChunkPos::key`].
    #[must_use]
    #[inline]
    pub const fn from_key(key: u64) -> Self {
        Self(Vector2::new(key as u32 as i32, (key >> 32) as u32 as i32))
    }

    /// Returns this position offset by the given deltas.
    #[must_use]
    #[inline]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self(Vector2::new(self.0.x + dx, self.0.y + dz))
    }
}

impl SectionPos {
    /// Creates a section position from raw coordinates.
    #[must_use]
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// Returns the chunk column containing this section.
    #[must_use]
    #[inline]
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos(Vector2::new(self.0.x, self.0.z))
    }
}
