//! Cardinal direction enum for light propagation.

use lumen_utils::BlockPos;

/// Six cardinal directions for light propagation.
///
/// The ordinal values (0-5) are load-bearing: [`QueueEntry`] direction flags
/// occupy bits 4-9, indexed by these ordinals.
///
/// [`QueueEntry`]: super::queue_entry::QueueEntry
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Downward (-Y), ordinal 0.
    Down = 0,
    /// Upward (+Y), ordinal 1.
    Up = 1,
    /// North (-Z), ordinal 2.
    North = 2,
    /// South (+Z), ordinal 3.
    South = 3,
    /// West (-X), ordinal 4.
    West = 4,
    /// East (+X), ordinal 5.
    East = 5,
}

impl Direction {
    /// All six directions in ordinal order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four horizontal directions, used for chunk edge checks.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Returns the (dx, dy, dz) offset for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// Returns the position one step from `pos` in this direction.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }
}
