//! FIFO queue for light propagation entries.
//!
//! A simple array-backed ring buffer; flood fill dequeues in insertion order
//! and the queue is fully drained every pass, so nothing fancier is needed.

use lumen_utils::BlockPos;

use super::queue_entry::QueueEntry;

/// A FIFO queue of (`BlockPos`, `QueueEntry`) pairs backed by a ring buffer.
///
/// Capacity is kept at a power of two so the head/tail wrap is a mask
/// instead of a modulo.
#[derive(Debug)]
pub struct LightQueue {
    buffer: Vec<(BlockPos, QueueEntry)>,
    head: usize,
    tail: usize,
    size: usize,
}

impl LightQueue {
    /// Creates an empty queue pre-sized for typical flood-fill workloads.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Creates an empty queue with at least the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two();
        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            tail: 0,
            size: 0,
        }
    }

    /// Enqueues a position and entry for processing.
    #[inline]
    pub fn enqueue(&mut self, pos: BlockPos, entry: QueueEntry) {
        if self.size == self.buffer.capacity() {
            self.grow();
        }

        if self.tail < self.buffer.len() {
            self.buffer[self.tail] = (pos, entry);
        } else {
            self.buffer.push((pos, entry));
        }

        self.tail = (self.tail + 1) & (self.buffer.capacity() - 1);
        self.size += 1;
    }

    /// Dequeues the next position and entry, or `None` if empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<(BlockPos, QueueEntry)> {
        if self.size == 0 {
            return None;
        }

        let item = self.buffer[self.head];
        self.head = (self.head + 1) & (self.buffer.capacity() - 1);
        self.size -= 1;

        Some(item)
    }

    /// Checks if the queue is empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of queued entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Doubles capacity, compacting live entries to the front.
    fn grow(&mut self) {
        let old_capacity = self.buffer.capacity();
        let new_capacity = (old_capacity * 2).max(16);

        let mut new_buffer = Vec::with_capacity(new_capacity);
        for _ in 0..self.size {
            new_buffer.push(self.buffer[self.head]);
            self.head = (self.head + 1) & (old_capacity - 1);
        }

        self.buffer = new_buffer;
        self.head = 0;
        self.tail = self.size;
    }
}

impl Default for LightQueue {
    fn default() -> Self {
        Self::new()
    }
}
