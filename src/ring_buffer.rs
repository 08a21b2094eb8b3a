use serde::Serialize;
use std::collections::VecDeque;
use tracing::trace;

/// Fixed-capacity buffer that keeps the newest entries first.
///
/// Pushing onto a full buffer silently drops the oldest entry; overflow is the
/// steady state for both the detection history and the activity log.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
    stats: RingBufferStats,
}

/// Counters for ring buffer monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RingBufferStats {
    /// Total entries pushed to the buffer
    pub pushed: u64,
    /// Number of entries dropped because the buffer was full
    pub overruns: u64,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer holding at most `capacity` entries
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    ///
    /// # Example
    /// ```
    /// use watchcam::ring_buffer::RingBuffer;
    ///
    /// let mut buffer = RingBuffer::new(2);
    /// buffer.push(1);
    /// buffer.push(2);
    /// buffer.push(3);
    /// assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![3, 2]);
    /// ```
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            panic!("Ring buffer capacity must be greater than 0");
        }

        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            stats: RingBufferStats::default(),
        }
    }

    /// Insert an entry as the newest, returning the evicted oldest entry if any
    pub fn push(&mut self, entry: T) -> Option<T> {
        self.entries.push_front(entry);
        self.stats.pushed += 1;

        if self.entries.len() > self.capacity {
            self.stats.overruns += 1;
            trace!("Ring buffer overrun at capacity {}", self.capacity);
            self.entries.pop_back()
        } else {
            None
        }
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter()
    }

    /// The `limit` most recent entries, newest first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().take(limit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> RingBufferStats {
        self.stats
    }

    /// Drop all entries, keeping the counters
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
