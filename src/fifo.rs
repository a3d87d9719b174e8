//! Bounded byte-chunk FIFO between the feed producer and the engine.
//!
//! Models the ingress buffer of a hardware soft-core: writes that would
//! exceed the byte capacity are rejected whole (backpressure), never
//! truncated, and the producer sees the reject so it can retry after
//! the consumer drains.

use std::collections::VecDeque;

use tracing::trace;

/// Default FIFO depth in bytes. Sized like a small hardware ingress
/// buffer: enough for a burst of frames, small enough to surface
/// backpressure quickly.
pub const DEFAULT_FIFO_CAPACITY: usize = 4096;

/// Flow-control counters. All monotone; reset only via
/// [`ChunkFifo::reset_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FifoStats {
    /// Number of rejected writes
    pub backpressure_events: u64,
    /// Total accepted bytes
    pub bytes_written: u64,
    /// Total bytes dropped with rejected writes
    pub bytes_dropped: u64,
    /// Total consumed bytes
    pub bytes_read: u64,
    /// Maximum depth_bytes ever reached
    pub high_water_mark: u64,
}

/// Ordered queue of byte chunks with a fixed byte budget.
///
/// `depth_bytes <= capacity_bytes` holds at every observable moment.
#[derive(Debug)]
pub struct ChunkFifo {
    queue: VecDeque<Vec<u8>>,
    capacity_bytes: usize,
    depth_bytes: usize,
    stats: FifoStats,
}

impl ChunkFifo {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity_bytes,
            depth_bytes: 0,
            stats: FifoStats::default(),
        }
    }

    /// Offer a chunk to the FIFO.
    ///
    /// Returns `true` if the chunk was accepted, `false` if accepting it
    /// would exceed the byte capacity. A rejected chunk is not enqueued
    /// and not copied.
    pub fn write(&mut self, chunk: &[u8]) -> bool {
        if self.depth_bytes + chunk.len() > self.capacity_bytes {
            self.stats.backpressure_events += 1;
            self.stats.bytes_dropped += chunk.len() as u64;
            trace!(
                chunk_len = chunk.len(),
                depth = self.depth_bytes,
                "fifo backpressure, chunk rejected"
            );
            return false;
        }

        self.depth_bytes += chunk.len();
        self.stats.bytes_written += chunk.len() as u64;
        if self.depth_bytes as u64 > self.stats.high_water_mark {
            self.stats.high_water_mark = self.depth_bytes as u64;
        }
        self.queue.push_back(chunk.to_vec());
        true
    }

    /// Pop the oldest chunk, if any.
    pub fn read(&mut self) -> Option<Vec<u8>> {
        let chunk = self.queue.pop_front()?;
        self.depth_bytes -= chunk.len();
        self.stats.bytes_read += chunk.len() as u64;
        Some(chunk)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.depth_bytes >= self.capacity_bytes
    }

    /// Current occupancy in bytes.
    #[inline]
    pub fn depth_bytes(&self) -> usize {
        self.depth_bytes
    }

    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Bytes a write could still accept.
    #[inline]
    pub fn available_bytes(&self) -> usize {
        self.capacity_bytes - self.depth_bytes
    }

    /// Occupancy as a fraction of capacity.
    #[inline]
    pub fn utilization(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        self.depth_bytes as f64 / self.capacity_bytes as f64
    }

    #[inline]
    pub fn stats(&self) -> &FifoStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = FifoStats::default();
    }
}

impl Default for ChunkFifo {
    fn default() -> Self {
        Self::new(DEFAULT_FIFO_CAPACITY)
    }
}
