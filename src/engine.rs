//! Engine - drains the ingress FIFO, reassembles frames, dispatches.
//!
//! Owns every piece of core state: the chunk FIFO, the reassembly
//! buffer, the node arena, the two-sided book, the order index, and the
//! error counters. Single-writer: one caller drives `process()` and the
//! host APIs; a producer feeds `write_chunk` between calls.

use tracing::{trace, warn};

use crate::arena::Arena;
use crate::book::{Book, MarketDepth};
use crate::fifo::{ChunkFifo, FifoStats, DEFAULT_FIFO_CAPACITY};
use crate::index::{OrderEntry, OrderIndex};
use crate::message::{EventKind, ItchMessage, OrderSnapshot, Side, Trade};
use crate::parser::{self, ParseOutcome, MAX_REASSEMBLY};

/// Observer invoked after each dispatched mutation, in dispatch order.
///
/// Mutating methods take `&mut Engine`, which the stored callback can
/// never hold, so the observer cannot re-enter the engine.
pub type EventCallback = Box<dyn FnMut(EventKind, &OrderSnapshot)>;

/// Engine sizing knobs.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Ingress FIFO depth in bytes
    pub fifo_capacity_bytes: usize,
    /// Nodes to pre-allocate in the arena
    pub arena_capacity: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fifo_capacity_bytes: DEFAULT_FIFO_CAPACITY,
            arena_capacity: 4096,
        }
    }
}

/// Monotone error counters. Reset only via
/// [`Engine::reset_error_stats`]; no error aborts the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorStats {
    /// First byte of the buffer was not a recognized type
    pub unknown_message_types: u64,
    /// Reassembly buffer exceeded its bound and was cleared
    pub buffer_overflows: u64,
    /// Parse loop stopped on a partial frame
    pub incomplete_messages: u64,
    /// Dropped mutations: duplicate add, cancel/execute/replace of a
    /// missing or inactive id, overfill execute
    pub invalid_operations: u64,
}

/// Result of an aggressive take: total filled plus one trade per maker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggressiveFill {
    pub filled: u64,
    pub trades: Vec<Trade>,
}

/// The ingest and matching core.
pub struct Engine {
    fifo: ChunkFifo,
    /// Partial-frame bytes carried between `process()` calls
    buffer: Vec<u8>,
    arena: Arena,
    book: Book,
    index: OrderIndex,
    errors: ErrorStats,
    callback: Option<EventCallback>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            fifo: ChunkFifo::new(config.fifo_capacity_bytes),
            buffer: Vec::with_capacity(MAX_REASSEMBLY),
            arena: Arena::new(config.arena_capacity),
            book: Book::new(),
            index: OrderIndex::with_capacity(config.arena_capacity as usize),
            errors: ErrorStats::default(),
            callback: None,
        }
    }

    /// Pre-fault the arena pages before the first burst.
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    // ------------------------------------------------------------------
    // Producer side
    // ------------------------------------------------------------------

    /// Offer a chunk of feed bytes. `false` means the FIFO is full and
    /// the chunk was dropped; the producer retries after a `process()`.
    pub fn write_chunk(&mut self, bytes: &[u8]) -> bool {
        self.fifo.write(bytes)
    }

    // ------------------------------------------------------------------
    // Consumer side
    // ------------------------------------------------------------------

    /// Drain the FIFO and dispatch every complete message available.
    ///
    /// Idempotent when no new bytes have arrived; never blocks.
    pub fn process(&mut self) {
        while let Some(chunk) = self.fifo.read() {
            self.buffer.extend_from_slice(&chunk);
        }

        // Growth past the bound means a truncated frame, a link glitch,
        // or hostile input; discarding beats scanning garbage.
        if self.buffer.len() > MAX_REASSEMBLY {
            warn!(
                len = self.buffer.len(),
                max = MAX_REASSEMBLY,
                "reassembly buffer overflow, clearing"
            );
            self.buffer.clear();
            self.errors.buffer_overflows += 1;
            return;
        }

        loop {
            match parser::parse_one(&self.buffer) {
                ParseOutcome::Complete {
                    message,
                    bytes_consumed,
                } => {
                    self.dispatch(message);
                    self.buffer.drain(..bytes_consumed);
                }
                ParseOutcome::UnknownType(byte) => {
                    warn!(byte, "unknown message type, resyncing");
                    self.errors.unknown_message_types += 1;
                    self.buffer.drain(..1);
                }
                ParseOutcome::NeedMore => {
                    self.errors.incomplete_messages += 1;
                    break;
                }
                ParseOutcome::Empty => break,
            }
        }
    }

    fn dispatch(&mut self, message: ItchMessage) {
        match message {
            ItchMessage::Add {
                timestamp,
                order_id,
                side,
                quantity,
                price,
            } => {
                self.add_order(order_id, side, price, quantity, timestamp);
            }
            // Every cancel is a full cancel; the wire quantity is
            // accepted but not acted on.
            ItchMessage::Cancel { order_id, .. } => {
                self.cancel_order(order_id);
            }
            ItchMessage::Execute { order_id, quantity } => {
                self.execute_order(order_id, quantity);
            }
            ItchMessage::Replace {
                original_order_id,
                new_order_id,
                quantity,
                price,
                ..
            } => {
                self.replace_order(original_order_id, new_order_id, price, quantity);
            }
        }
    }

    // ------------------------------------------------------------------
    // Host mutation API (the wire dispatcher reuses these)
    // ------------------------------------------------------------------

    /// Rest a new order. Fails on a duplicate id or zero quantity.
    pub fn add_order(
        &mut self,
        order_id: u64,
        side: Side,
        price: u32,
        quantity: u32,
        timestamp: u64,
    ) -> bool {
        if quantity == 0 || self.index.contains(order_id) {
            trace!(order_id, "add dropped");
            self.errors.invalid_operations += 1;
            return false;
        }

        let node = self.arena.alloc();
        {
            let n = self.arena.get_mut(node);
            n.order_id = order_id;
            n.qty = quantity;
        }
        self.book.insert_order(&mut self.arena, side, node, price as u64);

        let entry = OrderEntry {
            side,
            price,
            quantity,
            timestamp,
            active: true,
            node,
        };
        self.index.insert(order_id, entry);

        self.emit(EventKind::Add, &entry.snapshot(order_id));
        true
    }

    /// Remove an order entirely, whatever quantity remains.
    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        let Some(entry) = self.index.get(order_id).copied() else {
            trace!(order_id, "cancel of unknown order");
            self.errors.invalid_operations += 1;
            return false;
        };

        self.book
            .remove_order(&mut self.arena, entry.side, entry.node, entry.price as u64);
        self.arena.free(entry.node);

        // The observer sees the order already inactive, quantity as it
        // stood, before the record is erased.
        let mut snapshot = entry.snapshot(order_id);
        snapshot.active = false;
        self.emit(EventKind::Cancel, &snapshot);

        self.index.remove(order_id);
        true
    }

    /// Consume `quantity` from a resting order; erases it on full fill.
    pub fn execute_order(&mut self, order_id: u64, quantity: u32) -> bool {
        let Some(entry) = self.index.get_mut(order_id) else {
            trace!(order_id, "execute of unknown order");
            self.errors.invalid_operations += 1;
            return false;
        };
        if !entry.active || quantity > entry.quantity {
            trace!(order_id, quantity, "execute dropped");
            self.errors.invalid_operations += 1;
            return false;
        }

        entry.quantity -= quantity;
        let filled = entry.quantity == 0;
        if filled {
            entry.active = false;
        }
        let entry = *entry;

        let removed =
            self.book
                .reduce_order(&mut self.arena, entry.side, entry.node, entry.price as u64, quantity);
        if removed {
            self.arena.free(entry.node);
        }
        debug_assert_eq!(removed, filled);

        // Observer runs before erasure so it can read the final state.
        self.emit(EventKind::Execute, &entry.snapshot(order_id));

        if filled {
            self.index.remove(order_id);
        }
        true
    }

    /// Atomic cancel-then-add keeping the original side and timestamp.
    ///
    /// If the new id already exists the cancel stands, nothing is
    /// inserted, and the call reports failure: the feed has already
    /// retired the original id by the time the replace is published.
    pub fn replace_order(
        &mut self,
        original_order_id: u64,
        new_order_id: u64,
        new_price: u32,
        new_quantity: u32,
    ) -> bool {
        let Some(entry) = self.index.get(original_order_id).copied() else {
            trace!(original_order_id, "replace of unknown order");
            self.errors.invalid_operations += 1;
            return false;
        };
        if !entry.active || new_quantity == 0 {
            trace!(original_order_id, new_order_id, "replace dropped");
            self.errors.invalid_operations += 1;
            return false;
        }

        let side = entry.side;
        let timestamp = entry.timestamp;

        // Full cancel of the original; no observer event for this half.
        self.book
            .remove_order(&mut self.arena, side, entry.node, entry.price as u64);
        self.arena.free(entry.node);
        self.index.remove(original_order_id);

        if self.index.contains(new_order_id) {
            warn!(original_order_id, new_order_id, "replace id collision, original cancelled");
            return false;
        }

        let node = self.arena.alloc();
        {
            let n = self.arena.get_mut(node);
            n.order_id = new_order_id;
            n.qty = new_quantity;
        }
        self.book
            .insert_order(&mut self.arena, side, node, new_price as u64);

        let new_entry = OrderEntry {
            side,
            price: new_price,
            quantity: new_quantity,
            timestamp,
            active: true,
            node,
        };
        self.index.insert(new_order_id, new_entry);

        self.emit(EventKind::Replace, &new_entry.snapshot(new_order_id));
        true
    }

    /// Fill an aggressive `taking_side` order against the opposite
    /// side, price priority then time priority. Makers touched are
    /// decremented or erased; no observer events fire - the trade
    /// vector is the sole output.
    pub fn match_aggressive(&mut self, taking_side: Side, quantity: u64) -> AggressiveFill {
        let mut trades = Vec::new();
        let filled = self
            .book
            .match_aggressive(&mut self.arena, taking_side, quantity, &mut trades);

        // The book already unlinked and freed fully consumed makers;
        // bring the index into line. A maker appears at most once.
        for trade in &trades {
            if let Some(entry) = self.index.get_mut(trade.maker_order_id) {
                entry.quantity -= trade.quantity as u32;
                if entry.quantity == 0 {
                    self.index.remove(trade.maker_order_id);
                }
            }
        }

        AggressiveFill { filled, trades }
    }

    // ------------------------------------------------------------------
    // Observer
    // ------------------------------------------------------------------

    /// Install the observer. Replaces any previous one.
    pub fn set_event_callback(&mut self, callback: impl FnMut(EventKind, &OrderSnapshot) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_event_callback(&mut self) {
        self.callback = None;
    }

    #[inline]
    fn emit(&mut self, kind: EventKind, snapshot: &OrderSnapshot) {
        if let Some(cb) = self.callback.as_mut() {
            cb(kind, snapshot);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Highest bid `(price, aggregate_qty)`.
    #[inline]
    pub fn best_bid(&self) -> Option<(u64, u64)> {
        self.book.best_bid()
    }

    /// Lowest ask `(price, aggregate_qty)`.
    #[inline]
    pub fn best_ask(&self) -> Option<(u64, u64)> {
        self.book.best_ask()
    }

    /// `best_ask - best_bid`; `None` for an empty, locked, or crossed
    /// book.
    #[inline]
    pub fn spread(&self) -> Option<u64> {
        self.book.spread()
    }

    /// Top-k levels per side.
    #[inline]
    pub fn depth(&self, k: usize) -> MarketDepth {
        self.book.depth(k)
    }

    /// Snapshot of a live order; `None` if unknown or inactive.
    pub fn find_order(&self, order_id: u64) -> Option<OrderSnapshot> {
        let entry = self.index.get(order_id)?;
        if !entry.active {
            return None;
        }
        Some(entry.snapshot(order_id))
    }

    /// Orders in the index, active or not.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn active_order_count(&self) -> usize {
        self.index.active_count()
    }

    #[inline]
    pub fn error_stats(&self) -> &ErrorStats {
        &self.errors
    }

    pub fn reset_error_stats(&mut self) {
        self.errors = ErrorStats::default();
    }

    #[inline]
    pub fn fifo_stats(&self) -> &FifoStats {
        self.fifo.stats()
    }

    pub fn reset_fifo_stats(&mut self) {
        self.fifo.reset_stats();
    }

    /// Current FIFO occupancy in bytes.
    #[inline]
    pub fn fifo_depth_bytes(&self) -> usize {
        self.fifo.depth_bytes()
    }

    /// FIFO occupancy as a fraction of capacity.
    #[inline]
    pub fn fifo_utilization(&self) -> f64 {
        self.fifo.utilization()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("orders", &self.index.len())
            .field("best_bid", &self.book.best_bid())
            .field("best_ask", &self.book.best_ask())
            .field("fifo_depth", &self.fifo.depth_bytes())
            .field("reassembly_len", &self.buffer.len())
            .field("errors", &self.errors)
            .finish()
    }
}
