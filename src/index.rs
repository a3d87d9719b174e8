//! Order-id index: the O(1) lookup half of the book.
//!
//! One entry per live order, holding the side and price needed to reach
//! the owning level, the remaining quantity, the origin timestamp, and
//! the arena handle of the resting node. Cancel, execute, and replace
//! all start here.

use rustc_hash::FxHashMap;

use crate::arena::ArenaIndex;
use crate::message::{OrderSnapshot, Side};

/// Index record for one live order.
#[derive(Clone, Copy, Debug)]
pub struct OrderEntry {
    pub side: Side,
    /// Fixed-point ticks, 4 implied decimals
    pub price: u32,
    /// Remaining quantity
    pub quantity: u32,
    /// Origin timestamp, opaque to the engine
    pub timestamp: u64,
    pub active: bool,
    /// Arena handle of the resting FIFO node
    pub node: ArenaIndex,
}

impl OrderEntry {
    pub fn snapshot(&self, order_id: u64) -> OrderSnapshot {
        OrderSnapshot {
            order_id,
            price: self.price,
            quantity: self.quantity,
            side: self.side,
            timestamp: self.timestamp,
            active: self.active,
        }
    }
}

/// Mapping from order id to its index record.
#[derive(Debug, Default)]
pub struct OrderIndex {
    orders: FxHashMap<u64, OrderEntry>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self {
            orders: FxHashMap::default(),
        }
    }

    pub fn with_capacity(orders: usize) -> Self {
        Self {
            orders: FxHashMap::with_capacity_and_hasher(orders, Default::default()),
        }
    }

    /// Insert a record for a new order id. Returns `false` and leaves
    /// the index untouched if the id is already present.
    pub fn insert(&mut self, order_id: u64, entry: OrderEntry) -> bool {
        match self.orders.entry(order_id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    #[inline]
    pub fn get(&self, order_id: u64) -> Option<&OrderEntry> {
        self.orders.get(&order_id)
    }

    #[inline]
    pub fn get_mut(&mut self, order_id: u64) -> Option<&mut OrderEntry> {
        self.orders.get_mut(&order_id)
    }

    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    #[inline]
    pub fn remove(&mut self, order_id: u64) -> Option<OrderEntry> {
        self.orders.remove(&order_id)
    }

    /// Total records, active or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Records still marked active.
    pub fn active_count(&self) -> usize {
        self.orders.values().filter(|e| e.active).count()
    }
}
