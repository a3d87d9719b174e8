//! Arena allocator for order nodes.
//!
//! Pre-allocates a contiguous slab of nodes and hands out u32 handles
//! instead of pointers. A free list threaded through the `next` field
//! gives O(1) allocation and deallocation. The slab grows when the free
//! list runs dry, so allocation never fails mid-stream.

use std::fmt;

/// Sentinel value representing a null/invalid handle.
pub const NULL_INDEX: u32 = u32::MAX;

/// Handle into the arena - a "compressed pointer".
/// u32 halves the linkage footprint compared to 64-bit pointers.
pub type ArenaIndex = u32;

/// One resting order in a price level's FIFO.
///
/// Price and side are not stored here: the price level that owns the
/// node knows its price, and the order index records the side.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct OrderNode {
    /// External order ID (wire `order_id`)
    pub order_id: u64,

    /// Remaining quantity
    pub qty: u32,

    /// Handle of the next order at the same price level
    pub next: ArenaIndex,

    /// Handle of the previous order (enables O(1) cancel)
    pub prev: ArenaIndex,
}

// Keep the node compact: 8 + 4 + 4 + 4 = 20, padded to 24 by u64 alignment.
const _: () = assert!(
    std::mem::size_of::<OrderNode>() == 24,
    "OrderNode must be exactly 24 bytes"
);

impl OrderNode {
    #[inline]
    pub const fn empty() -> Self {
        Self {
            order_id: 0,
            qty: 0,
            next: NULL_INDEX,
            prev: NULL_INDEX,
        }
    }

    /// Reset the node for reuse when returning it to the free list.
    #[inline]
    pub fn reset(&mut self) {
        self.order_id = 0;
        self.qty = 0;
        self.next = NULL_INDEX;
        self.prev = NULL_INDEX;
    }
}

impl fmt::Debug for OrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderNode")
            .field("order_id", &self.order_id)
            .field("qty", &self.qty)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Node pool with O(1) allocation and deallocation.
///
/// The free list is threaded through the `next` field of unused nodes.
pub struct Arena {
    nodes: Vec<OrderNode>,

    /// Head of the free list
    free_head: ArenaIndex,

    /// Number of currently allocated nodes
    allocated_count: u32,
}

impl Arena {
    /// Create an arena with `capacity` nodes pre-allocated.
    ///
    /// # Panics
    /// Panics if capacity is not below `NULL_INDEX`.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity < NULL_INDEX, "capacity must be below NULL_INDEX");

        let mut nodes = vec![OrderNode::empty(); capacity as usize];

        // Thread the free list through all nodes.
        for i in 0..capacity.saturating_sub(1) {
            nodes[i as usize].next = i + 1;
        }
        if capacity > 0 {
            nodes[(capacity - 1) as usize].next = NULL_INDEX;
        }

        Self {
            nodes,
            free_head: if capacity > 0 { 0 } else { NULL_INDEX },
            allocated_count: 0,
        }
    }

    /// Allocate a node, growing the slab if the free list is empty.
    #[inline]
    pub fn alloc(&mut self) -> ArenaIndex {
        let index = if self.free_head != NULL_INDEX {
            let index = self.free_head;
            self.free_head = self.nodes[index as usize].next;
            self.nodes[index as usize].next = NULL_INDEX;
            self.nodes[index as usize].prev = NULL_INDEX;
            index
        } else {
            let index = self.nodes.len() as u32;
            assert!(index < NULL_INDEX, "arena handle space exhausted");
            self.nodes.push(OrderNode::empty());
            index
        };
        self.allocated_count += 1;
        index
    }

    /// Return a node to the free list.
    ///
    /// The caller must ensure the handle was allocated and not already
    /// freed; there is no double-free protection beyond debug asserts.
    #[inline]
    pub fn free(&mut self, index: ArenaIndex) {
        debug_assert!((index as usize) < self.nodes.len(), "handle out of bounds");
        debug_assert!(self.allocated_count > 0, "double free");

        self.nodes[index as usize].reset();
        self.nodes[index as usize].next = self.free_head;
        self.free_head = index;
        self.allocated_count -= 1;
    }

    #[inline]
    pub fn get(&self, index: ArenaIndex) -> &OrderNode {
        debug_assert!((index as usize) < self.nodes.len(), "handle out of bounds");
        &self.nodes[index as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> &mut OrderNode {
        debug_assert!((index as usize) < self.nodes.len(), "handle out of bounds");
        &mut self.nodes[index as usize]
    }

    /// Number of currently allocated nodes.
    #[inline]
    pub fn allocated(&self) -> u32 {
        self.allocated_count
    }

    /// Current slab capacity in nodes.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.nodes.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocated_count == 0
    }

    /// Pre-fault the slab pages so the first allocations do not stall
    /// on page faults.
    pub fn warm_up(&mut self) {
        for node in &mut self.nodes {
            let qty = node.qty;
            unsafe {
                std::ptr::write_volatile(&mut node.qty, qty);
            }
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated_count)
            .field("free_head", &self.free_head)
            .finish()
    }
}
