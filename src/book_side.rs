//! One side of the book: a price-ordered map of FIFO levels.
//!
//! Bids treat the maximum price as best, asks the minimum. Levels are
//! created lazily on the first resting order at a price and erased the
//! moment their queue empties, so an empty level is never observable.

use std::collections::BTreeMap;

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::message::{Side, Trade};
use crate::price_level::PriceLevel;

/// Price-ordered levels for a single side.
#[derive(Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<u64, PriceLevel>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of live price levels.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn get_level(&self, price: u64) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Append a resting order at the tail of its price's FIFO,
    /// creating the level if absent. The node must already carry its
    /// order id and quantity.
    pub fn insert_order(&mut self, arena: &mut Arena, index: ArenaIndex, price: u64) {
        let level = self.levels.entry(price).or_insert_with(PriceLevel::new);
        level.push_back(arena, index);
    }

    /// Unlink a resting order from its level, erasing the level if it
    /// empties. The node is not freed; the caller owns that.
    pub fn remove_order(&mut self, arena: &mut Arena, index: ArenaIndex, price: u64) {
        let Some(level) = self.levels.get_mut(&price) else {
            return;
        };
        if level.remove(arena, index) {
            self.levels.remove(&price);
        }
    }

    /// Decrement a resting order's quantity in place.
    ///
    /// Returns `true` if the order reached zero and was unlinked; the
    /// caller must then free the node.
    pub fn reduce_order(&mut self, arena: &mut Arena, index: ArenaIndex, price: u64, by: u32) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };

        let node = arena.get_mut(index);
        debug_assert!(node.qty >= by);
        node.qty -= by;
        let emptied = node.qty == 0;
        level.subtract_qty(by);

        if emptied {
            // subtract_qty already took the traded part; remove() takes
            // the node's residual qty, which is now zero.
            if level.remove(arena, index) {
                self.levels.remove(&price);
            }
        }
        emptied
    }

    /// Best price and its aggregate quantity, or `None` if empty.
    pub fn best(&self) -> Option<(u64, u64)> {
        let (&price, level) = match self.side {
            Side::Bid => self.levels.last_key_value()?,
            Side::Ask => self.levels.first_key_value()?,
        };
        Some((price, level.total_qty))
    }

    /// Top-k `(price, aggregate_qty)` pairs, best price first:
    /// descending for bids, ascending for asks.
    pub fn top_k(&self, k: usize) -> Vec<(u64, u64)> {
        let mut out = Vec::with_capacity(k.min(self.levels.len()));
        match self.side {
            Side::Bid => {
                for (&price, level) in self.levels.iter().rev().take(k) {
                    out.push((price, level.total_qty));
                }
            }
            Side::Ask => {
                for (&price, level) in self.levels.iter().take(k) {
                    out.push((price, level.total_qty));
                }
            }
        }
        out
    }

    /// Consume liquidity from this side's best price outward, head of
    /// each FIFO first. Fully consumed nodes are unlinked and freed;
    /// emptied levels are erased. Pushes one [`Trade`] per touched
    /// maker and returns the total quantity filled.
    pub fn match_at_best(
        &mut self,
        arena: &mut Arena,
        mut incoming_qty: u64,
        trades: &mut Vec<Trade>,
    ) -> u64 {
        let mut filled = 0u64;

        while incoming_qty > 0 {
            let Some((&price, level)) = (match self.side {
                Side::Bid => self.levels.iter_mut().next_back(),
                Side::Ask => self.levels.iter_mut().next(),
            }) else {
                break;
            };

            while incoming_qty > 0 {
                let head = level.peek_head();
                if head == NULL_INDEX {
                    break;
                }

                let node = arena.get(head);
                let maker_order_id = node.order_id;
                let node_qty = node.qty as u64;
                let trade_qty = node_qty.min(incoming_qty);

                trades.push(Trade {
                    maker_order_id,
                    quantity: trade_qty,
                    price,
                });

                incoming_qty -= trade_qty;
                filled += trade_qty;

                if trade_qty == node_qty {
                    level.pop_front(arena);
                    arena.free(head);
                } else {
                    arena.get_mut(head).qty -= trade_qty as u32;
                    level.subtract_qty(trade_qty as u32);
                    break;
                }
            }

            let emptied = level.is_empty();
            if emptied {
                self.levels.remove(&price);
            } else {
                // Stopped on a partially filled head: the taker is done.
                break;
            }
        }

        filled
    }
}
