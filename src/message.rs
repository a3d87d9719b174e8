//! Message and event types shared across the engine.
//!
//! Wire messages are decoded into [`ItchMessage`] by the parser; the
//! engine republishes order state to the observer as [`OrderSnapshot`]s
//! tagged with an [`EventKind`].

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Normalize the wire side byte. `B`/`b` is a bid; anything else
    /// sells. No raw side byte travels past the parser.
    #[inline]
    pub const fn from_wire(byte: u8) -> Self {
        match byte {
            b'B' | b'b' => Side::Bid,
            _ => Side::Ask,
        }
    }
}

/// A decoded ITCH message.
///
/// Fields the engine ignores (stock symbol, match number) are dropped at
/// decode time; fields it accepts but does not act on (`cancelled_qty`)
/// are carried through so the dispatch layer owns that decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItchMessage {
    /// `A` - Add Order (No MPID Attribution)
    Add {
        timestamp: u64,
        order_id: u64,
        side: Side,
        quantity: u32,
        price: u32,
    },
    /// `X` - Order Cancel
    Cancel {
        order_id: u64,
        /// Decoded but treated as a full cancel by dispatch.
        cancelled_qty: u32,
    },
    /// `E` - Order Executed
    Execute { order_id: u64, quantity: u32 },
    /// `U` - Order Replace
    Replace {
        timestamp: u64,
        original_order_id: u64,
        new_order_id: u64,
        quantity: u32,
        price: u32,
    },
}

/// Event tag passed to the observer, one per dispatched mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    Add,
    Cancel,
    Execute,
    Replace,
}

impl EventKind {
    /// The ITCH type byte this event corresponds to.
    #[inline]
    pub const fn as_char(self) -> char {
        match self {
            EventKind::Add => 'A',
            EventKind::Cancel => 'X',
            EventKind::Execute => 'E',
            EventKind::Replace => 'U',
        }
    }
}

/// Point-in-time view of one order, as shown to the observer and
/// returned by `find_order`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub order_id: u64,
    /// Fixed-point ticks, 4 implied decimals
    pub price: u32,
    pub quantity: u32,
    pub side: Side,
    /// Origin timestamp in nanoseconds, opaque to the engine
    pub timestamp: u64,
    pub active: bool,
}

/// One fill produced by an aggressive match: maker order, traded
/// quantity, trade price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trade {
    pub maker_order_id: u64,
    pub quantity: u64,
    pub price: u64,
}
