//! # feedbook
//!
//! Ingest and matching core for an equity market-data feed: a bounded
//! ingress FIFO, a framing parser over a NASDAQ ITCH 5.0 subset, and a
//! two-sided price-level book with an order-id index.
//!
//! ## Design principles
//!
//! - **Single-writer**: one caller owns the engine; a producer only
//!   touches the ingress FIFO
//! - **O(1) mutations**: add, cancel, and execute splice arena-backed
//!   FIFO nodes through the order index
//! - **Never aborts**: malformed input is counted and skipped, full
//!   buffers reject writes, partial frames wait
//!
//! ## Architecture
//!
//! ```text
//! [Producer] --> [Chunk FIFO] --> [Parser + Reassembly] --> [Dispatch]
//!                                                               |
//!                                          [Order Index + Book] + [Observer]
//! ```

pub mod arena;
pub mod book;
pub mod book_side;
pub mod engine;
pub mod fifo;
pub mod index;
pub mod message;
pub mod parser;
pub mod price_level;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderNode, NULL_INDEX};
pub use book::{Book, MarketDepth};
pub use book_side::BookSide;
pub use engine::{AggressiveFill, Engine, EngineConfig, ErrorStats, EventCallback};
pub use fifo::{ChunkFifo, FifoStats, DEFAULT_FIFO_CAPACITY};
pub use index::{OrderEntry, OrderIndex};
pub use message::{EventKind, ItchMessage, OrderSnapshot, Side, Trade};
pub use parser::{parse_one, ParseOutcome, MAX_REASSEMBLY};
