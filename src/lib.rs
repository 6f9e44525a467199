//! Lock-free and lockless data-plane primitives.
//!
//! Three independent building blocks for high-throughput packet processing:
//!
//! - [`lpm`]: a DIR-24-8 IPv4 longest-prefix-match routing table with a
//!   single writer and many lockless readers.
//! - [`heap`]: a region-based allocator with boundary-tagged coalescing
//!   free lists, used to carve fixed-lifetime buffers out of a single
//!   preallocated span.
//! - [`ring`]: a bounded, power-of-two FIFO supporting single or multi
//!   producer/consumer access via a lock-free reservation protocol.

pub mod error;
pub mod heap;
pub mod lpm;
pub mod ring;

pub use error::Error;
pub use heap::Heap;
pub use lpm::{DepthInfo, Lpm, LpmConfig};
pub use ring::{Ring, RingFlags};
