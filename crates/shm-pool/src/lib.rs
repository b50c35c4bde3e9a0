//! Fixed-capacity FIFO pool of object offsets for memory shared between
//! processes.
//!
//! References handed out by the pool are byte offsets relative to the start
//! of a shared segment, never native pointers, so they stay meaningful in
//! every process that maps the segment. The pool cycles those offsets
//! through a ring buffer with strict FIFO order and a sacrificial slot that
//! keeps the empty and full states distinguishable.
//!
//! * [`SharedRegion`] – contiguous, aligned backing memory for pools hosted
//!   in-process.
//! * [`PoolLayout`] – byte placement of control block, offsets array, and
//!   optional payload block, plus the published sizing contract.
//! * [`ObjectPool`] – the per-attachment handle: init, allocate, free,
//!   count, and a forward walk over the queued offsets.
//! * [`PoolError`] – small error surface for layout validation and the
//!   full-queue rejection.
//!
//! The pool provides no internal synchronization; callers sharing a pool
//! across threads or processes must serialise every call themselves.

mod error;
mod layout;
mod pool;
mod region;

pub use error::{PoolError, PoolResult};
pub use layout::{
    empty_memory_size, full_memory_size, ByteRange, PoolLayout, HEADER_ALIGNMENT,
    MAX_COUNT_LIMIT, OFFSET_SIZE,
};
pub use pool::{ObjectPool, PoolHeader, QueuedOffsets};
pub use region::{RegionInit, SharedRegion};
