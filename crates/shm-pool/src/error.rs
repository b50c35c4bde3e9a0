//! Error surface for the pool crate.
//!
//! The surface is intentionally small: shape validation when a layout is
//! computed or a region is carved, allocation failures from the backing
//! memory, and the full-queue rejection from [`crate::ObjectPool::free`].
//! An empty queue is not an error; `allocate` and the iteration calls report
//! it as `None`.

use thiserror::Error;

/// Convenience result alias for fallible pool operations.
pub type PoolResult<T, E = PoolError> = Result<T, E>;

/// Errors surfaced by pool construction and mutation.
#[derive(Debug, Error)]
pub enum PoolError {
    /// `free` was called while the queue already held `max_count` entries.
    /// The pool state is unchanged.
    #[error("pool already holds {max_count} queued offsets")]
    Full { max_count: u32 },

    /// Requested entry count is zero or too large for the ring arithmetic.
    #[error("pool entry count {requested} must be in 1..={limit}")]
    InvalidCount { requested: u32, limit: u32 },

    /// Element size is zero or overflows the payload block arithmetic.
    #[error("element size {requested} cannot back a payload block")]
    InvalidElementSize { requested: u32 },

    /// A caller-supplied region does not cover the computed layout.
    #[error("region of {actual} bytes cannot hold a pool layout of {required} bytes")]
    RegionTooSmall { required: usize, actual: usize },

    /// A caller-supplied region is not aligned for the control block.
    #[error("region base must be {required}-byte aligned")]
    Misaligned { required: usize },

    /// Allocation of a backing region failed for the given size/alignment pair.
    #[error("failed to allocate backing region of {size} bytes aligned to {alignment}")]
    AllocationFailed { size: usize, alignment: usize },
}
