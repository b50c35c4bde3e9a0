//! Byte-level placement of a pool inside a shared segment.
//!
//! A pool occupies two (in the full sizing scheme, three) sub-ranges of one
//! contiguous region:
//!
//! ```text
//! +---------------------+---------------------------+---------------------+
//! | PoolHeader          | offsets: capacity × i64   | payload (full mode) |
//! +---------------------+---------------------------+---------------------+
//!                         capacity = max_count + 1    element_size bytes
//!                                                     × max_count objects
//! ```
//!
//! [`empty_memory_size`] and [`full_memory_size`] publish the sizing contract
//! for segment owners that place the offsets array (and payload block)
//! themselves; they size entries for `max_count` objects. [`PoolLayout`] is
//! the self-consistent placement path: it also accounts for the control block
//! and the extra ring position that keeps `head == tail` unambiguous, and it
//! hands [`crate::ObjectPool::init_full`] the payload offsets that match the
//! placement.

use crate::error::{PoolError, PoolResult};
use crate::pool::PoolHeader;
use std::mem;

/// Size in bytes of one offsets-array entry.
pub const OFFSET_SIZE: usize = mem::size_of::<i64>();

/// Alignment required of a region hosting a control block.
pub const HEADER_ALIGNMENT: usize = 8;

/// Upper bound on `max_count`; keeps `capacity = max_count + 1` and every
/// ring-index sum inside `u32`.
pub const MAX_COUNT_LIMIT: u32 = i32::MAX as u32 - 1;

/// Bytes an external segment owner must reserve for the offsets array of a
/// pool that starts empty (objects arrive later through `free`).
///
/// The element size does not participate; the parameter mirrors
/// [`full_memory_size`] so the two contracts stay interchangeable.
pub fn empty_memory_size(_element_size: u32, max_count: u32) -> u64 {
    OFFSET_SIZE as u64 * u64::from(max_count)
}

/// Bytes an external segment owner must reserve when the pool also carries
/// the payload storage for all `max_count` objects up front.
pub fn full_memory_size(element_size: u32, max_count: u32) -> u64 {
    (u64::from(element_size) + OFFSET_SIZE as u64) * u64::from(max_count)
}

/// Byte-range descriptor within a shared segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset in bytes from the start of the segment.
    pub offset: usize,
    /// Length in bytes of the range.
    pub len: usize,
}

impl ByteRange {
    /// One past the last byte of the range.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Computed placement of one pool inside a contiguous region.
#[derive(Clone, Copy, Debug)]
pub struct PoolLayout {
    max_count: u32,
    element_size: u32,
    header: ByteRange,
    offsets: ByteRange,
    payload: Option<ByteRange>,
}

impl PoolLayout {
    /// Layout for a pool that starts empty: control block plus offsets array.
    pub fn empty(max_count: u32) -> PoolResult<Self> {
        let (header, offsets) = Self::ring_ranges(max_count)?;
        Ok(Self {
            max_count,
            element_size: 0,
            header,
            offsets,
            payload: None,
        })
    }

    /// Layout for a pool that owns payload storage for `max_count` objects of
    /// `element_size` bytes, placed after the offsets array.
    pub fn full(element_size: u32, max_count: u32) -> PoolResult<Self> {
        if element_size == 0 {
            return Err(PoolError::InvalidElementSize {
                requested: element_size,
            });
        }

        let (header, offsets) = Self::ring_ranges(max_count)?;
        let payload_len = (element_size as usize)
            .checked_mul(max_count as usize)
            .ok_or(PoolError::InvalidElementSize {
                requested: element_size,
            })?;
        let payload = ByteRange {
            offset: offsets.end(),
            len: payload_len,
        };

        Ok(Self {
            max_count,
            element_size,
            header,
            offsets,
            payload: Some(payload),
        })
    }

    fn ring_ranges(max_count: u32) -> PoolResult<(ByteRange, ByteRange)> {
        if max_count == 0 || max_count > MAX_COUNT_LIMIT {
            return Err(PoolError::InvalidCount {
                requested: max_count,
                limit: MAX_COUNT_LIMIT,
            });
        }

        let capacity = max_count as usize + 1;
        let header = ByteRange {
            offset: 0,
            len: mem::size_of::<PoolHeader>(),
        };
        let entries_len =
            OFFSET_SIZE
                .checked_mul(capacity)
                .ok_or(PoolError::InvalidCount {
                    requested: max_count,
                    limit: MAX_COUNT_LIMIT,
                })?;
        let offsets = ByteRange {
            offset: header.end(),
            len: entries_len,
        };
        Ok((header, offsets))
    }

    /// Number of logical entries the pool can hold.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Number of addressable ring positions, `max_count + 1`.
    pub fn capacity(&self) -> u32 {
        self.max_count + 1
    }

    /// Element size recorded for the payload block; zero in the empty scheme.
    pub fn element_size(&self) -> u32 {
        self.element_size
    }

    /// Range hosting the control block.
    pub fn header(&self) -> ByteRange {
        self.header
    }

    /// Range hosting the offsets array (`capacity` entries).
    pub fn offsets(&self) -> ByteRange {
        self.offsets
    }

    /// Range hosting the payload block, when the layout carries one.
    pub fn payload(&self) -> Option<ByteRange> {
        self.payload
    }

    /// Offset of the first payload slot, suitable as the `first_offset`
    /// argument of [`crate::ObjectPool::init_full`] (with
    /// [`Self::element_size`] as the stride).
    pub fn payload_base(&self) -> Option<i64> {
        self.payload.map(|range| range.offset as i64)
    }

    /// Total bytes a region must provide to host this layout.
    pub fn total_size(&self) -> usize {
        match self.payload {
            Some(payload) => payload.end(),
            None => self.offsets.end(),
        }
    }
}
