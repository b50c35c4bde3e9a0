//! Fixed-capacity FIFO queue of object offsets in caller-managed memory.
//!
//! Layout of the state the handle binds to:
//!
//! ```text
//! +--------------------+--------------------------------------+
//! | PoolHeader (24 B)  | offsets array: capacity × i64        |
//! +--------------------+--------------------------------------+
//!   capacity = max_count + 1 ring positions; the extra position
//!   keeps `head == tail` unambiguous ("empty", never "full").
//! ```
//!
//! Every value handed out is a byte offset into the segment's object storage,
//! never a pointer, so a reference minted by one process resolves correctly
//! in every other mapping of the same segment. The handle itself owns
//! nothing: the queue lives in the control block and offsets array and
//! persists across handle creations.
//!
//! The pool performs **no internal synchronization**. `allocate`, `free`,
//! and the iteration calls assume the caller holds whatever cross-process or
//! cross-thread exclusion guards the segment; violating that contract is a
//! silent data race, not a reported error. Iteration additionally assumes no
//! interleaved mutation for the duration of the walk.

use crate::error::{PoolError, PoolResult};
use crate::layout::{PoolLayout, HEADER_ALIGNMENT};
use crate::region::SharedRegion;
use log::{debug, trace};
use std::ptr::NonNull;

#[cfg(debug_assertions)]
const POOL_MAGIC: u64 = 0x4F46_4653_504F_4F4C; // "OFFSPOOL"
#[cfg(not(debug_assertions))]
const POOL_MAGIC: u64 = 0;

/// Control block describing the logical state of one ring.
///
/// Lives in shared memory at a location chosen by the segment owner. A block
/// written by [`PoolHeader::new`] (directly or through
/// [`ObjectPool::carve`]) is ready for binding from any process that maps
/// the segment.
#[repr(C, align(8))]
#[derive(Debug)]
pub struct PoolHeader {
    capacity: u32,
    head: u32,
    tail: u32,
    pad: u32,
    magic: u64,
    reserved: u64,
}

impl PoolHeader {
    /// Fresh control block addressing `capacity` ring positions, with an
    /// empty queue.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            head: 0,
            tail: 0,
            pad: 0,
            magic: POOL_MAGIC,
            reserved: 0,
        }
    }

    /// Number of addressable ring positions, `max_count + 1`.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Per-attachment handle for a pool living in caller-managed memory.
///
/// One handle per attaching thread or process; the handle carries only the
/// two bindings and a transient iteration cursor, and owns no resources.
/// Dropping it releases nothing and leaves the queue intact.
#[derive(Debug)]
pub struct ObjectPool {
    header: NonNull<PoolHeader>,
    offsets: NonNull<i64>,
    cursor: Option<u32>,
}

impl ObjectPool {
    /// Binds a handle to an existing control block and offsets array.
    ///
    /// No validation is performed; rebinding is done by calling
    /// [`ObjectPool::rebind`] or constructing a fresh handle.
    ///
    /// # Safety
    ///
    /// The caller must guarantee, for the whole lifetime of the handle:
    ///
    /// * `header` points to a live, initialised `PoolHeader`;
    /// * `offsets` points to an array of at least `header.capacity` `i64`
    ///   entries;
    /// * no other handle (in this or any other process) mutates the pool
    ///   while this handle is used, unless the caller serialises all access
    ///   externally.
    pub unsafe fn bind(header: NonNull<PoolHeader>, offsets: NonNull<i64>) -> Self {
        Self {
            header,
            offsets,
            cursor: None,
        }
    }

    /// Points an existing handle at a different pool and clears the
    /// iteration cursor.
    ///
    /// # Safety
    ///
    /// Same contract as [`ObjectPool::bind`].
    pub unsafe fn rebind(&mut self, header: NonNull<PoolHeader>, offsets: NonNull<i64>) {
        self.header = header;
        self.offsets = offsets;
        self.cursor = None;
    }

    /// Writes a fresh control block into `region` according to `layout` and
    /// binds a handle to it.
    ///
    /// This is the safe construction path for regions this process owns; the
    /// resulting queue is empty. Handles in other processes attach to the
    /// same state via [`ObjectPool::bind`].
    pub fn carve(region: &mut SharedRegion, layout: &PoolLayout) -> PoolResult<Self> {
        if region.len() < layout.total_size() {
            return Err(PoolError::RegionTooSmall {
                required: layout.total_size(),
                actual: region.len(),
            });
        }
        let base = region.as_mut_ptr();
        if base as usize % HEADER_ALIGNMENT != 0 {
            return Err(PoolError::Misaligned {
                required: HEADER_ALIGNMENT,
            });
        }

        debug!(
            "pool::carve: capacity={} total_size={}",
            layout.capacity(),
            layout.total_size()
        );

        // SAFETY: the region covers `layout.total_size()` bytes (checked
        // above), the header and offsets ranges are disjoint and 8-byte
        // aligned relative to the 8-byte aligned base.
        unsafe {
            let header = base.add(layout.header().offset).cast::<PoolHeader>();
            header.write(PoolHeader::new(layout.capacity()));
            let offsets = base.add(layout.offsets().offset).cast::<i64>();
            Ok(Self::bind(
                NonNull::new_unchecked(header),
                NonNull::new_unchecked(offsets),
            ))
        }
    }

    /// Resets the queue to zero entries.
    ///
    /// Offsets-array contents are left untouched; positions become
    /// meaningful again once populated via [`ObjectPool::free`]. Expected to
    /// run once per pool lifetime, before concurrent traffic begins.
    pub fn init_empty(&mut self) {
        let capacity = self.header().capacity;
        debug!("pool::init_empty: capacity={capacity}");
        let header = self.header_mut();
        header.head = 0;
        header.tail = 0;
        self.cursor = None;
    }

    /// Populates the queue with all `max_count` offsets, ascending from
    /// `first_offset` in steps of `stride`.
    ///
    /// `(0, 1)` yields the bare index sequence `0, 1, …, max_count - 1`;
    /// `(layout.payload_base(), layout.element_size())` yields the byte
    /// offsets of pre-allocated payload slots. Expected to run once per pool
    /// lifetime, before concurrent traffic begins.
    pub fn init_full(&mut self, first_offset: i64, stride: i64) {
        let capacity = self.header().capacity;
        let max_count = capacity - 1;
        debug!("pool::init_full: max_count={max_count} first_offset={first_offset} stride={stride}");
        for pos in 0..max_count {
            self.set_slot(pos, first_offset + stride * i64::from(pos));
        }
        let header = self.header_mut();
        header.head = 0;
        header.tail = max_count;
        self.cursor = None;
    }

    /// Removes and returns the oldest queued offset.
    ///
    /// Returns `None` without mutating anything when the queue is empty;
    /// callers treat that as "no object currently available".
    pub fn allocate(&mut self) -> Option<i64> {
        let (head, tail, capacity) = {
            let header = self.header();
            (header.head, header.tail, header.capacity)
        };

        if head == tail {
            trace!("pool::allocate: queue empty");
            return None;
        }

        let offset = self.slot(head);
        self.header_mut().head = (head + 1) % capacity;
        Some(offset)
    }

    /// Queues `offset` behind every offset already queued.
    ///
    /// Fails with [`PoolError::Full`], mutating nothing, when the queue
    /// already holds `max_count` entries; queueing more would make
    /// `head == tail` falsely signal empty. The offset's provenance is not
    /// validated; callers must only return offsets they legitimately hold.
    pub fn free(&mut self, offset: i64) -> PoolResult<()> {
        let (head, tail, capacity) = {
            let header = self.header();
            (header.head, header.tail, header.capacity)
        };

        let next_tail = (tail + 1) % capacity;
        if next_tail == head {
            let max_count = capacity - 1;
            trace!("pool::free: queue full (max_count={max_count})");
            return Err(PoolError::Full { max_count });
        }

        self.set_slot(tail, offset);
        self.header_mut().tail = next_tail;
        Ok(())
    }

    /// Number of currently queued offsets, in `[0, max_count]`.
    pub fn len(&self) -> u32 {
        let header = self.header();
        let (head, tail, capacity) = (
            u64::from(header.head),
            u64::from(header.tail),
            u64::from(header.capacity),
        );
        ((tail + capacity - head) % capacity) as u32
    }

    /// Returns true when no offsets are queued.
    pub fn is_empty(&self) -> bool {
        let header = self.header();
        header.head == header.tail
    }

    /// Number of addressable ring positions, `max_count + 1`.
    pub fn capacity(&self) -> u32 {
        self.header().capacity
    }

    /// Number of logical entries the pool can hold.
    pub fn max_count(&self) -> u32 {
        self.header().capacity - 1
    }

    /// Starts a forward walk over the queued offsets and returns the oldest
    /// one, or `None` (and no active walk) when the queue is empty.
    ///
    /// The walk reads live shared state without removing anything; no
    /// `allocate`/`free` may run against the pool until the walk ends.
    pub fn first(&mut self) -> Option<i64> {
        let (head, tail) = {
            let header = self.header();
            (header.head, header.tail)
        };

        if head == tail {
            self.cursor = None;
            return None;
        }
        self.cursor = Some(head);
        Some(self.slot(head))
    }

    /// Returns the next queued offset of the walk started by
    /// [`ObjectPool::first`], or `None` when no walk is active or the walk
    /// just passed the newest entry (the cursor is cleared on that call).
    pub fn next(&mut self) -> Option<i64> {
        let cursor = self.cursor?;
        let (tail, capacity) = {
            let header = self.header();
            (header.tail, header.capacity)
        };

        let pos = (cursor + 1) % capacity;
        if pos == tail {
            self.cursor = None;
            return None;
        }
        self.cursor = Some(pos);
        Some(self.slot(pos))
    }

    /// Iterator adapter over [`ObjectPool::first`]/[`ObjectPool::next`].
    ///
    /// Restarts the walk from the oldest entry; the same single-traversal
    /// contract applies.
    pub fn iter_queued(&mut self) -> QueuedOffsets<'_> {
        QueuedOffsets {
            pool: self,
            started: false,
        }
    }

    fn header(&self) -> &PoolHeader {
        // SAFETY: `bind` guarantees the control block is live for the
        // handle's lifetime and that access is externally serialised.
        unsafe { self.header.as_ref() }
    }

    fn header_mut(&mut self) -> &mut PoolHeader {
        // SAFETY: same contract as `header`, with `&mut self` for this
        // process's side of the exclusivity.
        unsafe { self.header.as_mut() }
    }

    fn slot(&self, pos: u32) -> i64 {
        debug_assert!(pos < self.header().capacity, "ring position out of range");
        // SAFETY: `bind` guarantees `capacity` entries starting at
        // `offsets`, and `pos` is a valid ring position.
        unsafe { *self.offsets.as_ptr().add(pos as usize) }
    }

    fn set_slot(&mut self, pos: u32, value: i64) {
        debug_assert!(pos < self.header().capacity, "ring position out of range");
        // SAFETY: same bounds as `slot`.
        unsafe { *self.offsets.as_ptr().add(pos as usize) = value };
    }
}

/// Forward iterator over the queued offsets of one pool.
pub struct QueuedOffsets<'a> {
    pool: &'a mut ObjectPool,
    started: bool,
}

impl Iterator for QueuedOffsets<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.started {
            self.pool.next()
        } else {
            self.started = true;
            self.pool.first()
        }
    }
}
