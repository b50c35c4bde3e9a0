//! Backing memory for pools hosted by a single process.
//!
//! The pool core only ever references caller-managed memory; this module
//! supplies that memory when the caller is a test, a demo, or an embedder
//! that does not attach a named OS segment. Native targets prefer anonymous
//! `mmap` regions (page aligned, the closest stand-in for a mapped shared
//! segment); when the mapping cannot honor the requested alignment the
//! allocation falls back to the heap with an explicit [`Layout`]. The unsafe
//! surface stays inside this module.

use crate::error::{PoolError, PoolResult};
use std::alloc::{alloc, alloc_zeroed, dealloc, Layout};
use std::ptr::{self, NonNull};

/// Specifies how memory in a [`SharedRegion`] should be initialised.
#[derive(Clone, Copy, Debug)]
pub enum RegionInit {
    /// Zero the entire region after allocation.
    Zeroed,
    /// Leave the region uninitialised.
    Uninitialized,
}

#[derive(Debug)]
enum Backing {
    #[cfg(not(target_arch = "wasm32"))]
    Mapped(memmap2::MmapMut),
    Heap {
        ptr: NonNull<u8>,
        layout: Layout,
    },
}

impl Backing {
    fn as_ptr(&self) -> *const u8 {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            Backing::Mapped(map) => map.as_ptr(),
            Backing::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            Backing::Mapped(map) => map.as_mut_ptr(),
            Backing::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }
}

/// Contiguous, aligned memory that can host a pool's control block, offsets
/// array, and optional payload block.
///
/// The region's base address is stable for its whole lifetime; handles carved
/// out of it stay valid until the region is dropped.
#[derive(Debug)]
pub struct SharedRegion {
    len: usize,
    alignment: usize,
    backing: Backing,
}

impl SharedRegion {
    /// Allocates a new region of `len` bytes aligned to `alignment`.
    ///
    /// `len` must be nonzero and `alignment` a nonzero power of two.
    pub fn new_aligned(len: usize, alignment: usize, init: RegionInit) -> PoolResult<Self> {
        if len == 0 || alignment == 0 || !alignment.is_power_of_two() {
            return Err(PoolError::AllocationFailed {
                size: len,
                alignment,
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(backing) = Self::mapped(len, alignment, init)? {
                return Ok(Self {
                    len,
                    alignment,
                    backing,
                });
            }
        }

        Self::heap(len, alignment, init)
    }

    fn heap(len: usize, alignment: usize, init: RegionInit) -> PoolResult<Self> {
        let layout =
            Layout::from_size_align(len, alignment).map_err(|_| PoolError::AllocationFailed {
                size: len,
                alignment,
            })?;

        // SAFETY: `new_aligned` rejected zero-sized requests, so `layout`
        // has nonzero size and a valid alignment.
        let ptr = unsafe {
            match init {
                RegionInit::Zeroed => alloc_zeroed(layout),
                RegionInit::Uninitialized => alloc(layout),
            }
        };

        let ptr = NonNull::new(ptr).ok_or(PoolError::AllocationFailed {
            size: len,
            alignment,
        })?;
        Ok(Self {
            len,
            alignment,
            backing: Backing::Heap { ptr, layout },
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn mapped(len: usize, alignment: usize, init: RegionInit) -> PoolResult<Option<Backing>> {
        let mut map = memmap2::MmapOptions::new()
            .len(len)
            .map_anon()
            .map_err(|_| PoolError::AllocationFailed {
                size: len,
                alignment,
            })?;

        let ptr = map.as_mut_ptr();
        if ptr as usize % alignment != 0 {
            return Ok(None);
        }

        if matches!(init, RegionInit::Zeroed) {
            // SAFETY: the anonymous mapping exposes `len` writable bytes.
            unsafe { ptr::write_bytes(ptr, 0, len) };
        }

        Ok(Some(Backing::Mapped(map)))
    }

    /// Total number of bytes managed by this region.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when the region has zero length.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the alignment the region was requested with.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Borrow the region as a const pointer.
    pub fn as_ptr(&self) -> *const u8 {
        self.backing.as_ptr()
    }

    /// Borrow the region as a mut pointer.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.backing.as_mut_ptr()
    }

    /// View the full region as an immutable slice.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the backing holds `len` initialised-or-uninit bytes owned
        // by this region; the borrow is tied to `&self`.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// View the full region as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: same bounds as `as_slice`, with exclusivity from `&mut self`.
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        if let Backing::Heap { ptr, layout } = &self.backing {
            // SAFETY: the pointer was produced by `alloc`/`alloc_zeroed` with
            // this exact layout and has not been freed before.
            unsafe { dealloc(ptr.as_ptr(), *layout) };
        }
    }
}
