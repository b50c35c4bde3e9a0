//! Full sizing scheme: the pool carries the payload storage for all objects.

use shm_pool::{
    full_memory_size, ObjectPool, PoolLayout, RegionInit, SharedRegion, OFFSET_SIZE,
};

const ELEMENT_SIZE: u32 = 64;
const MAX_COUNT: u32 = 8;

fn full_pool() -> (PoolLayout, SharedRegion, ObjectPool) {
    let layout = PoolLayout::full(ELEMENT_SIZE, MAX_COUNT).expect("layout");
    let mut region =
        SharedRegion::new_aligned(layout.total_size(), 64, RegionInit::Zeroed).expect("region");
    let mut pool = ObjectPool::carve(&mut region, &layout).expect("carve pool");
    pool.init_full(
        layout.payload_base().expect("payload base"),
        i64::from(layout.element_size()),
    );
    (layout, region, pool)
}

#[test]
fn layout_reserves_entries_payload_and_bookkeeping() {
    let layout = PoolLayout::full(ELEMENT_SIZE, MAX_COUNT).expect("layout");
    let published = full_memory_size(ELEMENT_SIZE, MAX_COUNT);
    let bookkeeping = (layout.header().len + OFFSET_SIZE) as u64;
    assert_eq!(
        layout.total_size() as u64,
        published + bookkeeping,
        "placement adds the control block and the sacrificial ring position"
    );
}

#[test]
fn allocated_offsets_are_ascending_payload_slots() {
    let (layout, _region, mut pool) = full_pool();
    let payload = layout.payload().expect("payload range");

    for i in 0..i64::from(MAX_COUNT) {
        let offset = pool.allocate().expect("pre-populated slot");
        assert_eq!(offset, payload.offset as i64 + i * i64::from(ELEMENT_SIZE));
        assert!(offset as usize + ELEMENT_SIZE as usize <= payload.end());
    }
    assert_eq!(pool.allocate(), None);
}

#[test]
fn payload_slots_are_usable_object_storage() {
    let (_layout, mut region, mut pool) = full_pool();

    let first = pool.allocate().expect("pre-populated slot");
    let second = pool.allocate().expect("pre-populated slot");

    let base = region.as_mut_ptr();
    // SAFETY: both offsets address disjoint `ELEMENT_SIZE`-byte slots inside
    // the region's payload block.
    unsafe {
        base.add(first as usize).write_bytes(0xA5, ELEMENT_SIZE as usize);
        base.add(second as usize).write_bytes(0x5A, ELEMENT_SIZE as usize);
        assert_eq!(*base.add(first as usize), 0xA5);
        assert_eq!(*base.add(second as usize), 0x5A);
    }

    pool.free(first).expect("return first slot");
    pool.free(second).expect("return second slot");
    assert_eq!(pool.len(), MAX_COUNT);
    assert_eq!(pool.allocate(), Some(first + 2 * i64::from(ELEMENT_SIZE)));
}
