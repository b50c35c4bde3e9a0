//! Alloc/free lifecycle scenarios driven against a live pool.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shm_pool::{ObjectPool, PoolError, PoolLayout, RegionInit, SharedRegion};
use std::collections::VecDeque;

fn empty_pool(max_count: u32) -> (SharedRegion, ObjectPool) {
    let layout = PoolLayout::empty(max_count).expect("layout");
    let mut region =
        SharedRegion::new_aligned(layout.total_size(), 64, RegionInit::Zeroed).expect("region");
    let mut pool = ObjectPool::carve(&mut region, &layout).expect("carve pool");
    pool.init_empty();
    (region, pool)
}

#[test]
fn randomized_churn_matches_a_queue_model() {
    const MAX_COUNT: u32 = 7;
    const STEPS: usize = 10_000;

    let (_region, mut pool) = empty_pool(MAX_COUNT);
    let mut model: VecDeque<i64> = VecDeque::new();
    let mut rng = StdRng::seed_from_u64(0x0FF5_E7);
    let mut next_offset: i64 = 0;

    for step in 0..STEPS {
        if rng.gen_bool(0.5) {
            let offset = next_offset;
            match pool.free(offset) {
                Ok(()) => {
                    next_offset += 1;
                    model.push_back(offset);
                }
                Err(PoolError::Full { max_count }) => {
                    assert_eq!(max_count, MAX_COUNT);
                    assert_eq!(
                        model.len(),
                        MAX_COUNT as usize,
                        "step {step}: pool rejected a free below capacity"
                    );
                }
                Err(other) => panic!("step {step}: unexpected error {other}"),
            }
        } else {
            assert_eq!(
                pool.allocate(),
                model.pop_front(),
                "step {step}: allocation order diverged from the model"
            );
        }
        assert_eq!(pool.len() as usize, model.len(), "step {step}: count drift");
    }
}

#[test]
fn repeated_fill_drain_cycles_cross_the_wrap() {
    const MAX_COUNT: u32 = 5;
    let (_region, mut pool) = empty_pool(MAX_COUNT);

    for cycle in 0..7i64 {
        for i in 0..i64::from(MAX_COUNT) {
            pool.free(cycle * 100 + i).expect("free within capacity");
        }
        assert_eq!(pool.len(), MAX_COUNT);
        for i in 0..i64::from(MAX_COUNT) {
            assert_eq!(pool.allocate(), Some(cycle * 100 + i));
        }
        assert_eq!(pool.allocate(), None);
        assert!(pool.is_empty());
    }
}

#[test]
fn walk_previews_exactly_what_allocation_will_return() {
    let (_region, mut pool) = empty_pool(6);
    for offset in [5, 4, 3, 2] {
        pool.free(offset).expect("free");
    }
    pool.allocate().expect("allocate");
    pool.free(9).expect("free");

    let walked: Vec<i64> = pool.iter_queued().collect();
    assert_eq!(walked.len() as u32, pool.len());

    let drained: Vec<i64> = std::iter::from_fn(|| pool.allocate()).collect();
    assert_eq!(walked, drained);
}

#[test]
fn interleaved_walks_restart_from_the_oldest_entry() {
    let (_region, mut pool) = empty_pool(4);
    for offset in [70, 71, 72] {
        pool.free(offset).expect("free");
    }

    assert_eq!(pool.first(), Some(70));
    assert_eq!(pool.next(), Some(71));

    // Abandon the walk and start over; the cursor must reset to head.
    assert_eq!(pool.first(), Some(70));
    assert_eq!(pool.next(), Some(71));
    assert_eq!(pool.next(), Some(72));
    assert_eq!(pool.next(), None);
}

#[test]
fn init_empty_discards_previously_queued_entries() {
    let (_region, mut pool) = empty_pool(4);
    for offset in [1, 2, 3] {
        pool.free(offset).expect("free");
    }
    pool.init_empty();
    assert!(pool.is_empty());
    assert_eq!(pool.allocate(), None);
    pool.free(42).expect("free after re-init");
    assert_eq!(pool.allocate(), Some(42));
}
