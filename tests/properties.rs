//! Property-based tests over randomized operation sequences.

use proptest::prelude::*;

use dplane::{Heap, Lpm, LpmConfig, Ring, RingFlags};

fn ip_from_parts(a: u8, b: u8, c: u8, d: u8) -> u32 {
    ((a as u32) << 24) | ((b as u32) << 16) | ((c as u32) << 8) | d as u32
}

proptest! {
    /// Re-adding the same (ip, depth) with a possibly different next_hop
    /// is always accepted and always overwrites the mapping rather than
    /// duplicating a rule slot.
    #[test]
    fn lpm_add_is_idempotent_on_key(
        a in any::<u8>(), b in any::<u8>(), c in any::<u8>(),
        depth in 1u8..=32u8,
        hop1 in 0u32..0x00FF_FFFF, hop2 in 0u32..0x00FF_FFFF,
    ) {
        let mut lpm = Lpm::create("prop", LpmConfig { max_rules: 64, number_tbl8s: 8 }).unwrap();
        let addr = ip_from_parts(a, b, c, 0);

        lpm.add(addr, depth, hop1).unwrap();
        lpm.add(addr, depth, hop2).unwrap();

        let dump = lpm.dump();
        let info = dump[(depth - 1) as usize];
        prop_assert_eq!(info.used_rules, 1);
        prop_assert_eq!(lpm.lookup(addr), Ok(hop2));
    }

    /// A route is visible to every address inside its prefix range and
    /// invisible immediately outside it on the one-bit boundary, for
    /// depths entirely inside the tbl24 fast path.
    #[test]
    fn lpm_covers_exactly_its_prefix_range(
        prefix_byte in 0u8..=254u8,
        hop in 1u32..0x00FF_FFFF,
    ) {
        let mut lpm = Lpm::create("prop", LpmConfig { max_rules: 16, number_tbl8s: 4 }).unwrap();
        let addr = ip_from_parts(10, prefix_byte, 0, 0);
        lpm.add(addr, 24, hop).unwrap();

        prop_assert_eq!(lpm.lookup(ip_from_parts(10, prefix_byte, 0, 0)), Ok(hop));
        prop_assert_eq!(lpm.lookup(ip_from_parts(10, prefix_byte, 255, 255)), Ok(hop));
        prop_assert_eq!(
            lpm.lookup(ip_from_parts(10, prefix_byte.wrapping_add(1), 0, 0)),
            Err(dplane::Error::NotFound)
        );
    }

    /// Whatever order a mix of alloc/free requests arrives in, the heap
    /// never aliases two live allocations onto overlapping byte ranges.
    #[test]
    fn heap_allocations_never_overlap(
        sizes in proptest::collection::vec(1usize..4096, 1..40),
    ) {
        let mut heap = Heap::create(1 << 22).unwrap();
        let mut live: Vec<(usize, usize)> = Vec::new();

        for (i, sz) in sizes.into_iter().enumerate() {
            if let Some(p) = heap.alloc(sz, 64) {
                let start = p.as_ptr() as usize;
                for &(os, oe) in &live {
                    prop_assert!(start >= oe || start + sz <= os);
                }
                live.push((start, start + sz));
                if i % 3 == 0 {
                    if let Some((s, _)) = live.pop() {
                        heap.free(core::ptr::NonNull::new(s as *mut u8).unwrap());
                    }
                }
            }
        }
    }

    /// A ring never yields more dequeues than the enqueues that
    /// preceded them, and every dequeued value was in fact enqueued, in
    /// FIFO order, regardless of how enqueue/dequeue calls are
    /// interleaved.
    #[test]
    fn ring_is_fifo_under_arbitrary_interleaving(
        ops in proptest::collection::vec(any::<bool>(), 1..200),
    ) {
        let ring: Ring<u32> = Ring::create(16, RingFlags::EXACT_SZ).unwrap();
        let mut expected = std::collections::VecDeque::new();
        let mut next_val = 0u32;

        for enqueue in ops {
            if enqueue {
                if ring.enqueue(next_val).is_ok() {
                    expected.push_back(next_val);
                    next_val += 1;
                }
            } else if let Ok(v) = ring.dequeue() {
                prop_assert_eq!(Some(v), expected.pop_front());
            }
        }
    }
}
