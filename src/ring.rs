//! Bounded, power-of-two FIFO with a lock-free reserve-write-publish
//! protocol.
//!
//! Producers and consumers each reserve a range of slots by advancing a
//! head counter (via CAS for multi-producer/consumer, a plain store for
//! single-producer/consumer), write their payload into those slots, then
//! publish by advancing the corresponding tail counter. A multi-party
//! publish spins until the tail catches up to its own reservation point,
//! which keeps commit order equal to reservation order.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;

use crate::error::Error;

/// Ring sizes above this are rejected; mirrors the sign bit reserved by
/// the original size mask.
const RING_SZ_MASK: u32 = 0x7FFF_FFFF;

bitflags! {
    /// Construction-time behavior flags for [`Ring::create`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RingFlags: u32 {
        /// Restrict the producer side to a single caller, replacing the
        /// CAS-based head reservation with a plain store.
        const SP_ENQ = 0x0001;
        /// Restrict the consumer side to a single caller.
        const SC_DEQ = 0x0002;
        /// Treat `count` as the exact usable capacity instead of rounding
        /// it up to the next power of two.
        const EXACT_SZ = 0x0004;
    }
}

struct HeadTail {
    head: AtomicU32,
    tail: AtomicU32,
    single: bool,
}

impl HeadTail {
    fn new(single: bool) -> Self {
        HeadTail {
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            single,
        }
    }
}

/// A bounded FIFO of `T` values.
pub struct Ring<T> {
    mask: u32,
    capacity: u32,
    prod: HeadTail,
    cons: HeadTail,
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// The ring coordinates all access to `buf` through atomic head/tail
// reservation; no two reservations ever overlap the same slot.
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Creates a ring holding at least `count` elements (exactly `count`
    /// when `EXACT_SZ` is set). `count` must be a power of two unless
    /// `EXACT_SZ` is set.
    pub fn create(count: u32, flags: RingFlags) -> Result<Self, Error> {
        if count == 0 || count > RING_SZ_MASK {
            return Err(Error::InvalidArgument);
        }

        let (size, capacity) = if flags.contains(RingFlags::EXACT_SZ) {
            (
                count
                    .checked_add(1)
                    .ok_or(Error::InvalidArgument)?
                    .next_power_of_two(),
                count,
            )
        } else {
            if !count.is_power_of_two() {
                return Err(Error::InvalidArgument);
            }
            (count, count - 1)
        };

        let buf = (0..size)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        Ok(Ring {
            mask: size - 1,
            capacity,
            prod: HeadTail::new(flags.contains(RingFlags::SP_ENQ)),
            cons: HeadTail::new(flags.contains(RingFlags::SC_DEQ)),
            buf,
        })
    }

    /// Usable capacity: the number of elements that can be enqueued
    /// before the ring reports `NoSpace`.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of elements currently enqueued.
    pub fn len(&self) -> u32 {
        self.prod
            .tail
            .load(Ordering::Acquire)
            .wrapping_sub(self.cons.head.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserves one slot, writes `obj` into it, and publishes.
    pub fn enqueue(&self, obj: T) -> Result<(), Error> {
        let old_head = self.move_prod_head(1).ok_or(Error::NoSpace)?;
        let idx = (old_head & self.mask) as usize;
        unsafe {
            (*self.buf[idx].get()).write(obj);
        }
        self.publish(&self.prod, old_head, old_head.wrapping_add(1));
        Ok(())
    }

    /// Reserves one occupied slot, reads it out, and publishes.
    pub fn dequeue(&self) -> Result<T, Error> {
        let old_head = self.move_cons_head(1).ok_or(Error::NotFound)?;
        let idx = (old_head & self.mask) as usize;
        let val = unsafe { (*self.buf[idx].get()).assume_init_read() };
        self.publish(&self.cons, old_head, old_head.wrapping_add(1));
        Ok(val)
    }

    fn move_prod_head(&self, n: u32) -> Option<u32> {
        loop {
            let old_head = self.prod.head.load(Ordering::Acquire);
            let cons_tail = self.cons.tail.load(Ordering::Acquire);
            let free_entries = self.capacity.wrapping_add(cons_tail).wrapping_sub(old_head);
            if n > free_entries {
                return None;
            }
            let new_head = old_head.wrapping_add(n);
            if self.prod.single {
                self.prod.head.store(new_head, Ordering::Relaxed);
                return Some(old_head);
            }
            if self
                .prod
                .head
                .compare_exchange_weak(old_head, new_head, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(old_head);
            }
            core::hint::spin_loop();
        }
    }

    fn move_cons_head(&self, n: u32) -> Option<u32> {
        loop {
            let old_head = self.cons.head.load(Ordering::Acquire);
            let prod_tail = self.prod.tail.load(Ordering::Acquire);
            let entries = prod_tail.wrapping_sub(old_head);
            if n > entries {
                return None;
            }
            let new_head = old_head.wrapping_add(n);
            if self.cons.single {
                self.cons.head.store(new_head, Ordering::Relaxed);
                return Some(old_head);
            }
            if self
                .cons
                .head
                .compare_exchange_weak(old_head, new_head, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(old_head);
            }
            core::hint::spin_loop();
        }
    }

    /// Advances `ht.tail` to `new_val`, spinning (multi-party mode only)
    /// until every earlier reservation has published, so commit order
    /// always matches reservation order.
    fn publish(&self, ht: &HeadTail, old_val: u32, new_val: u32) {
        if !ht.single {
            while ht.tail.load(Ordering::Acquire) != old_val {
                core::hint::spin_loop();
            }
        }
        ht.tail.store(new_val, Ordering::Release);
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        let mut idx = *self.cons.head.get_mut();
        let tail = *self.prod.tail.get_mut();
        while idx != tail {
            let slot = (idx & self.mask) as usize;
            unsafe {
                (*self.buf[slot].get()).assume_init_drop();
            }
            idx = idx.wrapping_add(1);
        }
    }
}
