//! A flat pool of fibers with per-slot atomic free flags.
//!
//! `free_fibers[i] == true` iff slot `i` is free. Claiming is a CAS from
//! `true` to `false`; releasing is a single release-ordered store performed
//! only by deferred cleanup, on a thread that is no longer running the fiber.

use std::cell::UnsafeCell;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::fiber::Fiber;

struct FiberSlot(UnsafeCell<Fiber>);

// SAFETY: the free-flag protocol guarantees exactly one thread holds a
// claimed fiber, and only a thread holding a fiber resumes or resets it.
unsafe impl Sync for FiberSlot {}

pub(crate) struct FiberPool {
    fibers: Box<[FiberSlot]>,
    free_fibers: Box<[AtomicBool]>,
}

impl FiberPool {
    /// Allocates `pool_size` fibers with `stack_size`-byte stacks, all free.
    pub(crate) fn new(pool_size: usize, stack_size: usize) -> io::Result<Self> {
        let mut fibers = Vec::with_capacity(pool_size);
        let mut free_fibers = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            fibers.push(FiberSlot(UnsafeCell::new(Fiber::new(stack_size)?)));
            free_fibers.push(AtomicBool::new(true));
        }

        Ok(FiberPool {
            fibers: fibers.into_boxed_slice(),
            free_fibers: free_fibers.into_boxed_slice(),
        })
    }

    /// Claims a free fiber, spinning until one is available.
    ///
    /// Running out of fibers means the application parked more fibers than
    /// the pool holds, which is a configuration bug the scheduler cannot
    /// recover from; the scan keeps spinning and reports the situation after
    /// a handful of full passes.
    pub(crate) fn next_free_fiber(&self) -> usize {
        for scan in 0u32.. {
            for i in 0..self.free_fibers.len() {
                // Double lock: cheap relaxed check before the acquire read.
                if !self.free_fibers[i].load(Ordering::Relaxed) {
                    continue;
                }
                if !self.free_fibers[i].load(Ordering::Acquire) {
                    continue;
                }
                if self.free_fibers[i]
                    .compare_exchange_weak(true, false, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
                {
                    return i;
                }
            }

            if scan == 10 {
                tracing::warn!("no free fibers in the pool; possible deadlock");
            }
            std::hint::spin_loop();
        }
        unreachable!()
    }

    /// Returns a fiber to the pool.
    ///
    /// Must only be called once the fiber's stack has stopped being used,
    /// i.e. from deferred cleanup on the thread that switched away from it.
    pub(crate) fn release_fiber(&self, index: usize) {
        self.free_fibers[index].store(true, Ordering::Release);
    }

    /// Returns mutable access to a fiber slot.
    ///
    /// # Safety
    ///
    /// The caller must hold the slot (a successful claim, or a switch handoff
    /// from the fiber that was running it); the free-flag protocol then
    /// guarantees no other thread touches the fiber.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn fiber_mut(&self, index: usize) -> &mut Fiber {
        unsafe { &mut *self.fibers[index].0.get() }
    }
}
