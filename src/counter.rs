//! Counter-based synchronization for task completion tracking.
//!
//! Counters are the only synchronization primitive the scheduler offers.
//! A counter tracks the number of incomplete tasks in a group, and a fiber
//! can park itself until the counter reaches a target value. The waiting
//! fiber is stored directly in the counter: each counter carries a small
//! fixed set of waiting slots, and the final decrement hands the parked
//! fiber to a worker's ready list.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::task_scheduler::TaskScheduler;

/// Number of fibers that can wait on a single counter at once.
///
/// Exceeding this is a configuration bug in the application and panics the
/// parking worker; see [`TaskScheduler::wait_for_counter`].
pub const NUM_WAITING_FIBER_SLOTS: usize = 4;

/// One waiting-fiber slot.
///
/// Slot ownership moves through two atomics. `free` guards reservation:
/// a parking fiber claims a slot by flipping a `free_slots` entry from `true`
/// to `false`. `in_use` guards the published bundle: the parker stores the
/// fields and then flips `in_use` to `false`, after which exactly one party
/// (a decrementer that saw the target value, or the parker rolling back on
/// its recheck) may flip it back to `true` and consume the bundle.
struct WaitingFiberSlot {
    in_use: AtomicBool,
    fiber_index: AtomicUsize,
    target_value: AtomicUsize,
    stored_flag: UnsafeCell<Option<Arc<AtomicBool>>>,
}

// SAFETY: `stored_flag` is only accessed while the slot is exclusively held,
// between a successful `free` claim and the `in_use` publish (the parker), or
// after a successful `in_use` claim (the consumer). The claiming CAS carries
// acquire ordering and the publish carries release, so accesses never overlap.
unsafe impl Sync for WaitingFiberSlot {}

impl WaitingFiberSlot {
    fn new() -> Self {
        WaitingFiberSlot {
            in_use: AtomicBool::new(true),
            fiber_index: AtomicUsize::new(0),
            target_value: AtomicUsize::new(0),
            stored_flag: UnsafeCell::new(None),
        }
    }
}

struct CounterInner {
    value: AtomicUsize,
    free_slots: [AtomicBool; NUM_WAITING_FIBER_SLOTS],
    waiting_fibers: [WaitingFiberSlot; NUM_WAITING_FIBER_SLOTS],
}

/// A thread-safe counter with attached waiting-fiber slots.
///
/// Counters start at zero. Submitting tasks through
/// [`TaskScheduler::add_task`] sets the counter to the number of tasks
/// submitted, and each completed task decrements it by one. A fiber waits for
/// a target value with [`TaskScheduler::wait_for_counter`].
///
/// Cloning a `Counter` produces another handle to the same counter.
///
/// # Example
///
/// ```no_run
/// use fibertask::{Counter, SchedulerParams, Task, TaskScheduler};
///
/// TaskScheduler::run(SchedulerParams::default(), |scheduler| {
///     let counter = Counter::new();
///     scheduler.add_task(Task::new(|_| { /* work */ }), Some(&counter));
///     scheduler.wait_for_counter(&counter, 0, false);
/// })
/// .unwrap();
/// ```
#[derive(Clone)]
pub struct Counter {
    inner: Arc<CounterInner>,
}

impl Counter {
    /// Creates a new counter with value zero.
    pub fn new() -> Self {
        Counter {
            inner: Arc::new(CounterInner {
                value: AtomicUsize::new(0),
                free_slots: std::array::from_fn(|_| AtomicBool::new(true)),
                waiting_fibers: std::array::from_fn(|_| WaitingFiberSlot::new()),
            }),
        }
    }

    /// Stores a new value.
    pub fn store(&self, value: usize) {
        self.inner.value.store(value, Ordering::Release);
    }

    /// Returns the current value.
    pub fn load(&self) -> usize {
        self.inner.value.load(Ordering::Acquire)
    }

    /// Decrements the counter by one and returns the previous value.
    ///
    /// If the new value matches the target of a parked fiber, that fiber is
    /// handed to the calling worker's ready list for resumption.
    ///
    /// # Panics
    ///
    /// Panics when called from a thread that is not a scheduler worker.
    pub fn fetch_sub(&self, scheduler: &TaskScheduler) -> usize {
        let previous = self.inner.value.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "counter decremented below zero");
        self.check_waiting_fibers(previous.wrapping_sub(1), scheduler);
        previous
    }

    /// Publishes a waiting fiber into a free slot, then re-reads the counter.
    ///
    /// Returns `true` if the counter already equals `target_value` and the
    /// slot was rolled back: the fiber must not park. Returns `false` if the
    /// fiber is now being tracked; a future decrement will deliver it to a
    /// ready list. The publish-then-recheck order closes the window where the
    /// final decrement lands between the caller's fast-path check and the
    /// parking, which would otherwise lose the wakeup.
    ///
    /// # Panics
    ///
    /// Panics when every slot is occupied. The slot count is a scheduler-wide
    /// sizing constant; more than [`NUM_WAITING_FIBER_SLOTS`] simultaneous
    /// waiters on one counter is an application configuration bug.
    pub(crate) fn add_fiber_to_waiting_list(
        &self,
        fiber_index: usize,
        target_value: usize,
        stored_flag: Arc<AtomicBool>,
    ) -> bool {
        for i in 0..NUM_WAITING_FIBER_SLOTS {
            if self.inner.free_slots[i]
                .compare_exchange(true, false, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            let slot = &self.inner.waiting_fibers[i];
            slot.fiber_index.store(fiber_index, Ordering::Relaxed);
            slot.target_value.store(target_value, Ordering::Relaxed);
            // SAFETY: the slot is exclusively held between the `free` claim
            // above and the `in_use` publish below.
            unsafe {
                *slot.stored_flag.get() = Some(stored_flag);
            }
            slot.in_use.store(false, Ordering::Release);

            // Recheck after publishing. If the final decrement raced us here,
            // reclaim the slot so the fiber returns instead of parking.
            if self.inner.value.load(Ordering::Acquire) == target_value {
                if slot
                    .in_use
                    .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                    .is_err()
                {
                    // A decrementer claimed the bundle first and will deliver
                    // the fiber through a ready list. Park normally.
                    return false;
                }
                // SAFETY: the `in_use` claim above hands the bundle back.
                unsafe {
                    *slot.stored_flag.get() = None;
                }
                self.inner.free_slots[i].store(true, Ordering::Release);
                return true;
            }

            return false;
        }

        panic!(
            "no free waiting slots on counter; at most {} fibers may wait on one counter",
            NUM_WAITING_FIBER_SLOTS
        );
    }

    /// Scans the slots after a decrement and hands every matching waiter to
    /// the calling worker's ready list.
    fn check_waiting_fibers(&self, value: usize, scheduler: &TaskScheduler) {
        for i in 0..NUM_WAITING_FIBER_SLOTS {
            if self.inner.free_slots[i].load(Ordering::Acquire) {
                continue;
            }
            let slot = &self.inner.waiting_fibers[i];
            if slot.in_use.load(Ordering::Acquire) {
                continue;
            }
            if slot.target_value.load(Ordering::Relaxed) != value {
                continue;
            }

            if slot
                .in_use
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            // The slot may have been recycled between the pre-checks and the
            // claim. Put the bundle back if it is for a different target.
            if slot.target_value.load(Ordering::Relaxed) != value {
                slot.in_use.store(false, Ordering::Release);
                continue;
            }

            let fiber_index = slot.fiber_index.load(Ordering::Relaxed);
            // SAFETY: the `in_use` claim above hands us the bundle.
            let stored_flag = unsafe { (*slot.stored_flag.get()).take() };
            self.inner.free_slots[i].store(true, Ordering::Release);

            debug_assert!(stored_flag.is_some());
            if let Some(stored_flag) = stored_flag {
                scheduler.add_ready_fiber(fiber_index, stored_flag);
            }
        }
    }

    #[cfg(test)]
    fn free_slot_count(&self) -> usize {
        self.inner
            .free_slots
            .iter()
            .filter(|slot| slot.load(Ordering::Acquire))
            .count()
    }
}

impl Default for Counter {
    fn default() -> Self {
        Counter::new()
    }
}
