//! Per-worker thread-local storage.
//!
//! Each worker owns exactly one slot; no other thread reads or writes it.
//! Ready-fiber delivery stays within that rule because counters enqueue onto
//! the list of the worker performing the decrement.

use std::cell::UnsafeCell;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::counter::Counter;
use crate::fiber::FiberYielder;
use crate::task::TaskBundle;
use crate::task_queue::TaskQueue;

pub(crate) const INVALID_FIBER_INDEX: usize = usize::MAX;

/// What deferred cleanup must do with the fiber this thread last switched
/// away from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FiberDestination {
    None,
    ToPool,
    ToWaiting,
}

/// A fiber parked by this worker that must also resume on this worker.
pub(crate) struct PinnedWaitingFiberBundle {
    pub(crate) fiber_index: usize,
    pub(crate) counter: Counter,
    pub(crate) target_value: usize,
}

/// An unpinned fiber some counter declared eligible to resume here.
///
/// Consumed only once the stored flag reads true, i.e. once the parking
/// worker has fully switched off the fiber's stack.
pub(crate) struct ReadyFiberBundle {
    pub(crate) fiber_index: usize,
    pub(crate) stored_flag: Arc<AtomicBool>,
}

pub(crate) struct ThreadLocalStorage {
    /// The fiber now executing on this thread.
    pub(crate) current_fiber_index: usize,
    /// Deferred-cleanup state for the fiber this thread last switched off.
    pub(crate) old_fiber_index: usize,
    pub(crate) old_fiber_destination: FiberDestination,
    pub(crate) old_fiber_stored_flag: Option<Arc<AtomicBool>>,
    /// This worker's end of its work-stealing queue.
    pub(crate) task_queue: TaskQueue<TaskBundle>,
    pub(crate) pinned_tasks: Vec<PinnedWaitingFiberBundle>,
    pub(crate) ready_fibers: Vec<ReadyFiberBundle>,
    /// Offset at which the last steal scan succeeded; the next scan starts
    /// there to keep victim affinity.
    pub(crate) last_successful_steal: usize,
    /// Suspend handle of the currently running fiber. Only valid while a
    /// fiber is executing on this thread.
    pub(crate) current_yielder: *const FiberYielder,
}

impl ThreadLocalStorage {
    pub(crate) fn new(task_queue: TaskQueue<TaskBundle>) -> Self {
        ThreadLocalStorage {
            current_fiber_index: INVALID_FIBER_INDEX,
            old_fiber_index: INVALID_FIBER_INDEX,
            old_fiber_destination: FiberDestination::None,
            old_fiber_stored_flag: None,
            task_queue,
            pinned_tasks: Vec::new(),
            ready_fibers: Vec::new(),
            last_successful_steal: 0,
            current_yielder: std::ptr::null(),
        }
    }
}

pub(crate) struct TlsSlot(UnsafeCell<ThreadLocalStorage>);

// SAFETY: each slot is only ever accessed from its owning worker thread; the
// scheduler hands out the `&mut` exclusively through that thread.
unsafe impl Sync for TlsSlot {}
// SAFETY: slots are created on the scheduler's thread before workers start
// and every field is `Send`.
unsafe impl Send for TlsSlot {}

impl TlsSlot {
    pub(crate) fn new(tls: ThreadLocalStorage) -> Self {
        TlsSlot(UnsafeCell::new(tls))
    }

    /// # Safety
    ///
    /// Must only be called from the worker thread that owns this slot.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn get(&self) -> &mut ThreadLocalStorage {
        unsafe { &mut *self.0.get() }
    }
}
