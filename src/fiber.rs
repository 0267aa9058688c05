//! Fiber wrapper over `corosensei` coroutines.
//!
//! A fiber is an independently schedulable stack. Pooled fibers run the
//! scheduler's fiber loop; one fiber per run is repurposed to launch the main
//! task. Fiber-to-fiber switches are expressed as a suspend carrying the
//! target fiber index: the worker's OS-thread frame acts as the thread fiber
//! and relays the switch by resuming the target coroutine. The relay makes no
//! scheduling decisions and publishes nothing, so the deferred-release
//! bookkeeping stays entirely inside the departing and incoming fibers.

use corosensei::stack::DefaultStack;
use corosensei::{Coroutine, CoroutineResult, Yielder};
use std::io;

use crate::task_scheduler::TaskScheduler;

/// A `Send`-able pointer to the scheduler, passed into every fiber resume.
///
/// The raw pointer keeps the coroutine closures `'static`; the scheduler
/// itself is `Sync` and outlives every fiber it owns.
#[derive(Clone, Copy)]
pub(crate) struct SchedulerRef(pub(crate) *const TaskScheduler);

// SAFETY: the pointee is `Sync` and valid for the whole scheduler run, which
// bounds the lifetime of every fiber resume.
unsafe impl Send for SchedulerRef {}

/// The suspend handle of the currently running fiber. Suspending with a fiber
/// index asks the thread fiber to resume that fiber next.
pub(crate) type FiberYielder = Yielder<SchedulerRef, usize>;

/// The boxed main-task closure run by the repurposed launcher fiber.
pub(crate) type MainTask = Box<dyn FnOnce(&TaskScheduler) + Send>;

/// A pooled fiber: a coroutine with its own fixed-size stack.
pub(crate) struct Fiber {
    coroutine: Coroutine<SchedulerRef, usize, ()>,
}

// SAFETY: a fiber only migrates between threads while suspended, and the
// scheduler guarantees exactly one thread resumes it at any instant. All
// state captured by the coroutine bodies is `Send`.
unsafe impl Send for Fiber {}

impl Fiber {
    /// Creates a pooled fiber whose body is the scheduler's fiber loop.
    pub(crate) fn new(stack_size: usize) -> io::Result<Self> {
        let stack = DefaultStack::new(stack_size)?;
        let coroutine = Coroutine::with_stack(stack, |yielder, scheduler: SchedulerRef| {
            // SAFETY: see `SchedulerRef`.
            let scheduler = unsafe { &*scheduler.0 };
            scheduler.fiber_loop(yielder);
        });

        Ok(Fiber { coroutine })
    }

    /// Replaces this fiber's body with the main-task launcher.
    ///
    /// Must only be called on a fiber freshly claimed from the pool.
    pub(crate) fn reset_main(&mut self, stack_size: usize, main_task: MainTask) -> io::Result<()> {
        let stack = DefaultStack::new(stack_size)?;
        self.coroutine = Coroutine::with_stack(stack, move |yielder, scheduler: SchedulerRef| {
            // SAFETY: see `SchedulerRef`.
            let scheduler = unsafe { &*scheduler.0 };
            scheduler.main_fiber_start(yielder, main_task);
        });
        Ok(())
    }

    /// Resumes the fiber until it suspends with a switch target or its body
    /// returns control to the thread fiber.
    pub(crate) fn resume(&mut self, scheduler: SchedulerRef) -> CoroutineResult<usize, ()> {
        self.coroutine.resume(scheduler)
    }
}
