//! The task scheduler: thread-pool lifecycle, task submission, the fiber
//! loop, work stealing, and the counter wait/resume protocol.
//!
//! A fixed pool of worker threads, each pinned to a core, executes tasks
//! drawn from per-thread work-stealing queues. A task that must wait for
//! other tasks parks its fiber and switches to a replacement fiber from the
//! pool, so the worker thread itself never blocks. Parked fibers are revived
//! through their counter (unpinned) or the parking worker's pinned list, and
//! are released for reuse by deferred cleanup on the incoming fiber.

use std::cell::Cell;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use corosensei::CoroutineResult;
use thiserror::Error;
use tracing::{debug, error};

use crate::counter::Counter;
use crate::fiber::{FiberYielder, MainTask, SchedulerRef};
use crate::fiber_pool::FiberPool;
use crate::task::{Task, TaskBundle};
use crate::task_queue::{TaskQueue, TaskStealer};
use crate::tls::{
    FiberDestination, PinnedWaitingFiberBundle, ReadyFiberBundle, ThreadLocalStorage, TlsSlot,
    INVALID_FIBER_INDEX,
};

/// What a worker does when it finds no fiber to resume and no task to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EmptyQueueBehavior {
    /// Keep polling at full speed.
    #[default]
    Spin = 0,
    /// Yield the OS thread between polls.
    Yield = 1,
    /// Sleep briefly between polls.
    Sleep = 2,
}

impl EmptyQueueBehavior {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EmptyQueueBehavior::Yield,
            2 => EmptyQueueBehavior::Sleep,
            _ => EmptyQueueBehavior::Spin,
        }
    }
}

/// Sizing and policy parameters for a scheduler run.
#[derive(Clone, Debug)]
pub struct SchedulerParams {
    /// Number of fibers in the pool. Must admit every worker plus the main
    /// task, i.e. at least `thread_pool_size + 1`.
    pub fiber_pool_size: usize,
    /// Number of worker threads, including the calling thread. Zero means
    /// one worker per hardware thread.
    pub thread_pool_size: usize,
    /// Stack size of each pooled fiber, in bytes.
    pub fiber_stack_size: usize,
    /// Stack size of each spawned worker thread, in bytes.
    pub thread_stack_size: usize,
    pub empty_queue_behavior: EmptyQueueBehavior,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        SchedulerParams {
            fiber_pool_size: 128,
            thread_pool_size: 0,
            fiber_stack_size: 512 * 1024,
            thread_stack_size: 512 * 1024,
            empty_queue_behavior: EmptyQueueBehavior::Spin,
        }
    }
}

/// Errors that abort scheduler setup.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to allocate a fiber stack")]
    FiberStack(#[source] io::Error),
    #[error("failed to spawn worker thread {index}")]
    ThreadSpawn {
        index: usize,
        #[source]
        source: io::Error,
    },
    #[error("fiber pool of {fiber_pool_size} cannot serve {num_threads} workers plus the main task")]
    FiberPoolTooSmall {
        fiber_pool_size: usize,
        num_threads: usize,
    },
}

thread_local! {
    /// Worker index of the current OS thread, set at worker entry. `None`
    /// outside scheduler workers.
    static WORKER_INDEX: Cell<Option<usize>> = const { Cell::new(None) };
}

/// The fiber-based task scheduler.
///
/// A scheduler exists only inside [`TaskScheduler::run`]: the closure passed
/// to `run` becomes the main task and receives the scheduler handle, as does
/// every task closure. `run` returns once the main task has returned and all
/// workers have shut down.
///
/// # Example
///
/// ```no_run
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use fibertask::{Counter, SchedulerParams, Task, TaskScheduler};
///
/// let total = Arc::new(AtomicUsize::new(0));
/// let total_clone = total.clone();
///
/// TaskScheduler::run(SchedulerParams::default(), move |scheduler| {
///     let counter = Counter::new();
///     let tasks = (0..100).map(|_| {
///         let total = total_clone.clone();
///         Task::new(move |_| {
///             total.fetch_add(1, Ordering::Relaxed);
///         })
///     });
///     scheduler.add_tasks(tasks, Some(&counter));
///     scheduler.wait_for_counter(&counter, 0, false);
/// })
/// .unwrap();
///
/// assert_eq!(total.load(Ordering::Relaxed), 100);
/// ```
pub struct TaskScheduler {
    num_threads: usize,
    fiber_pool: FiberPool,
    tls: Box<[TlsSlot]>,
    stealers: Vec<TaskStealer<TaskBundle>>,
    initialized: AtomicBool,
    quit: AtomicBool,
    empty_queue_behavior: AtomicU8,
    #[cfg(feature = "metrics")]
    metrics: crate::metrics::Metrics,
}

impl TaskScheduler {
    /// Runs a scheduler to completion.
    ///
    /// The calling thread becomes worker 0; `thread_pool_size - 1` further
    /// workers are spawned, each pinned to a core. `main_task` runs on a
    /// repurposed pool fiber; once it returns, all workers shut down and
    /// `run` returns after joining them.
    pub fn run<F>(params: SchedulerParams, main_task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&TaskScheduler) + Send + 'static,
    {
        let num_threads = if params.thread_pool_size == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            params.thread_pool_size
        };

        // Every worker holds one fiber while running, and the main task holds
        // one more; a smaller pool cannot even start.
        if params.fiber_pool_size < num_threads + 1 {
            return Err(SchedulerError::FiberPoolTooSmall {
                fiber_pool_size: params.fiber_pool_size,
                num_threads,
            });
        }

        let fiber_pool = FiberPool::new(params.fiber_pool_size, params.fiber_stack_size)
            .map_err(SchedulerError::FiberStack)?;

        let mut tls = Vec::with_capacity(num_threads);
        let mut stealers = Vec::with_capacity(num_threads);
        for _ in 0..num_threads {
            let queue = TaskQueue::new();
            stealers.push(queue.stealer());
            tls.push(TlsSlot::new(ThreadLocalStorage::new(queue)));
        }

        let scheduler = TaskScheduler {
            num_threads,
            fiber_pool,
            tls: tls.into_boxed_slice(),
            stealers,
            initialized: AtomicBool::new(false),
            quit: AtomicBool::new(false),
            empty_queue_behavior: AtomicU8::new(params.empty_queue_behavior as u8),
            #[cfg(feature = "metrics")]
            metrics: crate::metrics::Metrics::new(),
        };

        debug!(
            num_threads,
            fiber_pool_size = params.fiber_pool_size,
            "starting task scheduler"
        );

        let core_ids = core_affinity::get_core_ids().unwrap_or_default();

        let result = thread::scope(|scope| -> Result<(), SchedulerError> {
            // Claim the calling thread as worker 0 on core 0.
            WORKER_INDEX.set(Some(0));
            if let Some(&core) = core_ids.first() {
                core_affinity::set_for_current(core);
            }

            for index in 1..num_threads {
                let core_id = core_ids.get(index % core_ids.len().max(1)).copied();
                let spawned = thread::Builder::new()
                    .name(format!("fibertask-worker-{index}"))
                    .stack_size(params.thread_stack_size)
                    .spawn_scoped(scope, {
                        let scheduler = &scheduler;
                        move || scheduler.worker_entry(index, core_id)
                    });
                if let Err(source) = spawned {
                    error!(index, "failed to spawn worker thread");
                    return Err(scheduler.abort_setup(SchedulerError::ThreadSpawn { index, source }));
                }
            }

            scheduler.initialized.store(true, Ordering::Release);

            // Repurpose a free fiber as the main-task launcher and switch to
            // it. Control returns here only once shutdown is underway.
            let main_fiber_index = scheduler.fiber_pool.next_free_fiber();
            {
                // SAFETY: the fiber was just claimed; no other thread holds it.
                let main_fiber = unsafe { scheduler.fiber_pool.fiber_mut(main_fiber_index) };
                if let Err(source) =
                    main_fiber.reset_main(params.fiber_stack_size, Box::new(main_task))
                {
                    return Err(scheduler.abort_setup(SchedulerError::FiberStack(source)));
                }
            }
            // SAFETY: worker 0 owns this slot.
            unsafe { scheduler.tls(0) }.current_fiber_index = main_fiber_index;
            scheduler.thread_fiber_loop(main_fiber_index);

            // The remaining workers observe `quit` and are joined when the
            // scope ends.
            Ok(())
        });
        WORKER_INDEX.set(None);

        debug!("task scheduler shut down");
        result
    }

    /// Submits a task, optionally tracked by a counter.
    ///
    /// The counter, if present, is set to 1 and decremented when the task's
    /// closure returns. The task lands on the calling worker's local queue.
    ///
    /// # Panics
    ///
    /// Panics when called from a thread that is not a scheduler worker, i.e.
    /// from outside the main task and all task closures.
    pub fn add_task(&self, task: Task, counter: Option<&Counter>) {
        if let Some(counter) = counter {
            counter.store(1);
        }
        let tls = self.current_tls();
        tls.task_queue.push(TaskBundle {
            task,
            counter: counter.cloned(),
        });
    }

    /// Submits a batch of tasks tracked by one counter.
    ///
    /// The counter, if present, is set to the number of tasks and decremented
    /// once per completed task; waiting for zero waits for the whole batch.
    ///
    /// # Panics
    ///
    /// Panics when called from a thread that is not a scheduler worker.
    pub fn add_tasks<I>(&self, tasks: I, counter: Option<&Counter>)
    where
        I: IntoIterator<Item = Task>,
    {
        let tasks: Vec<Task> = tasks.into_iter().collect();
        if let Some(counter) = counter {
            counter.store(tasks.len());
        }
        let tls = self.current_tls();
        for task in tasks {
            tls.task_queue.push(TaskBundle {
                task,
                counter: counter.cloned(),
            });
        }
    }

    /// Parks the current fiber until `counter` reaches `value`.
    ///
    /// Returns immediately when the counter already holds the target value.
    /// Otherwise the fiber is parked, a replacement fiber from the pool takes
    /// over this worker, and the call returns once some worker resumes the
    /// parked fiber after the counter hits the target. With
    /// `pin_to_current_thread` the fiber resumes on the calling worker;
    /// otherwise it may resume on any worker.
    ///
    /// # Panics
    ///
    /// Panics when called from a thread that is not a scheduler worker.
    pub fn wait_for_counter(&self, counter: &Counter, value: usize, pin_to_current_thread: bool) {
        // Fast out.
        if counter.load() == value {
            #[cfg(feature = "metrics")]
            self.metrics.waits_fast_path.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let thread_index = self.worker_index();
        let free_fiber_index = self.fiber_pool.next_free_fiber();

        let yielder: &FiberYielder;
        {
            // SAFETY: this worker owns its slot.
            let tls = unsafe { self.tls(thread_index) };
            let current_fiber_index = tls.current_fiber_index;
            debug_assert!(!tls.current_yielder.is_null());
            // SAFETY: the yielder belongs to the fiber running this very call.
            yielder = unsafe { &*tls.current_yielder };

            if pin_to_current_thread {
                // The fiber can only be revived by this worker's own loop,
                // which cannot run before we have switched off this stack; no
                // stored-flag handshake is needed.
                tls.pinned_tasks.push(PinnedWaitingFiberBundle {
                    fiber_index: current_fiber_index,
                    counter: counter.clone(),
                    target_value: value,
                });
                tls.current_fiber_index = free_fiber_index;
            } else {
                let stored_flag = Arc::new(AtomicBool::new(false));
                if counter.add_fiber_to_waiting_list(
                    current_fiber_index,
                    value,
                    Arc::clone(&stored_flag),
                ) {
                    // The counter hit the target while we were parking: undo
                    // the reservation and return without switching.
                    self.fiber_pool.release_fiber(free_fiber_index);
                    #[cfg(feature = "metrics")]
                    self.metrics.waits_fast_path.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                tls.old_fiber_index = current_fiber_index;
                tls.current_fiber_index = free_fiber_index;
                tls.old_fiber_destination = FiberDestination::ToWaiting;
                tls.old_fiber_stored_flag = Some(stored_flag);
            }
        }

        #[cfg(feature = "metrics")]
        {
            self.metrics.waits_parked.fetch_add(1, Ordering::Relaxed);
            self.metrics.fiber_switches.fetch_add(1, Ordering::Relaxed);
        }

        yielder.suspend(free_fiber_index);

        // Resumed, possibly on a different worker.
        self.on_fiber_resumed(yielder);
    }

    /// Returns the index of the calling worker, or `None` when called from a
    /// thread that does not belong to this scheduler's pool.
    pub fn current_thread_index(&self) -> Option<usize> {
        WORKER_INDEX.get()
    }

    /// Returns the number of worker threads, including the caller of `run`.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Returns a snapshot of the scheduler's internal counters.
    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> crate::metrics::MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn worker_index(&self) -> usize {
        match WORKER_INDEX.get() {
            Some(index) => index,
            None => panic!("fibertask API called from a thread that is not a scheduler worker"),
        }
    }

    /// # Safety
    ///
    /// Each TLS slot may only be accessed from its owning worker thread.
    #[allow(clippy::mut_from_ref)]
    unsafe fn tls(&self, index: usize) -> &mut ThreadLocalStorage {
        unsafe { self.tls[index].get() }
    }

    #[allow(clippy::mut_from_ref)]
    fn current_tls(&self) -> &mut ThreadLocalStorage {
        let index = self.worker_index();
        // SAFETY: `index` is the calling thread's own slot.
        unsafe { self.tls(index) }
    }

    fn abort_setup(&self, error: SchedulerError) -> SchedulerError {
        // Unblock workers spinning on the init flag; they observe `quit`
        // right after claiming a fiber and exit.
        self.quit.store(true, Ordering::Release);
        self.initialized.store(true, Ordering::Release);
        error
    }

    /// Entry routine of workers 1..N-1.
    fn worker_entry(&self, index: usize, core_id: Option<core_affinity::CoreId>) {
        WORKER_INDEX.set(Some(index));
        if let Some(core) = core_id {
            core_affinity::set_for_current(core);
        }

        while !self.initialized.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }

        let free_fiber_index = self.fiber_pool.next_free_fiber();
        self.current_tls().current_fiber_index = free_fiber_index;
        self.thread_fiber_loop(free_fiber_index);
    }

    /// The thread fiber: relays switch requests by resuming the requested
    /// fiber, until some fiber hands control back for thread exit.
    fn thread_fiber_loop(&self, first_fiber_index: usize) {
        let mut fiber_index = first_fiber_index;
        loop {
            // SAFETY: exactly one thread runs a given fiber at any instant.
            // This thread either claimed `fiber_index` from the pool or was
            // handed it by the fiber that just suspended.
            let fiber = unsafe { self.fiber_pool.fiber_mut(fiber_index) };
            match fiber.resume(SchedulerRef(self)) {
                CoroutineResult::Yield(next) => fiber_index = next,
                CoroutineResult::Return(()) => break,
            }
        }
    }

    /// Body of every pooled fiber.
    pub(crate) fn fiber_loop(&self, yielder: &FiberYielder) {
        // A fiber fresh from the pool may carry a deferred release from the
        // fiber that switched to it.
        self.on_fiber_resumed(yielder);

        while !self.quit.load(Ordering::Acquire) {
            if let Some(found) = self.next_resumable_fiber() {
                self.switch_to_resumable(yielder, found);
                continue;
            }

            if let Some(bundle) = self.next_task() {
                let TaskBundle { task, counter } = bundle;
                task.execute(self);
                #[cfg(feature = "metrics")]
                self.metrics.tasks_executed.fetch_add(1, Ordering::Relaxed);
                if let Some(counter) = counter {
                    counter.fetch_sub(self);
                }
                continue;
            }

            match EmptyQueueBehavior::from_u8(self.empty_queue_behavior.load(Ordering::Relaxed)) {
                EmptyQueueBehavior::Yield => thread::yield_now(),
                EmptyQueueBehavior::Sleep => thread::sleep(Duration::from_micros(100)),
                EmptyQueueBehavior::Spin => {}
            }
        }

        // Quit: returning hands control back to this worker's thread fiber.
    }

    /// One-shot body of the repurposed main-task fiber.
    pub(crate) fn main_fiber_start(&self, yielder: &FiberYielder, main_task: MainTask) {
        self.current_tls().current_yielder = yielder as *const FiberYielder;

        main_task(self);

        // Request that all workers quit, then hand control back to the thread
        // fiber of whichever worker the main fiber ended up on.
        self.quit.store(true, Ordering::Release);
    }

    /// First act of a fiber whenever it (re)gains a thread: record its
    /// suspend handle and run deferred cleanup for the fiber this thread
    /// switched away from.
    fn on_fiber_resumed(&self, yielder: &FiberYielder) {
        self.current_tls().current_yielder = yielder as *const FiberYielder;
        self.cleanup_old_fiber();
    }

    /// Executes the deferred release of the fiber this thread last switched
    /// off.
    ///
    /// A departing fiber cannot publish itself as free before switching: the
    /// moment it is visible in the pool or on a waiting list, another worker
    /// may resume it while its stack is still unwinding, corrupting the
    /// stack. Instead the departing fiber records what must happen in its
    /// worker's TLS, and the incoming fiber performs the publication here.
    /// Control always passes through this function between two switches on a
    /// thread, so the release happens exactly once, after the old stack is
    /// quiescent.
    fn cleanup_old_fiber(&self) {
        let tls = self.current_tls();
        match tls.old_fiber_destination {
            FiberDestination::None => {}
            FiberDestination::ToPool => {
                self.fiber_pool.release_fiber(tls.old_fiber_index);
                tls.old_fiber_destination = FiberDestination::None;
                tls.old_fiber_index = INVALID_FIBER_INDEX;
            }
            FiberDestination::ToWaiting => {
                let stored_flag = tls.old_fiber_stored_flag.take();
                debug_assert!(stored_flag.is_some());
                if let Some(stored_flag) = stored_flag {
                    // The release point: decrement observers may now hand the
                    // parked fiber to a ready list for resumption.
                    stored_flag.store(true, Ordering::Release);
                }
                tls.old_fiber_destination = FiberDestination::None;
                tls.old_fiber_index = INVALID_FIBER_INDEX;
            }
        }
    }

    /// Looks for a parked fiber this worker may resume: pinned fibers whose
    /// counter reached its target first, then ready unpinned fibers whose
    /// parking switch has been published.
    fn next_resumable_fiber(&self) -> Option<usize> {
        let tls = self.current_tls();

        if let Some(pos) = tls
            .pinned_tasks
            .iter()
            .position(|bundle| bundle.counter.load() == bundle.target_value)
        {
            let bundle = tls.pinned_tasks.remove(pos);
            #[cfg(feature = "metrics")]
            self.metrics.pinned_resumes.fetch_add(1, Ordering::Relaxed);
            return Some(bundle.fiber_index);
        }

        if let Some(pos) = tls
            .ready_fibers
            .iter()
            .position(|ready| ready.stored_flag.load(Ordering::Acquire))
        {
            let ready = tls.ready_fibers.remove(pos);
            #[cfg(feature = "metrics")]
            self.metrics.ready_resumes.fetch_add(1, Ordering::Relaxed);
            return Some(ready.fiber_index);
        }

        None
    }

    /// Parks the current fiber back into the pool and switches to `found`.
    fn switch_to_resumable(&self, yielder: &FiberYielder, found: usize) {
        {
            let tls = self.current_tls();
            tls.old_fiber_index = tls.current_fiber_index;
            tls.current_fiber_index = found;
            tls.old_fiber_destination = FiberDestination::ToPool;
        }

        #[cfg(feature = "metrics")]
        self.metrics.fiber_switches.fetch_add(1, Ordering::Relaxed);

        yielder.suspend(found);

        // Back, possibly on a different worker.
        self.on_fiber_resumed(yielder);
    }

    /// Pops from the local queue, then tries to steal from the other workers
    /// starting at the offset of the last successful steal.
    fn next_task(&self) -> Option<TaskBundle> {
        let current_thread = self.worker_index();
        // SAFETY: this worker owns its slot.
        let tls = unsafe { self.tls(current_thread) };

        if let Some(bundle) = tls.task_queue.pop() {
            #[cfg(feature = "metrics")]
            self.metrics.local_queue_pops.fetch_add(1, Ordering::Relaxed);
            return Some(bundle);
        }

        let start = tls.last_successful_steal;
        for offset in 0..self.num_threads {
            let victim = (start + offset) % self.num_threads;
            if victim == current_thread {
                continue;
            }
            if let Some(bundle) = self.stealers[victim].steal() {
                tls.last_successful_steal = offset;
                #[cfg(feature = "metrics")]
                self.metrics.steals_success.fetch_add(1, Ordering::Relaxed);
                return Some(bundle);
            }
        }

        #[cfg(feature = "metrics")]
        self.metrics.steals_failed.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Hands a fiber whose counter reached its target to this worker's ready
    /// list. Called by counters on the worker performing the decrement.
    pub(crate) fn add_ready_fiber(&self, fiber_index: usize, stored_flag: Arc<AtomicBool>) {
        self.current_tls().ready_fibers.push(ReadyFiberBundle {
            fiber_index,
            stored_flag,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn test_params(thread_pool_size: usize) -> SchedulerParams {
        SchedulerParams {
            fiber_pool_size: 32,
            thread_pool_size,
            fiber_stack_size: 256 * 1024,
            thread_stack_size: 512 * 1024,
            empty_queue_behavior: EmptyQueueBehavior::Yield,
        }
    }

    #[test]
    fn test_run_executes_main_task() {
        let executed = Arc::new(AtomicBool::new(false));
        let executed_clone = executed.clone();

        TaskScheduler::run(test_params(2), move |_| {
            executed_clone.store(true, Ordering::SeqCst);
        })
        .unwrap();

        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_pool_must_admit_all_workers() {
        let params = SchedulerParams {
            fiber_pool_size: 2,
            thread_pool_size: 4,
            ..test_params(4)
        };
        let result = TaskScheduler::run(params, |_| {});
        assert!(matches!(
            result,
            Err(SchedulerError::FiberPoolTooSmall { .. })
        ));
    }

    #[test]
    fn test_thread_index_inside_and_outside_workers() {
        TaskScheduler::run(test_params(2), |scheduler| {
            assert_eq!(scheduler.current_thread_index(), Some(0));
            assert_eq!(scheduler.num_threads(), 2);

            thread::scope(|scope| {
                scope.spawn(|| {
                    assert_eq!(scheduler.current_thread_index(), None);
                });
            });
        })
        .unwrap();
    }

    #[test]
    fn test_fast_path_wait_does_not_switch_fibers() {
        TaskScheduler::run(test_params(2), |scheduler| {
            let counter = Counter::new();
            counter.store(3);

            let index = scheduler.worker_index();
            // SAFETY: reading this worker's own slot.
            let before = unsafe { scheduler.tls(index) }.current_fiber_index;
            scheduler.wait_for_counter(&counter, 3, false);
            let after = unsafe { scheduler.tls(scheduler.worker_index()) }.current_fiber_index;

            assert_eq!(before, after);
        })
        .unwrap();
    }

    #[test]
    fn test_single_worker_runs_to_completion() {
        let total = Arc::new(AtomicUsize::new(0));
        let total_clone = total.clone();

        TaskScheduler::run(test_params(1), move |scheduler| {
            let counter = Counter::new();
            let tasks = (0..50).map(|_| {
                let total = total_clone.clone();
                Task::new(move |_| {
                    total.fetch_add(1, Ordering::Relaxed);
                })
            });
            scheduler.add_tasks(tasks, Some(&counter));
            scheduler.wait_for_counter(&counter, 0, false);
            assert_eq!(counter.load(), 0);
        })
        .unwrap();

        assert_eq!(total.load(Ordering::Relaxed), 50);
    }
}
