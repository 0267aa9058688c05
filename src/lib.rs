//! # fibertask - Fiber-Based Task Scheduler
//!
//! A task scheduler for latency-sensitive, CPU-bound parallel workloads,
//! built on cooperatively scheduled fibers. A fixed pool of worker threads,
//! each pinned to a core, executes short-lived tasks drawn from per-thread
//! work-stealing queues. A task that must wait for other tasks parks its
//! fiber and switches to another one, so "wait for N subtasks" costs a
//! user-space stack switch instead of a kernel block.
//!
//! ## Architecture
//!
//! - **Fibers**: independently schedulable stacks, held in a fixed pool
//! - **Task queues**: per-worker work-stealing deques
//! - **Counters**: atomic integers with attached waiting-fiber slots, the
//!   only synchronization primitive
//! - **Workers**: OS threads running the fiber loop, one per core
//!
//! ## Example
//!
//! ```no_run
//! use fibertask::{Counter, SchedulerParams, Task, TaskScheduler};
//!
//! TaskScheduler::run(SchedulerParams::default(), |scheduler| {
//!     let counter = Counter::new();
//!     scheduler.add_task(
//!         Task::new(|_| println!("Hello from a fiber task!")),
//!         Some(&counter),
//!     );
//!     scheduler.wait_for_counter(&counter, 0, false);
//! })
//! .unwrap();
//! ```

pub mod counter;
pub mod task;
pub mod task_scheduler;

mod fiber;
mod fiber_pool;
mod task_queue;
mod tls;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use counter::Counter;
pub use task::Task;
pub use task_scheduler::{EmptyQueueBehavior, SchedulerError, SchedulerParams, TaskScheduler};
