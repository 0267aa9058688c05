//! Task definitions.
//!
//! A task is the unit of work executed by the scheduler. It wraps a closure
//! that receives a handle to the scheduler, so running tasks can submit
//! further tasks and wait on counters.

use crate::counter::Counter;
use crate::task_scheduler::TaskScheduler;

/// A unit of work to be executed on a worker fiber.
///
/// The closure receives the scheduler handle, allowing the task to submit
/// subtasks and block on counters without blocking the worker thread.
pub struct Task {
    function: Box<dyn FnOnce(&TaskScheduler) + Send + 'static>,
}

impl Task {
    /// Creates a new task from the given closure.
    ///
    /// # Example
    ///
    /// ```
    /// use fibertask::Task;
    ///
    /// let task = Task::new(|_scheduler| {
    ///     // Do work
    /// });
    /// ```
    pub fn new<F>(function: F) -> Self
    where
        F: FnOnce(&TaskScheduler) + Send + 'static,
    {
        Task {
            function: Box::new(function),
        }
    }

    /// Runs the task to completion on the current fiber.
    pub(crate) fn execute(self, scheduler: &TaskScheduler) {
        (self.function)(scheduler);
    }
}

/// A task paired with the counter that tracks its completion.
///
/// The counter, if present, is decremented once the task's closure returns.
pub(crate) struct TaskBundle {
    pub(crate) task: Task,
    pub(crate) counter: Option<Counter>,
}
