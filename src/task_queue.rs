//! Per-worker work-stealing task queues.
//!
//! Each worker owns one queue. The owner pushes and pops at the bottom; any
//! other worker may steal from the top through a [`TaskStealer`] handle. The
//! deque itself is `crossbeam`'s Chase-Lev implementation, created LIFO so
//! that the owner works on the freshest task while thieves drain the oldest.

use crossbeam::deque::{Steal, Stealer, Worker};

/// The owner-side handle of a work-stealing queue.
pub(crate) struct TaskQueue<T> {
    inner: Worker<T>,
}

impl<T> TaskQueue<T> {
    pub(crate) fn new() -> Self {
        TaskQueue {
            inner: Worker::new_lifo(),
        }
    }

    /// Appends at the bottom. Owner-only.
    pub(crate) fn push(&self, item: T) {
        self.inner.push(item);
    }

    /// Removes from the bottom. Owner-only; loses to a concurrent steal when
    /// the queue is down to its last item.
    pub(crate) fn pop(&self) -> Option<T> {
        self.inner.pop()
    }

    /// Creates a thief-side handle that removes from the top.
    pub(crate) fn stealer(&self) -> TaskStealer<T> {
        TaskStealer {
            inner: self.inner.stealer(),
        }
    }
}

/// The thief-side handle of a work-stealing queue.
pub(crate) struct TaskStealer<T> {
    inner: Stealer<T>,
}

impl<T> TaskStealer<T> {
    /// Removes from the top. A lost CAS race counts as a miss; the caller
    /// moves on to the next victim rather than retrying.
    pub(crate) fn steal(&self) -> Option<T> {
        match self.inner.steal() {
            Steal::Success(item) => Some(item),
            Steal::Empty | Steal::Retry => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_pops_lifo() {
        let queue = TaskQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_thief_steals_fifo() {
        let queue = TaskQueue::new();
        let stealer = queue.stealer();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(stealer.steal(), Some(1));
        assert_eq!(stealer.steal(), Some(2));
        assert_eq!(stealer.steal(), Some(3));
        assert_eq!(stealer.steal(), None);
    }

    #[test]
    fn test_steal_from_empty_queue() {
        let queue: TaskQueue<i32> = TaskQueue::new();
        let stealer = queue.stealer();
        assert_eq!(stealer.steal(), None);
    }

    #[test]
    fn test_owner_and_thief_observe_each_item_once() {
        let queue = TaskQueue::new();
        let stealer = queue.stealer();
        for i in 0..100 {
            queue.push(i);
        }

        let mut seen = Vec::new();
        loop {
            match (queue.pop(), stealer.steal()) {
                (None, None) => break,
                (popped, stolen) => {
                    seen.extend(popped);
                    seen.extend(stolen);
                }
            }
        }

        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }
}
