use fibertask::{Counter, EmptyQueueBehavior, SchedulerParams, Task, TaskScheduler};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn test_params(thread_pool_size: usize) -> SchedulerParams {
    SchedulerParams {
        fiber_pool_size: 64,
        thread_pool_size,
        fiber_stack_size: 256 * 1024,
        thread_stack_size: 512 * 1024,
        empty_queue_behavior: EmptyQueueBehavior::Yield,
    }
}

#[test]
fn test_task_waits_for_its_subtasks() {
    let subtasks_done = Arc::new(AtomicUsize::new(0));
    let flag = Arc::new(AtomicBool::new(false));
    let subtasks_done_clone = subtasks_done.clone();
    let flag_clone = flag.clone();

    TaskScheduler::run(test_params(4), move |scheduler| {
        let outer = Counter::new();
        let subtasks_done = subtasks_done_clone.clone();
        let flag = flag_clone.clone();

        scheduler.add_task(
            Task::new(move |scheduler| {
                let inner = Counter::new();
                let subtasks = (0..10).map(|_| {
                    let subtasks_done = subtasks_done.clone();
                    Task::new(move |_| {
                        subtasks_done.fetch_add(1, Ordering::Relaxed);
                    })
                });
                scheduler.add_tasks(subtasks, Some(&inner));
                scheduler.wait_for_counter(&inner, 0, false);

                // Every subtask must be done before the flag flips.
                assert_eq!(subtasks_done.load(Ordering::Relaxed), 10);
                flag.store(true, Ordering::Release);
            }),
            Some(&outer),
        );

        scheduler.wait_for_counter(&outer, 0, false);
        assert!(flag_clone.load(Ordering::Acquire));
    })
    .unwrap();

    assert_eq!(subtasks_done.load(Ordering::Relaxed), 10);
    assert!(flag.load(Ordering::Acquire));
}

#[test]
fn test_nesting_depth_does_not_alter_correctness() {
    let leaves = Arc::new(AtomicUsize::new(0));
    let leaves_clone = leaves.clone();

    fn spawn_level(
        scheduler: &TaskScheduler,
        depth: usize,
        fan_out: usize,
        leaves: Arc<AtomicUsize>,
    ) {
        let counter = Counter::new();
        let tasks = (0..fan_out).map(|_| {
            let leaves = leaves.clone();
            Task::new(move |scheduler| {
                if depth == 0 {
                    leaves.fetch_add(1, Ordering::Relaxed);
                } else {
                    spawn_level(scheduler, depth - 1, fan_out, leaves);
                }
            })
        });
        scheduler.add_tasks(tasks, Some(&counter));
        scheduler.wait_for_counter(&counter, 0, false);
    }

    TaskScheduler::run(test_params(4), move |scheduler| {
        // Three levels of fan-out 4: 64 leaves.
        spawn_level(scheduler, 2, 4, leaves_clone);
    })
    .unwrap();

    assert_eq!(leaves.load(Ordering::Relaxed), 64);
}
