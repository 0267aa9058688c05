use fibertask::{Counter, EmptyQueueBehavior, SchedulerParams, Task, TaskScheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
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
fn test_fan_out_fan_in() {
    let executed = Arc::new(AtomicUsize::new(0));
    let executed_clone = executed.clone();

    TaskScheduler::run(test_params(4), move |scheduler| {
        let counter = Counter::new();
        let tasks = (0..1000).map(|_| {
            let executed = executed_clone.clone();
            Task::new(move |_| {
                executed.fetch_add(1, Ordering::Relaxed);
            })
        });
        scheduler.add_tasks(tasks, Some(&counter));
        scheduler.wait_for_counter(&counter, 0, false);

        assert_eq!(counter.load(), 0);
    })
    .unwrap();

    assert_eq!(executed.load(Ordering::Relaxed), 1000);
}

#[test]
fn test_single_submissions_match_batch_submission() {
    let executed = Arc::new(AtomicUsize::new(0));
    let executed_clone = executed.clone();

    TaskScheduler::run(test_params(4), move |scheduler| {
        // N individual submissions, each tracked and awaited on its own.
        for _ in 0..100 {
            let executed = executed_clone.clone();
            let counter = Counter::new();
            scheduler.add_task(
                Task::new(move |_| {
                    executed.fetch_add(1, Ordering::Relaxed);
                }),
                Some(&counter),
            );
            scheduler.wait_for_counter(&counter, 0, false);
        }
        assert_eq!(executed_clone.load(Ordering::Relaxed), 100);

        // One batch submission of the same size.
        let batch_counter = Counter::new();
        let tasks = (0..100).map(|_| {
            let executed = executed_clone.clone();
            Task::new(move |_| {
                executed.fetch_add(1, Ordering::Relaxed);
            })
        });
        scheduler.add_tasks(tasks, Some(&batch_counter));
        scheduler.wait_for_counter(&batch_counter, 0, false);
    })
    .unwrap();

    assert_eq!(executed.load(Ordering::Relaxed), 200);
}

#[test]
fn test_every_task_runs_exactly_once() {
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..500).map(|_| AtomicUsize::new(0)).collect());
    let runs_clone = runs.clone();

    TaskScheduler::run(test_params(4), move |scheduler| {
        let counter = Counter::new();
        let tasks = (0..500).map(|i| {
            let runs = runs_clone.clone();
            Task::new(move |_| {
                runs[i].fetch_add(1, Ordering::Relaxed);
            })
        });
        scheduler.add_tasks(tasks, Some(&counter));
        scheduler.wait_for_counter(&counter, 0, false);
    })
    .unwrap();

    for (i, count) in runs.iter().enumerate() {
        assert_eq!(count.load(Ordering::Relaxed), 1, "task {} run count", i);
    }
}
