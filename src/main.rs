use fibertask::{Counter, SchedulerParams, Task, TaskScheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

fn main() {
    println!("fibertask - Fiber-Based Task Scheduler\n");

    let params = SchedulerParams::default();
    TaskScheduler::run(params, |scheduler| {
        println!(
            "Running with {} worker threads\n",
            scheduler.num_threads()
        );

        // Example 1: a single task
        println!("Example 1: Single task");
        let counter = Counter::new();
        scheduler.add_task(
            Task::new(|_| println!("  Hello from a fiber task!")),
            Some(&counter),
        );
        scheduler.wait_for_counter(&counter, 0, false);
        println!("  Task completed\n");

        // Example 2: fan-out / fan-in
        println!("Example 2: Parallel fan-out");
        let sum = Arc::new(AtomicUsize::new(0));
        let num_tasks = 1000;

        let start = Instant::now();
        let counter = Counter::new();
        let tasks = (0..num_tasks).map(|i| {
            let sum = sum.clone();
            Task::new(move |_| {
                sum.fetch_add(i, Ordering::Relaxed);
            })
        });
        scheduler.add_tasks(tasks, Some(&counter));
        scheduler.wait_for_counter(&counter, 0, false);

        let expected: usize = (0..num_tasks).sum();
        println!("  Executed {} tasks in {:?}", num_tasks, start.elapsed());
        println!(
            "  Sum result: {} (expected: {})\n",
            sum.load(Ordering::Relaxed),
            expected
        );

        // Example 3: nested subtasks
        println!("Example 3: Nested subtasks");
        let done = Arc::new(AtomicUsize::new(0));
        let done_clone = done.clone();
        let outer = Counter::new();
        scheduler.add_task(
            Task::new(move |scheduler| {
                let inner = Counter::new();
                let subtasks = (0..10).map(|_| {
                    let done = done_clone.clone();
                    Task::new(move |_| {
                        done.fetch_add(1, Ordering::Relaxed);
                    })
                });
                scheduler.add_tasks(subtasks, Some(&inner));
                scheduler.wait_for_counter(&inner, 0, false);
            }),
            Some(&outer),
        );
        scheduler.wait_for_counter(&outer, 0, false);
        println!("  {} subtasks completed\n", done.load(Ordering::Relaxed));
    })
    .expect("scheduler failed to start");

    println!("Scheduler shut down cleanly");
}
