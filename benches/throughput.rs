//! Task throughput benchmark using criterion.
//!
//! Measures fan-out/fan-in throughput through the full scheduler path:
//! submission, work stealing, counter decrement, and the final wait.

use criterion::{criterion_group, criterion_main, Criterion};
use fibertask::{Counter, EmptyQueueBehavior, SchedulerParams, Task, TaskScheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn bench_params() -> SchedulerParams {
    SchedulerParams {
        fiber_pool_size: 128,
        thread_pool_size: 4,
        fiber_stack_size: 512 * 1024,
        thread_stack_size: 512 * 1024,
        empty_queue_behavior: EmptyQueueBehavior::Spin,
    }
}

fn fan_out(num_tasks: usize) {
    let executed = Arc::new(AtomicUsize::new(0));
    let executed_clone = executed.clone();

    TaskScheduler::run(bench_params(), move |scheduler| {
        let counter = Counter::new();
        let tasks = (0..num_tasks).map(|_| {
            let executed = executed_clone.clone();
            Task::new(move |_| {
                executed.fetch_add(1, Ordering::Relaxed);
            })
        });
        scheduler.add_tasks(tasks, Some(&counter));
        scheduler.wait_for_counter(&counter, 0, false);
    })
    .unwrap();

    assert_eq!(executed.load(Ordering::Relaxed), num_tasks);
}

fn throughput_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.sample_size(20);

    group.bench_function("fan_out_10k", |b| b.iter(|| fan_out(10_000)));

    group.finish();
}

criterion_group!(benches, throughput_benchmark);
criterion_main!(benches);
