use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Optional performance metrics for the scheduler.
#[derive(Debug)]
pub struct Metrics {
    /// Total number of tasks completed.
    pub tasks_executed: AtomicU64,
    /// Total pops from local worker queues.
    pub local_queue_pops: AtomicU64,
    /// Successful steals from other workers.
    pub steals_success: AtomicU64,
    /// Steal scans that found every queue empty.
    pub steals_failed: AtomicU64,
    /// Fiber-to-fiber switches (parking waits and parked-fiber resumes).
    pub fiber_switches: AtomicU64,
    /// Waits that parked their fiber.
    pub waits_parked: AtomicU64,
    /// Waits satisfied without a fiber switch.
    pub waits_fast_path: AtomicU64,
    /// Parked pinned fibers resumed on their own worker.
    pub pinned_resumes: AtomicU64,
    /// Parked unpinned fibers resumed through a ready list.
    pub ready_resumes: AtomicU64,
    /// Time when metrics collection started.
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tasks_executed: AtomicU64::new(0),
            local_queue_pops: AtomicU64::new(0),
            steals_success: AtomicU64::new(0),
            steals_failed: AtomicU64::new(0),
            fiber_switches: AtomicU64::new(0),
            waits_parked: AtomicU64::new(0),
            waits_fast_path: AtomicU64::new(0),
            pinned_resumes: AtomicU64::new(0),
            ready_resumes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Returns a snapshot of current metrics values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            local_queue_pops: self.local_queue_pops.load(Ordering::Relaxed),
            steals_success: self.steals_success.load(Ordering::Relaxed),
            steals_failed: self.steals_failed.load(Ordering::Relaxed),
            fiber_switches: self.fiber_switches.load(Ordering::Relaxed),
            waits_parked: self.waits_parked.load(Ordering::Relaxed),
            waits_fast_path: self.waits_fast_path.load(Ordering::Relaxed),
            pinned_resumes: self.pinned_resumes.load(Ordering::Relaxed),
            ready_resumes: self.ready_resumes.load(Ordering::Relaxed),
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub tasks_executed: u64,
    pub local_queue_pops: u64,
    pub steals_success: u64,
    pub steals_failed: u64,
    pub fiber_switches: u64,
    pub waits_parked: u64,
    pub waits_fast_path: u64,
    pub pinned_resumes: u64,
    pub ready_resumes: u64,
    pub elapsed_seconds: f64,
}

impl MetricsSnapshot {
    /// Calculates tasks per second throughput.
    pub fn tasks_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.tasks_executed as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = Metrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_executed, 0);
        assert_eq!(snapshot.steals_success, 0);
        assert_eq!(snapshot.fiber_switches, 0);
        assert!(snapshot.elapsed_seconds >= 0.0);
    }

    #[test]
    fn test_metrics_updates_visible_in_snapshot() {
        let metrics = Metrics::new();

        metrics.tasks_executed.fetch_add(5, Ordering::Relaxed);
        metrics.waits_parked.fetch_add(2, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_executed, 5);
        assert_eq!(snapshot.waits_parked, 2);
    }

    #[test]
    fn test_throughput_calculation() {
        let metrics = Metrics::new();
        metrics.tasks_executed.fetch_add(100, Ordering::Relaxed);

        std::thread::sleep(std::time::Duration::from_millis(10));
        let snapshot = metrics.snapshot();

        assert!(snapshot.tasks_per_second() > 0.0);
    }
}
