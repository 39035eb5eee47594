//! Metrics recorder for harness cycles

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    describe_counter!("stress_cycles_started_total", "Upload/download cycles started");
    describe_counter!(
        "stress_cycles_succeeded_total",
        "Cycles whose download matched the upload"
    );
    describe_counter!(
        "stress_cycles_failed_total",
        "Cycles that failed, labelled by failure kind"
    );
    describe_counter!("stress_bytes_uploaded_total", "Payload bytes uploaded");
    describe_counter!("stress_bytes_downloaded_total", "Payload bytes downloaded");

    describe_gauge!("stress_active_workers", "Workers currently running cycles");

    describe_histogram!(
        "stress_cycle_duration_seconds",
        "Time for one upload plus its download"
    );
}

pub fn record_cycle_started(worker_id: usize) {
    counter!("stress_cycles_started_total", "worker" => worker_id.to_string()).increment(1);
}

pub fn record_cycle_succeeded(worker_id: usize) {
    counter!("stress_cycles_succeeded_total", "worker" => worker_id.to_string()).increment(1);
}

pub fn record_cycle_failed(worker_id: usize, kind: &str) {
    counter!("stress_cycles_failed_total", "worker" => worker_id.to_string(), "kind" => kind.to_string()).increment(1);
}

pub fn record_upload(bytes: usize) {
    counter!("stress_bytes_uploaded_total").increment(bytes as u64);
}

pub fn record_download(bytes: usize) {
    counter!("stress_bytes_downloaded_total").increment(bytes as u64);
}

pub fn record_cycle_duration(duration: Duration) {
    histogram!("stress_cycle_duration_seconds").record(duration.as_secs_f64());
}

/// Times one cycle; the duration is recorded on [`CycleTimer::stop`]
pub struct CycleTimer {
    start_time: Instant,
}

impl CycleTimer {
    pub fn start(worker_id: usize) -> Self {
        record_cycle_started(worker_id);
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn stop(self) -> Duration {
        let elapsed = self.start_time.elapsed();
        record_cycle_duration(elapsed);
        elapsed
    }
}

/// Holds the active-worker gauge up for as long as it lives
pub struct WorkerGauge;

impl WorkerGauge {
    pub fn enter() -> Self {
        gauge!("stress_active_workers").increment(1.0);
        Self
    }
}

impl Drop for WorkerGauge {
    fn drop(&mut self) {
        gauge!("stress_active_workers").decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        // Should not panic when called multiple times
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_cycle_timer() {
        let timer = CycleTimer::start(0);
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        assert!(timer.stop() >= Duration::from_millis(10));
    }

    #[test]
    fn test_worker_gauge_drop() {
        let gauge = WorkerGauge::enter();
        drop(gauge); // Should not panic without a recorder
    }
}
