//! Metrics and observability module
//!
//! Prometheus-compatible metrics for a running harness:
//! - Cycles started, succeeded and failed (by failure kind)
//! - Bytes uploaded and downloaded
//! - Active workers
//! - Cycle duration
//!
//! Recording is a no-op until [`start_metrics_server`] installs an exporter.

pub mod exporter;
pub mod recorder;

pub use exporter::{start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::{init_metrics, CycleTimer, WorkerGauge};
