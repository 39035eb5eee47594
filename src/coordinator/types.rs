use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::client::{Endpoint, RunTarget, TransferErrorKind, TransferName};
use crate::worker::{CycleOutcome, TransferPhase, WorkerExit, WorkerOutcome};

/// Category of a failed cycle as shown to an operator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConnectionFailed,
    Timeout,
    RemoteRejected,
    ProtocolViolation,
    VerificationMismatch,
}

impl FailureKind {
    /// Transport failures, as opposed to data corruption
    pub fn is_transport(&self) -> bool {
        !matches!(self, FailureKind::VerificationMismatch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConnectionFailed => "connection_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::RemoteRejected => "remote_rejected",
            FailureKind::ProtocolViolation => "protocol_violation",
            FailureKind::VerificationMismatch => "verification_mismatch",
        }
    }
}

impl From<TransferErrorKind> for FailureKind {
    fn from(kind: TransferErrorKind) -> Self {
        match kind {
            TransferErrorKind::ConnectionFailed => FailureKind::ConnectionFailed,
            TransferErrorKind::Timeout => FailureKind::Timeout,
            TransferErrorKind::RemoteRejected => FailureKind::RemoteRejected,
            TransferErrorKind::ProtocolViolation => FailureKind::ProtocolViolation,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how one cycle failed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureDetail {
    pub worker_id: usize,
    pub cycle_index: u64,
    pub name: TransferName,
    pub kind: FailureKind,
    pub phase: Option<TransferPhase>,
    pub message: String,
}

impl FailureDetail {
    fn from_outcome(worker_id: usize, outcome: &CycleOutcome, expected_checksum: &str) -> Option<Self> {
        if outcome.success {
            return None;
        }
        let detail = match &outcome.error {
            Some(error) => Self {
                worker_id,
                cycle_index: outcome.cycle_index,
                name: outcome.name.clone(),
                kind: error.kind.into(),
                phase: Some(error.phase),
                message: error.message.clone(),
            },
            None => Self {
                worker_id,
                cycle_index: outcome.cycle_index,
                name: outcome.name.clone(),
                kind: FailureKind::VerificationMismatch,
                phase: None,
                message: format!(
                    "expected blake3 {}, received {}",
                    expected_checksum,
                    outcome.received_checksum.as_deref().unwrap_or("unknown")
                ),
            },
        };
        Some(detail)
    }
}

/// A cycle outcome tagged with the worker that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCycle {
    pub worker_id: usize,
    pub outcome: CycleOutcome,
}

/// Final, immutable description of a run
#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub run_id: Uuid,
    pub endpoint: Endpoint,
    /// What the clients actually exercised; may differ from `endpoint`
    pub target: RunTarget,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub num_workers: usize,
    pub file_size: usize,
    pub total_cycles: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub transport_failures: u64,
    pub verification_failures: u64,
    pub failures_by_kind: BTreeMap<FailureKind, u64>,
    pub cancelled: bool,
    pub aborted_workers: Vec<usize>,
    pub crashed_workers: Vec<usize>,
    pub mean_cycle_time: Duration,
    pub max_cycle_time: Duration,
    /// Ordered by worker id, then cycle index
    pub failure_details: Vec<FailureDetail>,
    #[serde(skip)]
    pub cycles: Vec<WorkerCycle>,
}

impl HarnessReport {
    /// True when every recorded cycle succeeded and every worker joined cleanly
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.crashed_workers.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn cycles_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_cycles as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RunTarget::Simulated => writeln!(
                f,
                "Stress run {} against simulated target ({} not contacted)",
                self.run_id, self.endpoint
            )?,
            RunTarget::Remote(endpoint) => {
                writeln!(f, "Stress run {} against {}", self.run_id, endpoint)?
            }
        }
        writeln!(f, "{}", "-".repeat(60))?;
        writeln!(
            f,
            "Workers:        {} ({} bytes per file)",
            self.num_workers, self.file_size
        )?;
        writeln!(
            f,
            "Cycles:         {} total, {} succeeded, {} failed",
            self.total_cycles, self.succeeded, self.failed
        )?;
        writeln!(
            f,
            "Failures:       {} transport, {} verification",
            self.transport_failures, self.verification_failures
        )?;
        for (kind, count) in &self.failures_by_kind {
            writeln!(f, "  {:<22} {}", kind, count)?;
        }
        writeln!(
            f,
            "Elapsed:        {:.2}s ({:.1} cycles/s, mean {:.1}ms, max {:.1}ms)",
            self.elapsed.as_secs_f64(),
            self.cycles_per_second(),
            self.mean_cycle_time.as_secs_f64() * 1000.0,
            self.max_cycle_time.as_secs_f64() * 1000.0
        )?;
        if self.cancelled {
            writeln!(f, "Cancelled:      yes, partial results")?;
        }
        if !self.aborted_workers.is_empty() {
            writeln!(f, "Aborted:        workers {:?}", self.aborted_workers)?;
        }
        if !self.crashed_workers.is_empty() {
            writeln!(f, "Crashed:        workers {:?}", self.crashed_workers)?;
        }
        if !self.failure_details.is_empty() {
            writeln!(f, "\n{:<8} | {:<8} | {:<24} | {:<9} | Message", "Worker", "Cycle", "Kind", "Phase")?;
            writeln!(f, "{}", "-".repeat(72))?;
            for detail in &self.failure_details {
                let phase = detail.phase.map(|p| p.to_string()).unwrap_or_else(|| "verify".into());
                writeln!(
                    f,
                    "{:>8} | {:>8} | {:<24} | {:<9} | {}",
                    detail.worker_id, detail.cycle_index, detail.kind, phase, detail.message
                )?;
            }
        }
        write!(f, "Result:         {}", if self.is_success() { "PASS" } else { "FAIL" })
    }
}

/// Merges per-worker results into a [`HarnessReport`], in worker order
pub(crate) struct ReportBuilder {
    run_id: Uuid,
    endpoint: Endpoint,
    target: RunTarget,
    started_at: DateTime<Utc>,
    num_workers: usize,
    file_size: usize,
    expected_checksum: String,
    succeeded: u64,
    failures_by_kind: BTreeMap<FailureKind, u64>,
    aborted_workers: Vec<usize>,
    crashed_workers: Vec<usize>,
    cancelled: bool,
    total_cycle_time: Duration,
    max_cycle_time: Duration,
    failure_details: Vec<FailureDetail>,
    cycles: Vec<WorkerCycle>,
}

impl ReportBuilder {
    pub(crate) fn new(
        run_id: Uuid,
        endpoint: Endpoint,
        target: RunTarget,
        started_at: DateTime<Utc>,
        num_workers: usize,
        file_size: usize,
        expected_checksum: String,
    ) -> Self {
        Self {
            run_id,
            endpoint,
            target,
            started_at,
            num_workers,
            file_size,
            expected_checksum,
            succeeded: 0,
            failures_by_kind: BTreeMap::new(),
            aborted_workers: Vec::new(),
            crashed_workers: Vec::new(),
            cancelled: false,
            total_cycle_time: Duration::ZERO,
            max_cycle_time: Duration::ZERO,
            failure_details: Vec::new(),
            cycles: Vec::new(),
        }
    }

    pub(crate) fn add_worker(&mut self, worker: WorkerOutcome) {
        match worker.exit {
            WorkerExit::Completed => {}
            WorkerExit::Aborted => self.aborted_workers.push(worker.worker_id),
            WorkerExit::Cancelled => self.cancelled = true,
        }

        for outcome in worker.cycles {
            self.total_cycle_time += outcome.elapsed;
            self.max_cycle_time = self.max_cycle_time.max(outcome.elapsed);

            if outcome.success {
                self.succeeded += 1;
            } else if let Some(detail) =
                FailureDetail::from_outcome(worker.worker_id, &outcome, &self.expected_checksum)
            {
                *self.failures_by_kind.entry(detail.kind).or_insert(0) += 1;
                self.failure_details.push(detail);
            }

            self.cycles.push(WorkerCycle {
                worker_id: worker.worker_id,
                outcome,
            });
        }
    }

    pub(crate) fn add_crashed(&mut self, worker_id: usize) {
        self.crashed_workers.push(worker_id);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn finish(self, elapsed: Duration) -> HarnessReport {
        let total_cycles = self.cycles.len() as u64;
        let failed = total_cycles - self.succeeded;
        let (transport, verification): (Vec<_>, Vec<_>) = self
            .failures_by_kind
            .iter()
            .partition(|(kind, _)| kind.is_transport());
        let transport_failures: u64 = transport.into_iter().map(|(_, count)| count).sum();
        let verification_failures: u64 = verification.into_iter().map(|(_, count)| count).sum();
        let mean_cycle_time = if total_cycles > 0 {
            Duration::from_secs_f64(self.total_cycle_time.as_secs_f64() / total_cycles as f64)
        } else {
            Duration::ZERO
        };

        HarnessReport {
            run_id: self.run_id,
            endpoint: self.endpoint,
            target: self.target,
            started_at: self.started_at,
            finished_at: Utc::now(),
            elapsed,
            num_workers: self.num_workers,
            file_size: self.file_size,
            total_cycles,
            succeeded: self.succeeded,
            failed,
            transport_failures,
            verification_failures,
            failures_by_kind: self.failures_by_kind,
            cancelled: self.cancelled,
            aborted_workers: self.aborted_workers,
            crashed_workers: self.crashed_workers,
            mean_cycle_time,
            max_cycle_time: self.max_cycle_time,
            failure_details: self.failure_details,
            cycles: self.cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TransferError;
    use crate::worker::CycleError;

    fn name(worker: usize, cycle: u64) -> TransferName {
        TransferName::for_cycle("test", worker, cycle)
    }

    fn builder() -> ReportBuilder {
        builder_for(RunTarget::Remote(Endpoint::new("localhost", 69)))
    }

    fn builder_for(target: RunTarget) -> ReportBuilder {
        ReportBuilder::new(
            Uuid::new_v4(),
            Endpoint::new("localhost", 69),
            target,
            Utc::now(),
            2,
            10,
            "abcd".into(),
        )
    }

    #[test]
    fn test_merge_counts_and_categories() {
        let mut builder = builder();
        builder.add_worker(WorkerOutcome {
            worker_id: 0,
            exit: WorkerExit::Completed,
            cycles: vec![
                CycleOutcome::succeeded(0, name(0, 0), Duration::from_millis(4)),
                CycleOutcome::transport_failure(
                    1,
                    name(0, 1),
                    CycleError::new(TransferPhase::Download, &TransferError::file_not_found()),
                    Duration::from_millis(2),
                ),
            ],
        });
        builder.add_worker(WorkerOutcome {
            worker_id: 1,
            exit: WorkerExit::Completed,
            cycles: vec![
                CycleOutcome::mismatch(0, name(1, 0), "ffff".into(), Duration::from_millis(6)),
                CycleOutcome::succeeded(1, name(1, 1), Duration::from_millis(4)),
            ],
        });

        let report = builder.finish(Duration::from_secs(1));

        assert_eq!(report.total_cycles, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.transport_failures, 1);
        assert_eq!(report.verification_failures, 1);
        assert_eq!(report.failures_by_kind[&FailureKind::RemoteRejected], 1);
        assert_eq!(report.mean_cycle_time, Duration::from_millis(4));
        assert_eq!(report.max_cycle_time, Duration::from_millis(6));
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), 1);

        let located: Vec<(usize, u64)> = report
            .failure_details
            .iter()
            .map(|d| (d.worker_id, d.cycle_index))
            .collect();
        assert_eq!(located, vec![(0, 1), (1, 0)]);
        assert_eq!(report.failure_details[1].message, "expected blake3 abcd, received ffff");
    }

    #[test]
    fn test_crashed_worker_fails_run() {
        let mut builder = builder();
        builder.add_worker(WorkerOutcome {
            worker_id: 0,
            exit: WorkerExit::Completed,
            cycles: vec![CycleOutcome::succeeded(0, name(0, 0), Duration::ZERO)],
        });
        builder.add_crashed(1);

        let report = builder.finish(Duration::ZERO);
        assert_eq!(report.failed, 0);
        assert!(!report.is_success());
        assert_eq!(report.crashed_workers, vec![1]);
        assert_eq!(report.cycles_per_second(), 0.0);
    }

    #[test]
    fn test_empty_report_passes() {
        let report = builder().finish(Duration::from_millis(10));
        assert_eq!(report.total_cycles, 0);
        assert_eq!(report.mean_cycle_time, Duration::ZERO);
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_summary_lists_failures() {
        let mut builder = builder();
        builder.add_worker(WorkerOutcome {
            worker_id: 1,
            exit: WorkerExit::Aborted,
            cycles: vec![CycleOutcome::transport_failure(
                7,
                name(1, 7),
                CycleError::new(
                    TransferPhase::Upload,
                    &TransferError::Timeout(Duration::from_secs(1)),
                ),
                Duration::ZERO,
            )],
        });

        let text = builder.finish(Duration::from_secs(2)).to_string();
        assert!(text.contains("1 total, 0 succeeded, 1 failed"));
        assert!(text.contains("1 transport, 0 verification"));
        assert!(text.contains("timeout"));
        assert!(text.contains("upload"));
        assert!(text.contains("Aborted:        workers [1]"));
        assert!(text.ends_with("FAIL"));
    }

    #[test]
    fn test_report_serializes_without_cycles() {
        let mut builder = builder();
        builder.add_worker(WorkerOutcome {
            worker_id: 0,
            exit: WorkerExit::Cancelled,
            cycles: vec![CycleOutcome::succeeded(0, name(0, 0), Duration::ZERO)],
        });
        let report = builder.finish(Duration::from_secs(1));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_cycles"], 1);
        assert_eq!(json["cancelled"], true);
        assert!(json.get("cycles").is_none());
    }

    #[test]
    fn test_header_names_remote_endpoint() {
        let report = builder().finish(Duration::ZERO);
        let text = report.to_string();

        let header = text.lines().next().unwrap();
        assert!(header.starts_with("Stress run "));
        assert!(header.ends_with(" against localhost:69"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["target"]["remote"]["hostname"], "localhost");
        assert_eq!(json["target"]["remote"]["port"], 69);
    }

    #[test]
    fn test_header_flags_simulated_run() {
        let report = builder_for(RunTarget::Simulated).finish(Duration::ZERO);
        let text = report.to_string();

        let header = text.lines().next().unwrap();
        assert!(header.ends_with(" against simulated target (localhost:69 not contacted)"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["target"], "simulated");
        assert_eq!(json["endpoint"]["hostname"], "localhost");
    }
}
