use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::client::{TransferError, TransferErrorKind, TransferName};

/// Which half of a cycle an error came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    Upload,
    Download,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferPhase::Upload => f.write_str("upload"),
            TransferPhase::Download => f.write_str("download"),
        }
    }
}

/// Transport-level failure of one cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleError {
    pub phase: TransferPhase,
    pub kind: TransferErrorKind,
    pub message: String,
}

impl CycleError {
    pub fn new(phase: TransferPhase, error: &TransferError) -> Self {
        Self {
            phase,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result of one upload/download cycle.
///
/// `error` covers transport failures only. A download that succeeds with the
/// wrong bytes has no `error` but `bytes_matched == Some(false)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleOutcome {
    pub cycle_index: u64,
    pub name: TransferName,
    pub success: bool,
    pub error: Option<CycleError>,
    /// `None` when the cycle never got as far as a download
    pub bytes_matched: Option<bool>,
    /// Short BLAKE3 digest of what came back, kept only for mismatches
    pub received_checksum: Option<String>,
    pub elapsed: Duration,
}

impl CycleOutcome {
    pub fn succeeded(cycle_index: u64, name: TransferName, elapsed: Duration) -> Self {
        Self {
            cycle_index,
            name,
            success: true,
            error: None,
            bytes_matched: Some(true),
            received_checksum: None,
            elapsed,
        }
    }

    pub fn transport_failure(
        cycle_index: u64,
        name: TransferName,
        error: CycleError,
        elapsed: Duration,
    ) -> Self {
        Self {
            cycle_index,
            name,
            success: false,
            error: Some(error),
            bytes_matched: None,
            received_checksum: None,
            elapsed,
        }
    }

    pub fn mismatch(
        cycle_index: u64,
        name: TransferName,
        received_checksum: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            cycle_index,
            name,
            success: false,
            error: None,
            bytes_matched: Some(false),
            received_checksum: Some(received_checksum),
            elapsed,
        }
    }

    pub fn is_verification_failure(&self) -> bool {
        self.bytes_matched == Some(false)
    }
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkerExit {
    /// Ran every configured cycle
    Completed,
    /// Stopped after a failed cycle under the abort policy
    Aborted,
    /// Stopped because the run was cancelled
    Cancelled,
}

/// Everything a worker hands back at join time
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub worker_id: usize,
    pub exit: WorkerExit,
    pub cycles: Vec<CycleOutcome>,
}

impl WorkerOutcome {
    pub fn failed(&self) -> usize {
        self.cycles.iter().filter(|c| !c.success).count()
    }
}
