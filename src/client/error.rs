use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single logical upload or download.
///
/// Retransmission and block-level recovery happen inside the client; by the
/// time one of these reaches a worker the whole operation has failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Remote rejected request (code {code}): {message}")]
    RemoteRejected { code: u16, message: String },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
}

impl TransferError {
    pub fn kind(&self) -> TransferErrorKind {
        match self {
            TransferError::ConnectionFailed(_) => TransferErrorKind::ConnectionFailed,
            TransferError::Timeout(_) => TransferErrorKind::Timeout,
            TransferError::RemoteRejected { .. } => TransferErrorKind::RemoteRejected,
            TransferError::ProtocolViolation(_) => TransferErrorKind::ProtocolViolation,
        }
    }

    pub fn file_not_found() -> Self {
        TransferError::RemoteRejected {
            code: 1,
            message: "File not found".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TransferErrorKind {
    ConnectionFailed,
    Timeout,
    RemoteRejected,
    ProtocolViolation,
}

impl TransferErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferErrorKind::ConnectionFailed => "connection_failed",
            TransferErrorKind::Timeout => "timeout",
            TransferErrorKind::RemoteRejected => "remote_rejected",
            TransferErrorKind::ProtocolViolation => "protocol_violation",
        }
    }
}

impl fmt::Display for TransferErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            TransferError::ConnectionFailed("refused".into()).kind(),
            TransferErrorKind::ConnectionFailed
        );
        assert_eq!(
            TransferError::Timeout(Duration::from_secs(1)).kind(),
            TransferErrorKind::Timeout
        );
        assert_eq!(
            TransferError::file_not_found().kind(),
            TransferErrorKind::RemoteRejected
        );
        assert_eq!(
            TransferError::ProtocolViolation("bad opcode".into()).kind(),
            TransferErrorKind::ProtocolViolation
        );
    }

    #[test]
    fn test_display() {
        let err = TransferError::file_not_found();
        assert_eq!(
            err.to_string(),
            "Remote rejected request (code 1): File not found"
        );
        assert_eq!(
            TransferError::Timeout(Duration::from_millis(250)).to_string(),
            "Timeout after 250ms"
        );
        assert_eq!(TransferErrorKind::Timeout.to_string(), "timeout");
    }
}
