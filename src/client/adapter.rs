//! Contract between the harness and a transfer-protocol client
//!
//! The harness never looks inside the protocol. It hands a client a name and
//! bytes, and observes success, failure, and the bytes that came back.

use async_trait::async_trait;

use super::error::TransferResult;
use super::types::{Endpoint, RunTarget, TransferName};
use crate::payload::Payload;

/// One protocol client, owned by exactly one worker for its whole lifetime.
///
/// Each call is a single logical attempt. Retransmission, block
/// acknowledgement and per-call timeouts are the implementation's business.
#[async_trait]
pub trait TransferClient: Send {
    /// Store `data` on the target under `name`
    async fn upload(&mut self, name: &TransferName, data: Payload) -> TransferResult<()>;

    /// Fetch the content stored under `name`
    async fn download(&mut self, name: &TransferName) -> TransferResult<Payload>;
}

/// Builds one client per worker.
///
/// Construction errors are fatal to the run: the coordinator builds every
/// client before the first worker starts.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    type Client: TransferClient + 'static;

    async fn connect(&self, endpoint: &Endpoint, worker_id: usize) -> TransferResult<Self::Client>;

    /// What the built clients talk to. Stand-ins that never reach
    /// `endpoint` must say so, since the report names this target.
    fn target(&self, endpoint: &Endpoint) -> RunTarget {
        RunTarget::Remote(endpoint.clone())
    }
}
