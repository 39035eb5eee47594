//! Concurrent load generator for file-transfer servers.
//!
//! A run spawns a number of workers, each owning its own transfer client and
//! repeatedly uploading a deterministic payload under a unique name, then
//! downloading it back and checking the bytes. The coordinator joins every
//! worker and folds their outcomes into a single [`HarnessReport`].
//!
//! The transfer protocol itself lives behind [`TransferClient`] and
//! [`ClientFactory`]; [`SimulatedTarget`] provides an in-process target.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod logging;
pub mod metrics;
pub mod payload;
pub mod worker;

pub use client::{
    ClientFactory, Endpoint, RunTarget, SimulatedTarget, SimulationProfile, TransferClient,
    TransferError, TransferErrorKind, TransferName,
};
pub use config::{FailurePolicy, HarnessConfig, HarnessOptions};
pub use coordinator::{CancelHandle, HarnessCoordinator, HarnessError, HarnessReport};
pub use payload::{generate, Payload};
