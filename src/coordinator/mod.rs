#[allow(clippy::module_inception)]
mod coordinator;
mod error;
mod types;

pub use coordinator::{CancelHandle, HarnessCoordinator};
pub use error::{HarnessError, HarnessResult};
pub use types::{FailureDetail, FailureKind, HarnessReport, WorkerCycle};
