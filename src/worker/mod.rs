pub mod pacer;
pub mod types;
#[allow(clippy::module_inception)]
pub mod worker;

pub use pacer::CyclePacer;
pub use types::{CycleError, CycleOutcome, TransferPhase, WorkerExit, WorkerOutcome};
pub use worker::Worker;
