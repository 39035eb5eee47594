pub mod adapter;
pub mod error;
pub mod simulation;
pub mod types;

pub use adapter::{ClientFactory, TransferClient};
pub use error::{TransferError, TransferErrorKind, TransferResult};
pub use simulation::{SimulatedClient, SimulatedTarget, SimulationProfile, TargetStats};
pub use types::{Endpoint, RunTarget, TransferName};
