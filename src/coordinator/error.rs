use thiserror::Error;

/// Errors that end a run before or instead of producing a report.
///
/// Per-cycle failures never show up here; they are data in the report.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(#[from] crate::config::ConfigError),

    #[error("Cannot resolve {endpoint}: {source}")]
    UnresolvableHost {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create client for worker {worker_id}: {source}")]
    ClientConstruction {
        worker_id: usize,
        #[source]
        source: crate::client::TransferError,
    },

    #[error(
        "No transfer client configured for {endpoint}; pass --simulate to run against the in-process target"
    )]
    NoTransferClient { endpoint: String },

    #[error("Metrics error: {0}")]
    Metrics(#[from] crate::metrics::MetricsError),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
