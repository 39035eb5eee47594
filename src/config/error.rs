use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Hostname must not be empty")]
    EmptyHostname,

    #[error("Port {0} is outside 1-65535")]
    InvalidPort(u32),

    #[error("Number of workers must be at least 1")]
    NoWorkers,

    #[error("File size {size} exceeds the {max}-byte transfer limit")]
    FileTooLarge { size: usize, max: usize },

    #[error("Repeat count must be at least 1")]
    NoRepetitions,

    #[error("File name prefix must not be empty")]
    EmptyNamePrefix,

    #[error("Rate limit must be at least 1 cycle per second")]
    ZeroRate,

    #[error("Invalid {field}: {reason}")]
    InvalidSimulation { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
