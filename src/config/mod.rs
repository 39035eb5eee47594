//! Run configuration
//!
//! Raw inputs arrive as [`HarnessOptions`] (from the CLI or built in code) and
//! are validated once into an immutable [`HarnessConfig`] that every worker
//! shares read-only.

pub mod cli;
pub mod error;

pub use cli::Args;
pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

use crate::client::Endpoint;

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_PORT: u32 = 69;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_FILE_SIZE: usize = 512;
pub const DEFAULT_REPEAT_COUNT: u64 = 1000;
pub const DEFAULT_NAME_PREFIX: &str = "test";

/// Largest file a 16-bit block counter can carry in 512-byte blocks. The
/// final block must be short, so a full 65535th block does not fit.
pub const MAX_FILE_SIZE: usize = 65_535 * 512 - 1;

/// What a worker does after a cycle fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the failure and run the next cycle
    #[default]
    Continue,
    /// Record the failure and stop this worker; other workers carry on
    AbortWorker,
}

/// Unvalidated run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessOptions {
    pub hostname: String,
    /// Wider than `u16` so out-of-range ports are reported, not truncated
    pub port: u32,
    pub num_workers: usize,
    pub file_size: usize,
    pub repeat_count: u64,
    pub name_prefix: String,
    pub failure_policy: FailurePolicy,
    /// Cap on cycles started per second across all workers
    pub cycles_per_second: Option<u32>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            num_workers: DEFAULT_WORKERS,
            file_size: DEFAULT_FILE_SIZE,
            repeat_count: DEFAULT_REPEAT_COUNT,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            failure_policy: FailurePolicy::Continue,
            cycles_per_second: None,
        }
    }
}

impl HarnessOptions {
    pub fn validate(self) -> ConfigResult<HarnessConfig> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::EmptyHostname);
        }
        let port = u16::try_from(self.port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ConfigError::InvalidPort(self.port))?;
        if self.num_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.file_size > MAX_FILE_SIZE {
            return Err(ConfigError::FileTooLarge {
                size: self.file_size,
                max: MAX_FILE_SIZE,
            });
        }
        if self.repeat_count == 0 {
            return Err(ConfigError::NoRepetitions);
        }
        if self.name_prefix.is_empty() {
            return Err(ConfigError::EmptyNamePrefix);
        }
        let cycles_per_second = match self.cycles_per_second {
            Some(rate) => Some(NonZeroU32::new(rate).ok_or(ConfigError::ZeroRate)?),
            None => None,
        };

        Ok(HarnessConfig {
            endpoint: Endpoint::new(self.hostname, port),
            num_workers: self.num_workers,
            file_size: self.file_size,
            repeat_count: self.repeat_count,
            name_prefix: self.name_prefix,
            failure_policy: self.failure_policy,
            cycles_per_second,
        })
    }
}

/// Validated, read-only run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessConfig {
    endpoint: Endpoint,
    num_workers: usize,
    file_size: usize,
    repeat_count: u64,
    name_prefix: String,
    failure_policy: FailurePolicy,
    cycles_per_second: Option<NonZeroU32>,
}

impl HarnessConfig {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn file_size(&self) -> usize {
        self.file_size
    }

    pub fn repeat_count(&self) -> u64 {
        self.repeat_count
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn cycles_per_second(&self) -> Option<NonZeroU32> {
        self.cycles_per_second
    }

    /// Cycles a run performs when nothing aborts or cancels it
    pub fn planned_cycles(&self) -> u64 {
        self.num_workers as u64 * self.repeat_count
    }
}
