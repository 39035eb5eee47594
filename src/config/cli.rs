use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use super::{
    FailurePolicy, HarnessOptions, DEFAULT_FILE_SIZE, DEFAULT_HOSTNAME, DEFAULT_NAME_PREFIX,
    DEFAULT_PORT, DEFAULT_REPEAT_COUNT, DEFAULT_WORKERS,
};
use crate::client::{SimulatedTarget, SimulationProfile};
use crate::config::error::{ConfigError, ConfigResult};
use crate::coordinator::{HarnessError, HarnessResult};

/// Saturate a file-transfer endpoint with concurrent upload/download cycles
#[derive(Parser, Debug, Clone)]
#[command(name = "tftp-stress", version, about)]
pub struct Args {
    /// Hostname to connect to
    #[arg(short = 'n', long, default_value = DEFAULT_HOSTNAME)]
    pub hostname: String,

    /// Port to connect to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u32,

    /// Number of concurrent workers
    #[arg(short = 't', long = "workers", default_value_t = DEFAULT_WORKERS)]
    pub num_workers: usize,

    /// Size in bytes of the file each cycle sends
    #[arg(short = 's', long, default_value_t = DEFAULT_FILE_SIZE)]
    pub file_size: usize,

    /// Upload/download cycles per worker
    #[arg(short = 'f', long = "repeat", default_value_t = DEFAULT_REPEAT_COUNT)]
    pub repeat_count: u64,

    /// Prefix for remote file names
    #[arg(long, default_value = DEFAULT_NAME_PREFIX)]
    pub name_prefix: String,

    /// What a worker does after a failed cycle
    #[arg(long, value_enum, default_value_t = FailurePolicy::Continue)]
    pub on_failure: FailurePolicy,

    /// Maximum cycles started per second across all workers
    #[arg(long)]
    pub rate: Option<u32>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Serve Prometheus metrics on this address while running
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Drive the in-process simulated target; no traffic reaches the endpoint
    #[arg(long)]
    pub simulate: bool,

    /// Simulated target: chance an operation is lost (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    pub loss_rate: f32,

    /// Simulated target: chance a download is corrupted (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    pub corruption_rate: f32,

    /// Simulated target: base latency per operation
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    /// Simulated target: random extra latency per operation
    #[arg(long, default_value_t = 0)]
    pub jitter_ms: u64,

    /// Simulated target: wait before a lost operation times out
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Simulated target: RNG seed for reproducible faults
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    pub fn harness_options(&self) -> HarnessOptions {
        HarnessOptions {
            hostname: self.hostname.clone(),
            port: self.port,
            num_workers: self.num_workers,
            file_size: self.file_size,
            repeat_count: self.repeat_count,
            name_prefix: self.name_prefix.clone(),
            failure_policy: self.on_failure,
            cycles_per_second: self.rate,
        }
    }

    /// Target the run drives. Only the simulation ships with this binary, so
    /// it must be asked for with `--simulate`.
    pub fn transfer_target(&self) -> HarnessResult<SimulatedTarget> {
        if !self.simulate {
            return Err(HarnessError::NoTransferClient {
                endpoint: format!("{}:{}", self.hostname, self.port),
            });
        }
        let profile = self.simulation_profile()?;
        tracing::debug!(?profile, "Using simulated target");
        Ok(SimulatedTarget::new(profile))
    }

    pub fn simulation_profile(&self) -> ConfigResult<SimulationProfile> {
        check_rate("loss-rate", self.loss_rate)?;
        check_rate("corruption-rate", self.corruption_rate)?;

        Ok(SimulationProfile {
            loss_rate: self.loss_rate,
            corruption_rate: self.corruption_rate,
            latency_ms: self.latency_ms,
            jitter_ms: self.jitter_ms,
            timeout: Duration::from_millis(self.timeout_ms),
            seed: self.seed,
        })
    }
}

fn check_rate(field: &'static str, value: f32) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidSimulation {
            field,
            reason: format!("{} is outside 0.0-1.0", value),
        })
    }
}
