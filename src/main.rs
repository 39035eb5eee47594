use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

use tftp_stress::config::Args;
use tftp_stress::coordinator::{HarnessCoordinator, HarnessError};
use tftp_stress::logging::init_logging;
use tftp_stress::metrics::{start_metrics_server, MetricsConfig};

/// Exit status for errors that stop the run before any worker starts
const FATAL_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(FATAL_EXIT)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let target = args.transfer_target()?;
    let coordinator = HarnessCoordinator::from_options(args.harness_options(), target.clone())?;

    let endpoint = coordinator.config().endpoint().clone();
    endpoint
        .resolve()
        .await
        .map_err(|source| HarnessError::UnresolvableHost {
            endpoint: endpoint.to_string(),
            source,
        })?;

    if let Some(addr) = args.metrics_addr {
        start_metrics_server(MetricsConfig::with_addr(addr)).map_err(HarnessError::from)?;
        tracing::info!(%addr, "Serving Prometheus metrics");
    }

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, letting in-flight cycles finish");
            cancel.cancel();
        }
    });

    let report = coordinator.run().await?;
    tracing::debug!(stats = %target.stats().summary(), "Simulated target");

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        println!("{}", report);
    }

    Ok(ExitCode::from(report.exit_code() as u8))
}
