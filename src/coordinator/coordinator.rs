use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::ClientFactory;
use crate::config::{HarnessConfig, HarnessOptions};
use crate::coordinator::error::{HarnessError, HarnessResult};
use crate::coordinator::types::{HarnessReport, ReportBuilder};
use crate::payload;
use crate::worker::{CyclePacer, Worker};

/// External stop signal for a running harness.
///
/// Once raised, no worker starts another cycle; cycles already in flight
/// finish or fail on their own and the run reports what it has.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Orchestrates one run: generate payload → build clients → spawn
/// workers → join all → report.
pub struct HarnessCoordinator<F> {
    config: Arc<HarnessConfig>,
    factory: F,
    cancel: CancelHandle,
}

impl<F: ClientFactory> HarnessCoordinator<F> {
    pub fn new(config: HarnessConfig, factory: F) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            cancel: CancelHandle::new(),
        }
    }

    /// Validate raw options first; invalid input never reaches a worker
    pub fn from_options(options: HarnessOptions, factory: F) -> HarnessResult<Self> {
        let config = options.validate()?;
        Ok(Self::new(config, factory))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run every worker to completion and merge their outcomes.
    ///
    /// Fails only if a client cannot be built, in which case no worker has
    /// been started. Per-cycle failures end up in the report.
    pub async fn run(&self) -> HarnessResult<HarnessReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let config = &self.config;

        let payload = payload::generate(config.file_size());
        let pacer = CyclePacer::new(config.cycles_per_second());

        tracing::info!(
            %run_id,
            endpoint = %config.endpoint(),
            target = %self.factory.target(config.endpoint()),
            workers = config.num_workers(),
            file_size = config.file_size(),
            repeat_count = config.repeat_count(),
            "Starting stress run"
        );

        let mut clients = Vec::with_capacity(config.num_workers());
        for worker_id in 0..config.num_workers() {
            let client = self
                .factory
                .connect(config.endpoint(), worker_id)
                .await
                .map_err(|source| {
                    tracing::error!(worker_id, error = %source, "Client construction failed");
                    HarnessError::ClientConstruction { worker_id, source }
                })?;
            clients.push(client);
        }

        let handles: Vec<_> = clients
            .into_iter()
            .enumerate()
            .map(|(worker_id, client)| {
                let worker = Worker::new(
                    worker_id,
                    self.config.clone(),
                    client,
                    payload.clone(),
                    pacer.clone(),
                    self.cancel.token(),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        let mut report = ReportBuilder::new(
            run_id,
            config.endpoint().clone(),
            self.factory.target(config.endpoint()),
            started_at,
            config.num_workers(),
            config.file_size(),
            payload.short_checksum(),
        );

        // join_all keeps spawn order, so results merge in worker id order
        for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(outcome) => report.add_worker(outcome),
                Err(e) => {
                    tracing::error!(worker_id, error = %e, "Worker task did not complete");
                    report.add_crashed(worker_id);
                }
            }
        }
        if self.cancel.is_cancelled() {
            report.mark_cancelled();
        }

        let report = report.finish(start.elapsed());
        tracing::info!(
            %run_id,
            total = report.total_cycles,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Stress run finished"
        );

        Ok(report)
    }
}
