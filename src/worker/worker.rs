use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::pacer::CyclePacer;
use super::types::{CycleError, CycleOutcome, TransferPhase, WorkerExit, WorkerOutcome};
use crate::client::{TransferClient, TransferName};
use crate::config::{FailurePolicy, HarnessConfig};
use crate::metrics::recorder::{self, CycleTimer, WorkerGauge};
use crate::payload::Payload;

/// Runs `repeat_count` upload→download cycles in order with its own client.
///
/// A worker writes nothing shared: its outcomes stay private until the
/// coordinator joins it.
pub struct Worker<C> {
    id: usize,
    config: Arc<HarnessConfig>,
    client: C,
    payload: Payload,
    pacer: CyclePacer,
    cancel: CancellationToken,
}

impl<C: TransferClient> Worker<C> {
    pub fn new(
        id: usize,
        config: Arc<HarnessConfig>,
        client: C,
        payload: Payload,
        pacer: CyclePacer,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            config,
            client,
            payload,
            pacer,
            cancel,
        }
    }

    pub async fn run(mut self) -> WorkerOutcome {
        let _gauge = WorkerGauge::enter();
        let repeat_count = self.config.repeat_count();
        let capacity = usize::try_from(repeat_count).unwrap_or(usize::MAX).min(4096);
        let mut cycles = Vec::with_capacity(capacity);
        let mut exit = WorkerExit::Completed;

        tracing::debug!(worker_id = self.id, repeat_count, "Worker started");

        for cycle_index in 0..repeat_count {
            if self.cancel.is_cancelled() {
                exit = WorkerExit::Cancelled;
                break;
            }
            if self.pacer.is_enabled() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        exit = WorkerExit::Cancelled;
                        break;
                    }
                    _ = self.pacer.wait_for_cycle() => {}
                }
            }

            let outcome = self.run_cycle(cycle_index).await;
            let failed = !outcome.success;
            cycles.push(outcome);

            if failed && self.config.failure_policy() == FailurePolicy::AbortWorker {
                tracing::warn!(
                    worker_id = self.id,
                    cycle = cycle_index,
                    "Worker stopping after failed cycle"
                );
                exit = WorkerExit::Aborted;
                break;
            }
        }

        tracing::debug!(
            worker_id = self.id,
            cycles = cycles.len(),
            exit = ?exit,
            "Worker finished"
        );

        WorkerOutcome {
            worker_id: self.id,
            exit,
            cycles,
        }
    }

    /// One upload followed by a download of the same name, then a byte
    /// comparison. Never returns an error: failures are part of the outcome.
    pub async fn run_cycle(&mut self, cycle_index: u64) -> CycleOutcome {
        let name = TransferName::for_cycle(self.config.name_prefix(), self.id, cycle_index);
        let timer = CycleTimer::start(self.id);

        if let Err(e) = self.client.upload(&name, self.payload.clone()).await {
            let elapsed = timer.stop();
            tracing::warn!(worker_id = self.id, cycle = cycle_index, name = %name, error = %e, "Upload failed");
            let error = CycleError::new(TransferPhase::Upload, &e);
            recorder::record_cycle_failed(self.id, error.kind.as_str());
            return CycleOutcome::transport_failure(cycle_index, name, error, elapsed);
        }
        recorder::record_upload(self.payload.len());

        let received = match self.client.download(&name).await {
            Ok(received) => received,
            Err(e) => {
                let elapsed = timer.stop();
                tracing::warn!(worker_id = self.id, cycle = cycle_index, name = %name, error = %e, "Download failed");
                let error = CycleError::new(TransferPhase::Download, &e);
                recorder::record_cycle_failed(self.id, error.kind.as_str());
                return CycleOutcome::transport_failure(cycle_index, name, error, elapsed);
            }
        };
        recorder::record_download(received.len());

        let elapsed = timer.stop();
        if received != self.payload {
            tracing::warn!(
                worker_id = self.id,
                cycle = cycle_index,
                name = %name,
                expected_len = self.payload.len(),
                received_len = received.len(),
                "Downloaded bytes differ from upload"
            );
            recorder::record_cycle_failed(self.id, "verification_mismatch");
            return CycleOutcome::mismatch(cycle_index, name, received.short_checksum(), elapsed);
        }

        tracing::debug!(worker_id = self.id, cycle = cycle_index, name = %name, "Cycle complete");
        recorder::record_cycle_succeeded(self.id);
        CycleOutcome::succeeded(cycle_index, name, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientFactory, SimulatedTarget, TransferError, TransferErrorKind, TransferResult};
    use crate::config::HarnessOptions;
    use crate::payload::generate;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Replays a fixed script of results, one per call
    struct ScriptedClient {
        uploads: VecDeque<TransferResult<()>>,
        downloads: VecDeque<TransferResult<Payload>>,
        calls: Vec<String>,
    }

    #[async_trait]
    impl TransferClient for ScriptedClient {
        async fn upload(&mut self, name: &TransferName, _data: Payload) -> TransferResult<()> {
            self.calls.push(format!("up:{}", name));
            self.uploads.pop_front().unwrap_or(Ok(()))
        }

        async fn download(&mut self, name: &TransferName) -> TransferResult<Payload> {
            self.calls.push(format!("down:{}", name));
            self.downloads.pop_front().unwrap_or_else(|| Ok(generate(10)))
        }
    }

    fn config(repeat_count: u64, failure_policy: FailurePolicy) -> Arc<HarnessConfig> {
        Arc::new(
            HarnessOptions {
                num_workers: 1,
                file_size: 10,
                repeat_count,
                failure_policy,
                ..Default::default()
            }
            .validate()
            .unwrap(),
        )
    }

    fn scripted(
        uploads: Vec<TransferResult<()>>,
        downloads: Vec<TransferResult<Payload>>,
    ) -> ScriptedClient {
        ScriptedClient {
            uploads: uploads.into(),
            downloads: downloads.into(),
            calls: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_all_cycles_succeed_against_simulation() {
        let target = SimulatedTarget::perfect();
        let config = config(5, FailurePolicy::Continue);
        let client = target.connect(config.endpoint(), 2).await.unwrap();
        let worker = Worker::new(
            2,
            config,
            client,
            generate(10),
            CyclePacer::unlimited(),
            CancellationToken::new(),
        );

        let outcome = worker.run().await;

        assert_eq!(outcome.worker_id, 2);
        assert_eq!(outcome.exit, WorkerExit::Completed);
        assert_eq!(outcome.cycles.len(), 5);
        assert!(outcome.cycles.iter().all(|c| c.success && c.bytes_matched == Some(true)));
        let indices: Vec<u64> = outcome.cycles.iter().map(|c| c.cycle_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(target.file_count(), 5);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_download_and_continues() {
        let client = scripted(
            vec![Err(TransferError::ConnectionFailed("reset".into())), Ok(())],
            vec![],
        );
        let mut worker = Worker::new(
            0,
            config(2, FailurePolicy::Continue),
            client,
            generate(10),
            CyclePacer::unlimited(),
            CancellationToken::new(),
        );

        let first = worker.run_cycle(0).await;
        let second = worker.run_cycle(1).await;

        assert!(!first.success);
        let error = first.error.unwrap();
        assert_eq!(error.phase, TransferPhase::Upload);
        assert_eq!(error.kind, TransferErrorKind::ConnectionFailed);
        assert_eq!(first.bytes_matched, None);
        assert!(second.success);
        assert_eq!(
            worker.client.calls,
            vec!["up:test-w0-c0.txt", "up:test-w0-c1.txt", "down:test-w0-c1.txt"]
        );
    }

    #[tokio::test]
    async fn test_download_failure_is_recorded() {
        let client = scripted(
            vec![],
            vec![Err(TransferError::Timeout(Duration::from_secs(5)))],
        );
        let mut worker = Worker::new(
            0,
            config(1, FailurePolicy::Continue),
            client,
            generate(10),
            CyclePacer::unlimited(),
            CancellationToken::new(),
        );

        let outcome = worker.run_cycle(0).await;

        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert_eq!(error.phase, TransferPhase::Download);
        assert_eq!(error.kind, TransferErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_mismatch_is_not_a_transport_error() {
        let client = scripted(vec![], vec![Ok(generate(9))]);
        let worker = Worker::new(
            0,
            config(3, FailurePolicy::Continue),
            client,
            generate(10),
            CyclePacer::unlimited(),
            CancellationToken::new(),
        );

        let outcome = worker.run().await;

        assert_eq!(outcome.cycles.len(), 3);
        let first = &outcome.cycles[0];
        assert!(!first.success);
        assert!(first.error.is_none());
        assert_eq!(first.bytes_matched, Some(false));
        assert_eq!(first.received_checksum, Some(generate(9).short_checksum()));
        assert!(outcome.cycles[1].success);
        assert!(outcome.cycles[2].success);
    }

    #[tokio::test]
    async fn test_abort_policy_stops_worker() {
        let client = scripted(
            vec![Ok(()), Err(TransferError::file_not_found())],
            vec![],
        );
        let worker = Worker::new(
            0,
            config(10, FailurePolicy::AbortWorker),
            client,
            generate(10),
            CyclePacer::unlimited(),
            CancellationToken::new(),
        );

        let outcome = worker.run().await;

        assert_eq!(outcome.exit, WorkerExit::Aborted);
        assert_eq!(outcome.cycles.len(), 2);
        assert_eq!(outcome.failed(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let worker = Worker::new(
            0,
            config(10, FailurePolicy::Continue),
            scripted(vec![], vec![]),
            generate(10),
            CyclePacer::unlimited(),
            cancel,
        );

        let outcome = worker.run().await;

        assert_eq!(outcome.exit, WorkerExit::Cancelled);
        assert!(outcome.cycles.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pacer_wait() {
        let cancel = CancellationToken::new();
        let worker = Worker::new(
            0,
            config(1000, FailurePolicy::Continue),
            scripted(vec![], vec![]),
            generate(10),
            CyclePacer::new(std::num::NonZeroU32::new(1)),
            cancel.clone(),
        );

        let handle = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("worker did not stop promptly")
            .unwrap();
        assert_eq!(outcome.exit, WorkerExit::Cancelled);
        assert!(outcome.cycles.len() < 1000);
    }
}
