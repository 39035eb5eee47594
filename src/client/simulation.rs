//! In-process stand-in for an in-memory transfer server
//!
//! Lets the harness run without a network target: files live in a shared
//! map, last write wins, and unknown names are rejected the way the real
//! server rejects them. A fault profile adds loss, latency and corruption.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::adapter::{ClientFactory, TransferClient};
use super::error::{TransferError, TransferResult};
use super::types::{Endpoint, RunTarget, TransferName};
use crate::payload::Payload;

/// Fault injection settings for the simulated target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationProfile {
    /// Chance (0.0 - 1.0) that an operation is lost and times out
    pub loss_rate: f32,
    /// Chance (0.0 - 1.0) that downloaded content has a bit flipped
    pub corruption_rate: f32,
    /// Base latency per operation in milliseconds
    pub latency_ms: u64,
    /// Extra random latency in milliseconds
    pub jitter_ms: u64,
    /// How long a lost operation waits before reporting a timeout
    pub timeout: Duration,
    /// Fixed RNG seed; each client derives its own stream from it
    pub seed: Option<u64>,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corruption_rate: 0.0,
            latency_ms: 0,
            jitter_ms: 0,
            timeout: Duration::from_secs(1),
            seed: None,
        }
    }
}

impl SimulationProfile {
    /// No faults, no latency
    pub fn perfect() -> Self {
        Self::default()
    }

    pub fn with_loss(loss_rate: f32) -> Self {
        Self {
            loss_rate,
            ..Default::default()
        }
    }

    pub fn with_corruption(corruption_rate: f32) -> Self {
        Self {
            corruption_rate,
            ..Default::default()
        }
    }
}

/// Counters kept by the simulated target
#[derive(Debug, Default)]
pub struct TargetStats {
    pub uploads: AtomicU64,
    pub downloads: AtomicU64,
    pub lost: AtomicU64,
    pub corrupted: AtomicU64,
    pub rejected: AtomicU64,
    /// Cycles that started on a name another cycle still had open
    pub name_collisions: AtomicU64,
}

impl TargetStats {
    pub fn summary(&self) -> String {
        format!(
            "Uploads: {}, Downloads: {}, Lost: {}, Corrupted: {}, Rejected: {}, Collisions: {}",
            self.uploads.load(Ordering::Relaxed),
            self.downloads.load(Ordering::Relaxed),
            self.lost.load(Ordering::Relaxed),
            self.corrupted.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
            self.name_collisions.load(Ordering::Relaxed),
        )
    }
}

/// Shared in-memory file store. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct SimulatedTarget {
    files: Arc<DashMap<String, Bytes>>,
    open_cycles: Arc<Mutex<HashSet<String>>>,
    stats: Arc<TargetStats>,
    online: Arc<AtomicBool>,
    profile: SimulationProfile,
}

impl SimulatedTarget {
    pub fn new(profile: SimulationProfile) -> Self {
        Self {
            files: Arc::new(DashMap::new()),
            open_cycles: Arc::new(Mutex::new(HashSet::new())),
            stats: Arc::new(TargetStats::default()),
            online: Arc::new(AtomicBool::new(true)),
            profile,
        }
    }

    pub fn perfect() -> Self {
        Self::new(SimulationProfile::perfect())
    }

    pub fn stats(&self) -> Arc<TargetStats> {
        self.stats.clone()
    }

    /// Refuse new client connections while offline
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.files.get(name).map(|entry| entry.value().clone())
    }

    fn put(&self, name: &str, data: Bytes) {
        self.files.insert(name.to_string(), data);
    }

    fn open_cycle(&self, name: &TransferName) {
        if !self.open_cycles.lock().insert(name.as_str().to_string()) {
            self.stats.name_collisions.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(name = %name, "Cycle opened on a name that is already in flight");
        }
    }

    fn close_cycle(&self, name: &TransferName) {
        self.open_cycles.lock().remove(name.as_str());
    }
}

impl Default for SimulatedTarget {
    fn default() -> Self {
        Self::perfect()
    }
}

#[async_trait]
impl ClientFactory for SimulatedTarget {
    type Client = SimulatedClient;

    async fn connect(&self, endpoint: &Endpoint, worker_id: usize) -> TransferResult<SimulatedClient> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(TransferError::ConnectionFailed(format!(
                "{} is not accepting connections",
                endpoint
            )));
        }

        let rng = match self.profile.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
            None => StdRng::from_entropy(),
        };

        Ok(SimulatedClient {
            target: self.clone(),
            rng,
        })
    }

    fn target(&self, _endpoint: &Endpoint) -> RunTarget {
        RunTarget::Simulated
    }
}

/// Client half of the simulation, one per worker
pub struct SimulatedClient {
    target: SimulatedTarget,
    rng: StdRng,
}

impl SimulatedClient {
    /// Apply latency, then decide whether the operation is lost
    async fn traverse(&mut self) -> TransferResult<()> {
        let profile = &self.target.profile;
        let lost = profile.loss_rate > 0.0 && self.rng.gen::<f32>() < profile.loss_rate;

        let mut latency = profile.latency_ms;
        if profile.jitter_ms > 0 {
            latency += self.rng.gen_range(0..profile.jitter_ms);
        }
        if latency > 0 {
            sleep(Duration::from_millis(latency)).await;
        }

        if lost {
            let timeout = self.target.profile.timeout;
            self.target.stats.lost.fetch_add(1, Ordering::Relaxed);
            sleep(timeout).await;
            return Err(TransferError::Timeout(timeout));
        }
        Ok(())
    }
}

#[async_trait]
impl TransferClient for SimulatedClient {
    async fn upload(&mut self, name: &TransferName, data: Payload) -> TransferResult<()> {
        if name.as_str().is_empty() {
            self.target.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(TransferError::RemoteRejected {
                code: 4,
                message: "Zero length file name not allowed".into(),
            });
        }

        self.target.open_cycle(name);
        if let Err(e) = self.traverse().await {
            self.target.close_cycle(name);
            return Err(e);
        }

        self.target.put(name.as_str(), data.into_bytes());
        self.target.stats.uploads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn download(&mut self, name: &TransferName) -> TransferResult<Payload> {
        let result = self.fetch(name).await;
        self.target.close_cycle(name);
        result
    }
}

impl SimulatedClient {
    async fn fetch(&mut self, name: &TransferName) -> TransferResult<Payload> {
        self.traverse().await?;

        let Some(stored) = self.target.get(name.as_str()) else {
            self.target.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(TransferError::file_not_found());
        };
        self.target.stats.downloads.fetch_add(1, Ordering::Relaxed);

        let corruption_rate = self.target.profile.corruption_rate;
        if !stored.is_empty() && corruption_rate > 0.0 && self.rng.gen::<f32>() < corruption_rate {
            self.target.stats.corrupted.fetch_add(1, Ordering::Relaxed);
            let mut data = stored.to_vec();
            let byte_idx = self.rng.gen_range(0..data.len());
            let bit_idx = self.rng.gen_range(0..8);
            data[byte_idx] ^= 1 << bit_idx;
            return Ok(Payload::from(data));
        }

        Ok(Payload::from(stored))
    }
}
