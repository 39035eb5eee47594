//! Global cap on how fast cycles start, using the governor crate

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter shared by every worker of a run
#[derive(Clone)]
pub struct CyclePacer {
    limiter: Option<Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
}

impl CyclePacer {
    pub fn new(cycles_per_second: Option<NonZeroU32>) -> Self {
        Self {
            limiter: cycles_per_second
                .map(|rate| Quota::per_second(rate).allow_burst(NonZeroU32::MIN))
                .map(|quota| Arc::new(RateLimiter::direct(quota))),
        }
    }

    pub fn unlimited() -> Self {
        Self { limiter: None }
    }

    /// Wait until another cycle may start
    pub async fn wait_for_cycle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }
}

impl Default for CyclePacer {
    fn default() -> Self {
        Self::unlimited()
    }
}
