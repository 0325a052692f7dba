//! Recurring timer capability.
//!
//! The scheduler only needs "run this every N, starting now" and "stop".
//! `TokioTimer` backs that with one spawned task per job; tests swap in a
//! timer that fires on demand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Work run on every firing.
pub type Tick = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

pub trait Timer: Send + Sync {
    /// Fire `tick` now and then every `every`. Firings of one job never
    /// overlap.
    fn schedule_repeating(&self, every: Duration, tick: Tick) -> JobHandle;
}

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a scheduled job. Cancelling only prevents future firings; a
/// firing already in progress runs to completion.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: u64,
    token: CancellationToken,
}

impl JobHandle {
    pub fn new() -> Self {
        Self {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once `cancel` has been called on any clone of this handle.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Production timer: one tokio task per job.
#[derive(Debug, Clone, Default)]
pub struct TokioTimer;

impl TokioTimer {
    pub fn new() -> Self {
        Self
    }
}

impl Timer for TokioTimer {
    fn schedule_repeating(&self, every: Duration, tick: Tick) -> JobHandle {
        let handle = JobHandle::new();
        let job = handle.clone();
        let every = every.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = job.cancelled() => break,
                    _ = interval.tick() => {}
                }
                if job.is_cancelled() {
                    break;
                }
                (tick)().await;
            }
            debug!(job = job.id(), "Timer job stopped");
        });

        handle
    }
}
