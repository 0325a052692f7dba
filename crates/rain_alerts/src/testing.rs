//! Test doubles for the timer, forecast source, and messenger seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use common::{ConversationId, Error, ForecastDocument, ForecastRecord, Location, Notification};

use crate::source::{ForecastSource, Messenger};
use crate::timer::{JobHandle, Tick, Timer};

/// Timer whose jobs only fire when the test says so.
#[derive(Default)]
pub struct ManualTimer {
    jobs: Mutex<Vec<(JobHandle, Duration, Tick)>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|(handle, _, _)| !handle.is_cancelled())
            .count()
    }

    pub fn total_jobs(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn last_interval(&self) -> Option<Duration> {
        self.jobs.lock().unwrap().last().map(|(_, every, _)| *every)
    }

    /// Ticks of the jobs not yet cancelled, in scheduling order.
    pub fn live_ticks(&self) -> Vec<Tick> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|(handle, _, _)| !handle.is_cancelled())
            .map(|(_, _, tick)| tick.clone())
            .collect()
    }

    /// Fire every live job once, in scheduling order.
    pub async fn fire_all(&self) {
        for tick in self.live_ticks() {
            tick().await;
        }
    }
}

impl Timer for ManualTimer {
    fn schedule_repeating(&self, every: Duration, tick: Tick) -> JobHandle {
        let handle = JobHandle::new();
        self.jobs.lock().unwrap().push((handle.clone(), every, tick));
        handle
    }
}

/// Returns queued results in order; an empty queue reads as an outage.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<ForecastDocument, Error>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<ForecastDocument, Error>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastSource for ScriptedSource {
    async fn fetch(&self, _location: &Location) -> Result<ForecastDocument, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("script exhausted".into())))
    }
}

/// Outage source that takes `delay` per fetch and records how many fetches
/// were ever in flight at once.
pub struct SlowSource {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowSource {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastSource for SlowSource {
    async fn fetch(&self, _location: &Location) -> Result<ForecastDocument, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Err(Error::Network("timed out".into()))
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(ConversationId, Notification)>>,
    failures_left: AtomicUsize,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` sends.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(ConversationId, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, conversation: ConversationId, content: Notification) -> Result<(), Error> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::Messenger("transport closed".into()));
        }
        self.sent.lock().unwrap().push((conversation, content));
        Ok(())
    }
}

fn make_doc(steps: &[(&str, f64)], accumulation: f64) -> ForecastDocument {
    ForecastDocument {
        forecasts: steps
            .iter()
            .map(|(time, rain)| ForecastRecord {
                time: (*time).into(),
                rain_intensity: *rain,
            })
            .collect(),
        accumulation,
        time_format: "%Y-%m-%d %H:%M:%S".into(),
        timezone: "UTC".into(),
    }
}

/// Dry now, rain from 09:10 UTC (12:10 in Helsinki).
pub fn incoming_rain_doc() -> ForecastDocument {
    make_doc(
        &[
            ("2026-10-15 09:00:00", 0.0),
            ("2026-10-15 09:05:00", 0.0),
            ("2026-10-15 09:10:00", 0.8),
        ],
        0.6,
    )
}

pub fn raining_doc() -> ForecastDocument {
    make_doc(
        &[("2026-10-15 09:00:00", 1.1), ("2026-10-15 09:05:00", 0.9)],
        2.0,
    )
}

pub fn dry_doc() -> ForecastDocument {
    make_doc(
        &[("2026-10-15 09:00:00", 0.0), ("2026-10-15 09:05:00", 0.0)],
        0.0,
    )
}
