//! Alert scheduler: one recurring forecast check per conversation.
//!
//! Each firing runs fetch → interpret → step → send. The firing is total:
//! service failures become state machine input and delivery failures are
//! only logged, so a bad tick never stops the job.

use std::sync::Arc;
use std::time::Duration;

use common::{ConversationId, Location};
use futures_util::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::interpreter::Interpreter;
use crate::registry::{SessionEntry, SessionRegistry};
use crate::source::{ForecastSource, Messenger};
use crate::state::AlertState;
use crate::timer::{Tick, Timer};

#[derive(Clone)]
pub struct AlertScheduler {
    timer: Arc<dyn Timer>,
    source: Arc<dyn ForecastSource>,
    messenger: Arc<dyn Messenger>,
    interpreter: Arc<Interpreter>,
    registry: SessionRegistry,
}

impl AlertScheduler {
    pub fn new(
        timer: Arc<dyn Timer>,
        source: Arc<dyn ForecastSource>,
        messenger: Arc<dyn Messenger>,
        interpreter: Interpreter,
    ) -> Self {
        Self {
            timer,
            source,
            messenger,
            interpreter: Arc::new(interpreter),
            registry: SessionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// (Re)start rain alerts for a conversation. Any existing job is
    /// cancelled and the alert flags start fresh. The new job's ticks queue
    /// behind any tick still running for this conversation.
    pub fn start(&self, conversation: ConversationId, location: Location, interval: Duration) {
        let state = Arc::new(Mutex::new(AlertState::new()));
        let tick_gate = self.registry.tick_gate(conversation);
        let tick = self.make_tick(conversation, location, state.clone(), tick_gate);

        let mut job_id = 0;
        let previous = self.registry.replace_with(conversation, || {
            let job = self.timer.schedule_repeating(interval, tick);
            job_id = job.id();
            SessionEntry {
                location,
                state,
                job,
            }
        });

        if let Some(previous) = previous {
            previous.job.cancel();
            info!(
                conversation = %conversation,
                job = previous.job.id(),
                "Replaced rain warning job"
            );
        }
        info!(
            conversation = %conversation,
            job = job_id,
            lat = location.latitude,
            lon = location.longitude,
            interval_secs = interval.as_secs(),
            "Scheduled rain warning job"
        );
    }

    /// Cancel alerts for a conversation and drop its state. Returns whether
    /// a job existed; calling it again is a no-op.
    pub fn stop(&self, conversation: ConversationId) -> bool {
        match self.registry.remove(conversation) {
            Some(entry) => {
                entry.job.cancel();
                info!(conversation = %conversation, job = entry.job.id(), "Removed rain warning job");
                true
            }
            None => {
                debug!(conversation = %conversation, "No rain warning job to remove");
                false
            }
        }
    }

    /// Cancel every job; used on shutdown.
    pub fn stop_all(&self) {
        for conversation in self.registry.conversations() {
            self.stop(conversation);
        }
    }

    fn make_tick(
        &self,
        conversation: ConversationId,
        location: Location,
        state: Arc<Mutex<AlertState>>,
        tick_gate: Arc<Mutex<()>>,
    ) -> Tick {
        let source = self.source.clone();
        let messenger = self.messenger.clone();
        let interpreter = self.interpreter.clone();

        Arc::new(move || -> BoxFuture<'static, ()> {
            let source = source.clone();
            let messenger = messenger.clone();
            let interpreter = interpreter.clone();
            let state = state.clone();
            let tick_gate = tick_gate.clone();
            Box::pin(async move {
                let _turn = tick_gate.lock().await;
                run_tick(
                    conversation,
                    location,
                    &state,
                    source.as_ref(),
                    interpreter.as_ref(),
                    messenger.as_ref(),
                )
                .await;
            })
        })
    }
}

/// One forecast check. Never returns an error.
pub async fn run_tick(
    conversation: ConversationId,
    location: Location,
    state: &Mutex<AlertState>,
    source: &dyn ForecastSource,
    interpreter: &Interpreter,
    messenger: &dyn Messenger,
) {
    debug!(conversation = %conversation, "Handling rain warning tick");

    let outcome = source
        .fetch(&location)
        .await
        .map(|doc| interpreter.interpret(&doc));
    if let Err(e) = &outcome {
        warn!(conversation = %conversation, "Forecast fetch failed: {}", e);
    }

    let notifications = {
        let mut guard = state.lock().await;
        let (next, notifications) = guard.step(&outcome, location);
        *guard = next;
        notifications
    };

    for notification in notifications {
        debug!(conversation = %conversation, ?notification, "Sending alert");
        if let Err(e) = messenger.send(conversation, notification).await {
            warn!(conversation = %conversation, "Alert delivery failed: {}", e);
        }
    }
}
