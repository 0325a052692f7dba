//! Alert state machine: decides which messages a tick produces.
//!
//! Three independent flags, updated in a fixed order on every tick:
//!
//! 1. fetch failed → outage notice (first failure after health, or very
//!    first tick), mark service down, stop
//! 2. fetch succeeded after an outage → recovery notice
//! 3. about to rain and not yet warned → warning (location marker first,
//!    except on the very first tick)
//! 4. not about to rain on the very first tick → "no rain expected"
//! 5. raining now → re-arm the warning
//! 6. clear `first_call`

use common::{Error, ForecastJudgement, Location, Notification};

/// Per-conversation alert flags. Created fresh whenever a location is
/// (re)registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertState {
    /// A warning has been sent for the upcoming dry→wet change.
    pub warned: bool,
    /// The last tick failed to reach the forecast service.
    pub service_was_down: bool,
    /// No tick has completed yet.
    pub first_call: bool,
}

impl Default for AlertState {
    fn default() -> Self {
        Self {
            warned: false,
            service_was_down: false,
            first_call: true,
        }
    }
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick. Returns the next state and the notifications to
    /// send, in order.
    pub fn step(
        self,
        outcome: &Result<ForecastJudgement, Error>,
        location: Location,
    ) -> (AlertState, Vec<Notification>) {
        let mut next = self;
        let mut out = Vec::new();

        match outcome {
            Err(_) => {
                if !self.service_was_down || self.first_call {
                    out.push(Notification::ServiceUnavailable);
                }
                next.service_was_down = true;
            }
            Ok(judgement) => {
                if self.service_was_down {
                    out.push(Notification::ServiceRecovered);
                    next.service_was_down = false;
                }

                let about_to_rain = judgement.about_to_rain();
                if about_to_rain && !self.warned {
                    if !self.first_call {
                        out.push(Notification::Location(location));
                    }
                    out.push(Notification::RainWarning {
                        change_eta: judgement.change_eta.clone().unwrap_or_default(),
                        accumulation_mm: judgement.accumulation_mm,
                    });
                    next.warned = true;
                }
                if !about_to_rain && self.first_call {
                    out.push(Notification::NoRainExpected);
                }

                if judgement.is_raining_now() {
                    next.warned = false;
                }
            }
        }

        next.first_call = false;
        (next, out)
    }
}
