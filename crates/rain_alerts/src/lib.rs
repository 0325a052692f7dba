//! Rain alert engine.
//!
//! Per conversation, polls the forecast service on a fixed cadence, turns
//! each forecast into a rain judgement, and decides which alerts to send.

pub mod interpreter;
pub mod registry;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use interpreter::Interpreter;
pub use registry::{SessionEntry, SessionRegistry};
pub use scheduler::AlertScheduler;
pub use source::{ForecastSource, Messenger};
pub use state::AlertState;
pub use timer::{JobHandle, Tick, Timer, TokioTimer};
