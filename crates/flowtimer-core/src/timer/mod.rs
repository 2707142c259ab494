mod engine;
mod mode;

pub use engine::{OutcomeCallback, ScheduledRunOutcome, TimerEngine};
pub use mode::{Durations, TimerMode, DEFAULT_SESSION_TITLE, FLOWS_PER_CYCLE};

pub(crate) use mode::sanitize_title;
