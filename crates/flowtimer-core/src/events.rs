use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::TimerMode;

/// Engine commands report what happened as an `Event`; a `None` return means
/// the call was absorbed as a no-op. The host shell forwards events to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    /// Progress discarded; the current mode's full duration restored.
    SessionReset {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// Countdown stopped; `partial_saved` is true when elapsed progress was
    /// recorded as a session.
    TimerStopped {
        partial_saved: bool,
        at: DateTime<Utc>,
    },
    /// Natural completion. `next_mode` is the mode the engine advanced to.
    SessionCompleted {
        finished_mode: TimerMode,
        next_mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// Forced early completion; advances the cycle without ringing the alarm.
    FastForwarded {
        finished_mode: TimerMode,
        next_mode: TimerMode,
        actual_seconds: u32,
        at: DateTime<Utc>,
    },
    /// A scheduled entry took over the engine.
    ScheduledRunStarted {
        id: Uuid,
        duration_seconds: u32,
        at: DateTime<Utc>,
    },
    AlarmSilenced {
        at: DateTime<Utc>,
    },
}
