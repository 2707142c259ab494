//! Single-session countdown state machine.
//!
//! The engine runs exactly one active countdown at a time and reports its
//! outcome. It has no internal thread: the host drives it by calling `tick()`
//! once per second, and each tick decrements the remaining seconds by one.
//! A tick that finds zero remaining completes the session.
//!
//! ## State
//!
//! ```text
//! {Idle, Running} x mode, with an orthogonal {AlarmSilent, AlarmRinging}
//! flag set on completion and cleared by `stop_alarm()` or `start()`.
//! ```
//!
//! None of the commands can fail; illegal calls (pausing while idle,
//! starting while running) are no-ops and return `None`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::mode::{sanitize_title, Durations, TimerMode, FLOWS_PER_CYCLE};
use crate::clock::Clock;
use crate::events::Event;
use crate::notify::Notifier;
use crate::session::{Session, SessionStore};

/// Terminal result of a scheduled run, delivered through the outcome callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledRunOutcome {
    Succeeded,
    Failed { reason: String },
}

/// Invoked exactly once when a scheduled run ends.
pub type OutcomeCallback = Box<dyn FnOnce(Uuid, ScheduledRunOutcome)>;

pub(crate) const REASON_STOPPED: &str = "Stopped before completion";
pub(crate) const REASON_RESET: &str = "Session was reset";
pub(crate) const REASON_FAST_FORWARDED: &str = "Fast-forwarded before completion";
pub(crate) const REASON_SUPERSEDED: &str = "Superseded by another scheduled session";

/// In-flight launch record for a scheduled run. The callback is `take()`n on
/// invocation, which is what makes delivery exactly-once.
struct ScheduledRun {
    id: Uuid,
    duration_seconds: u32,
    on_outcome: Option<OutcomeCallback>,
}

/// Core timer engine.
///
/// Holds non-owning handles to its collaborators: the session store may
/// disappear (records are then silently dropped), and time comes exclusively
/// from the injected [`Clock`].
pub struct TimerEngine {
    durations: Durations,
    mode: TimerMode,
    session_title: String,
    is_running: bool,
    /// Remaining seconds of the current session.
    remaining: u32,
    /// Completed flow sessions, modulo nothing -- the cycle position is
    /// derived with `% FLOWS_PER_CYCLE`.
    completed_flows_in_cycle: u32,
    alarm_ringing: bool,
    /// Wall-clock start of the in-progress session; cleared when it ends.
    started_at: Option<DateTime<Utc>>,
    scheduled_run: Option<ScheduledRun>,
    alerts_enabled: bool,
    alert_volume: f32,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
    store: Option<Weak<RefCell<dyn SessionStore>>>,
}

impl TimerEngine {
    pub fn new(durations: Durations, clock: Rc<dyn Clock>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            durations,
            mode: TimerMode::Flow,
            session_title: super::mode::DEFAULT_SESSION_TITLE.to_string(),
            is_running: false,
            remaining: durations.flow,
            completed_flows_in_cycle: 0,
            alarm_ringing: false,
            started_at: None,
            scheduled_run: None,
            alerts_enabled: true,
            alert_volume: 1.0,
            clock,
            notifier,
            store: None,
        }
    }

    /// Attach the durable session sink. The engine keeps only a weak handle.
    pub fn attach_store(&mut self, store: Weak<RefCell<dyn SessionStore>>) {
        self.store = Some(store);
    }

    pub fn configure_alerts(&mut self, enabled: bool, volume: f32) {
        self.alerts_enabled = enabled;
        self.alert_volume = volume.clamp(0.0, 1.0);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    /// Intended duration of the current session: the scheduled override while
    /// a scheduled run is in flight, the mode's configured duration otherwise.
    pub fn intended_seconds(&self) -> u32 {
        self.scheduled_run
            .as_ref()
            .map(|run| run.duration_seconds)
            .unwrap_or_else(|| self.durations.for_mode(self.mode))
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.intended_seconds().saturating_sub(self.remaining)
    }

    pub fn has_progress(&self) -> bool {
        self.remaining < self.intended_seconds()
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.intended_seconds();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining as f64 / total as f64)
    }

    pub fn session_title(&self) -> &str {
        &self.session_title
    }

    /// The session title during flows, the mode label during breaks.
    pub fn display_title(&self) -> &str {
        if self.mode == TimerMode::Flow {
            &self.session_title
        } else {
            self.mode.label()
        }
    }

    pub fn current_session_start(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_flows_in_cycle(&self) -> u32 {
        self.completed_flows_in_cycle
    }

    pub fn is_alarm_ringing(&self) -> bool {
        self.alarm_ringing
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume the countdown. Silences a ringing alarm either way;
    /// a no-op when already running.
    pub fn start(&mut self) -> Option<Event> {
        self.silence_alarm();
        if self.is_running {
            return None;
        }
        self.is_running = true;
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
        Some(Event::TimerStarted {
            mode: self.mode,
            remaining_seconds: self.remaining,
            at: self.clock.now(),
        })
    }

    /// Stop decrementing without ending the session; `start()` resumes it.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        self.is_running = false;
        Some(Event::TimerPaused {
            remaining_seconds: self.remaining,
            at: self.clock.now(),
        })
    }

    /// Discard progress without recording a session. A scheduled run ending
    /// this way fails.
    pub fn reset_current_session(&mut self) -> Option<Event> {
        self.silence_alarm();
        self.is_running = false;
        self.finish_scheduled_run(ScheduledRunOutcome::Failed {
            reason: REASON_RESET.to_string(),
        });
        self.started_at = None;
        self.remaining = self.intended_seconds();
        Some(Event::SessionReset {
            mode: self.mode,
            at: self.clock.now(),
        })
    }

    /// Force mode back to Flow with a fresh countdown.
    pub fn reset_to_flow(&mut self) -> Option<Event> {
        self.silence_alarm();
        self.is_running = false;
        self.finish_scheduled_run(ScheduledRunOutcome::Failed {
            reason: REASON_RESET.to_string(),
        });
        self.mode = TimerMode::Flow;
        self.started_at = None;
        self.remaining = self.intended_seconds();
        Some(Event::SessionReset {
            mode: self.mode,
            at: self.clock.now(),
        })
    }

    /// Stop the countdown, recording elapsed progress (if any) as a partial
    /// session, then restore the mode's full duration.
    pub fn stop_and_save_partial(&mut self) -> Option<Event> {
        self.silence_alarm();
        let elapsed = self.elapsed_seconds();
        if elapsed > 0 {
            self.persist_session(elapsed);
        }
        self.finish_scheduled_run(ScheduledRunOutcome::Failed {
            reason: REASON_STOPPED.to_string(),
        });
        self.is_running = false;
        self.started_at = None;
        self.remaining = self.intended_seconds();
        Some(Event::TimerStopped {
            partial_saved: elapsed > 0,
            at: self.clock.now(),
        })
    }

    /// Force-complete the current session early: records elapsed-so-far
    /// (possibly zero) and advances the cycle exactly as natural completion
    /// would, without ringing the alarm.
    pub fn fast_forward(&mut self) -> Option<Event> {
        let finished = self.mode;
        let elapsed = self.elapsed_seconds();
        self.silence_alarm();
        self.is_running = false;
        self.persist_session(elapsed);
        if finished == TimerMode::Flow {
            self.completed_flows_in_cycle += 1;
        }
        self.finish_scheduled_run(ScheduledRunOutcome::Failed {
            reason: REASON_FAST_FORWARDED.to_string(),
        });
        self.advance_mode_after_completion();
        Some(Event::FastForwarded {
            finished_mode: finished,
            next_mode: self.mode,
            actual_seconds: elapsed,
            at: self.clock.now(),
        })
    }

    /// Update configured durations; outside of a running countdown the
    /// remaining time resyncs to the current mode's (possibly new) duration.
    pub fn apply_durations(
        &mut self,
        flow: Option<u32>,
        short_break: Option<u32>,
        long_break: Option<u32>,
    ) {
        if let Some(f) = flow {
            self.durations.flow = f;
        }
        if let Some(s) = short_break {
            self.durations.short_break = s;
        }
        if let Some(l) = long_break {
            self.durations.long_break = l;
        }
        if !self.is_running {
            self.remaining = self.intended_seconds();
        }
    }

    /// Rename the flow session; whitespace-only names fall back to the default.
    pub fn rename_session(&mut self, raw_title: &str) {
        self.session_title = sanitize_title(raw_title);
    }

    /// Silence a ringing alarm. No-op when silent.
    pub fn stop_alarm(&mut self) -> Option<Event> {
        if !self.alarm_ringing {
            return None;
        }
        self.silence_alarm();
        Some(Event::AlarmSilenced {
            at: self.clock.now(),
        })
    }

    /// Begin a flow session on behalf of a scheduled entry, with the entry's
    /// title and duration overriding the configured flow duration.
    ///
    /// `on_outcome` is invoked exactly once: with `Succeeded` on natural
    /// completion, with `Failed` when a user action ends the session first.
    pub fn start_scheduled_run(
        &mut self,
        id: Uuid,
        title: &str,
        duration_seconds: u32,
        start_date: DateTime<Utc>,
        on_outcome: OutcomeCallback,
    ) -> Option<Event> {
        self.silence_alarm();
        // A leftover run must still get its outcome before being replaced.
        self.finish_scheduled_run(ScheduledRunOutcome::Failed {
            reason: REASON_SUPERSEDED.to_string(),
        });
        self.mode = TimerMode::Flow;
        self.session_title = sanitize_title(title);
        self.scheduled_run = Some(ScheduledRun {
            id,
            duration_seconds,
            on_outcome: Some(on_outcome),
        });
        self.remaining = duration_seconds;
        self.started_at = Some(start_date);
        self.is_running = true;
        if self.alerts_enabled {
            self.notifier
                .deliver_scheduled_start_alert(&self.session_title, self.alert_volume, true);
        }
        Some(Event::ScheduledRunStarted {
            id,
            duration_seconds,
            at: self.clock.now(),
        })
    }

    /// Call once per second. Returns the completion event when the session
    /// finishes on this tick.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        if self.remaining == 0 {
            self.is_running = false;
            return Some(self.complete());
        }
        self.remaining -= 1;
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Natural completion: record the session, advance the cycle, alert, ring.
    fn complete(&mut self) -> Event {
        let finished = self.mode;
        let next = self.next_mode_after(finished);
        self.persist_session(self.intended_seconds());
        if finished == TimerMode::Flow {
            self.completed_flows_in_cycle += 1;
        }
        if self.alerts_enabled {
            self.notifier.deliver_completion_alert(
                finished,
                next,
                &self.session_title,
                self.alert_volume,
                true,
            );
        }
        self.alarm_ringing = true;
        self.finish_scheduled_run(ScheduledRunOutcome::Succeeded);
        self.advance_mode_after_completion();
        tracing::debug!(?finished, ?next, "session completed");
        Event::SessionCompleted {
            finished_mode: finished,
            next_mode: next,
            at: self.clock.now(),
        }
    }

    /// Predicted mode after completing `finished`, computed from the cycle
    /// count as it stands before the completion is applied. Must always agree
    /// with [`Self::advance_mode_after_completion`].
    fn next_mode_after(&self, finished: TimerMode) -> TimerMode {
        match finished {
            TimerMode::Flow => {
                let next_count = self.completed_flows_in_cycle + 1;
                if next_count % FLOWS_PER_CYCLE == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                }
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Flow,
        }
    }

    /// Flow -> (short/long) break; break -> flow. Reads the already-updated
    /// cycle count.
    fn advance_mode_after_completion(&mut self) {
        if self.mode == TimerMode::Flow {
            if self.completed_flows_in_cycle > 0
                && self.completed_flows_in_cycle % FLOWS_PER_CYCLE == 0
            {
                self.mode = TimerMode::LongBreak;
            } else {
                self.mode = TimerMode::ShortBreak;
            }
        } else {
            self.mode = TimerMode::Flow;
        }
        self.started_at = None;
        self.remaining = self.intended_seconds();
    }

    fn persist_session(&self, actual_seconds: u32) {
        let Some(store) = self.store.as_ref().and_then(Weak::upgrade) else {
            return;
        };
        let label = if self.mode == TimerMode::Flow {
            self.session_title.clone()
        } else {
            self.mode.label().to_string()
        };
        let session = Session {
            id: Uuid::new_v4(),
            title: label,
            kind: self.mode.session_kind(),
            duration_seconds: self.intended_seconds(),
            actual_seconds,
            start_timestamp: self.started_at,
            end_timestamp: Some(self.clock.now()),
        };
        store.borrow_mut().add(session);
    }

    /// Ends the in-flight scheduled run, if any, delivering its outcome
    /// exactly once. Clearing the run also drops the duration override.
    fn finish_scheduled_run(&mut self, outcome: ScheduledRunOutcome) {
        if let Some(mut run) = self.scheduled_run.take() {
            if let Some(callback) = run.on_outcome.take() {
                callback(run.id, outcome);
            }
        }
    }

    fn silence_alarm(&mut self) {
        if self.alarm_ringing {
            self.notifier.stop_sound();
        }
        self.alarm_ringing = false;
    }
}
