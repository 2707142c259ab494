//! Entry scheduler and reconciler.
//!
//! Owns the list of scheduled entries and keeps it consistent with the
//! passage of time and with what the engine is actually doing. A 1 Hz
//! `tick(now)` expires missed windows, launches due entries (preempting an
//! ad-hoc session if one is running), and records why any entry did not run
//! to completion. A scheduled commitment always wins over an ad-hoc session,
//! but two scheduled commitments never run at once: the loser is failed with
//! a note rather than silently dropped.
//!
//! The reconciler holds a non-owning handle to the engine; it must never be
//! the engine's only owner, because the engine also serves direct
//! user-driven sessions.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::entry::{EntryStatus, ScheduledEntry};
use crate::clock::Clock;
use crate::storage::EntryStore;
use crate::timer::{sanitize_title, ScheduledRunOutcome, TimerEngine};

pub(crate) const NOTE_MISSED_WINDOW: &str = "Missed scheduled window";
pub(crate) const NOTE_CONFLICT: &str = "Conflicted with a running timer";
pub(crate) const NOTE_TIMER_UNAVAILABLE: &str = "Timer unavailable";
pub(crate) const NOTE_RESTARTED: &str = "Restarted while running";

/// Entry list plus the bookkeeping the outcome callback needs. Kept behind
/// its own `Rc<RefCell<..>>` so the callback stored in the engine can reach
/// it without touching the engine itself.
struct SchedulerState {
    entries: Vec<ScheduledEntry>,
    active_entry: Option<Uuid>,
    store: Option<Box<dyn EntryStore>>,
    clock: Rc<dyn Clock>,
}

impl SchedulerState {
    /// Terminal transition: status + note, with `actual_end`/`updated_at`
    /// stamped unconditionally. Persists when the entry exists.
    fn mark(&mut self, id: Uuid, status: EntryStatus, note: Option<String>) {
        let now = self.clock.now();
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return;
        };
        entry.status = status;
        entry.note = note;
        entry.actual_end = Some(now);
        entry.updated_at = now;
        self.persist();
    }

    fn handle_outcome(&mut self, id: Uuid, outcome: ScheduledRunOutcome) {
        let (status, note) = match outcome {
            ScheduledRunOutcome::Succeeded => (EntryStatus::Succeeded, None),
            ScheduledRunOutcome::Failed { reason } => (EntryStatus::Failed, Some(reason)),
        };
        self.mark(id, status, note);
        if self.active_entry == Some(id) {
            self.active_entry = None;
        }
    }

    fn sort_entries(&mut self) {
        self.entries
            .sort_by_key(|e| (e.start_date, e.created_at));
    }

    /// Whole-list overwrite; errors are logged and swallowed.
    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save(&self.entries) {
            tracing::warn!(error = %err, "failed to persist scheduled entries");
        }
    }
}

/// Best-effort, single-writer preemptive scheduler over the timer engine.
pub struct ScheduleReconciler {
    state: Rc<RefCell<SchedulerState>>,
    engine: Weak<RefCell<TimerEngine>>,
}

impl ScheduleReconciler {
    /// Load persisted entries and recover from an abnormal restart: an entry
    /// can only legally be `running` while its owning process is alive, so a
    /// `running` status surviving into a fresh load means the process died
    /// mid-session.
    pub fn new(
        engine: Weak<RefCell<TimerEngine>>,
        store: Box<dyn EntryStore>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let entries = match store.load() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load scheduled entries; starting empty");
                Vec::new()
            }
        };
        Self::from_parts(engine, entries, Some(store), clock)
    }

    /// Construct from explicit entries; `store: None` disables persistence.
    pub fn with_entries(
        engine: Weak<RefCell<TimerEngine>>,
        entries: Vec<ScheduledEntry>,
        store: Option<Box<dyn EntryStore>>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self::from_parts(engine, entries, store, clock)
    }

    fn from_parts(
        engine: Weak<RefCell<TimerEngine>>,
        entries: Vec<ScheduledEntry>,
        store: Option<Box<dyn EntryStore>>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let state = SchedulerState {
            entries,
            active_entry: None,
            store,
            clock,
        };
        let reconciler = Self {
            state: Rc::new(RefCell::new(state)),
            engine,
        };
        reconciler.recover_running_entries();
        reconciler
    }

    pub fn attach_engine(&mut self, engine: Weak<RefCell<TimerEngine>>) {
        self.engine = engine;
    }

    // ── Entry management ─────────────────────────────────────────────

    /// Append a pending entry. Empty titles fall back to the default and the
    /// duration is clamped to at least one minute. Returns the new entry id.
    pub fn schedule(
        &mut self,
        start_date: DateTime<Utc>,
        duration_minutes: u32,
        title: &str,
    ) -> Uuid {
        let mut state = self.state.borrow_mut();
        let now = state.clock.now();
        let entry = ScheduledEntry::new(
            sanitize_title(title),
            start_date,
            duration_minutes.max(1) * 60,
            now,
        );
        let id = entry.id;
        state.entries.push(entry);
        state.sort_entries();
        state.persist();
        id
    }

    /// Remove an entry. Deleting the active entry clears the active marker
    /// without retroactively failing it; the in-flight session keeps running.
    pub fn delete(&mut self, id: Uuid) {
        let mut state = self.state.borrow_mut();
        state.entries.retain(|e| e.id != id);
        if state.active_entry == Some(id) {
            state.active_entry = None;
        }
        state.persist();
    }

    pub fn entries(&self) -> Vec<ScheduledEntry> {
        self.state.borrow().entries.clone()
    }

    /// Entries whose start falls on the given calendar day, by start time.
    pub fn entries_on(&self, day: NaiveDate) -> Vec<ScheduledEntry> {
        let mut matching: Vec<ScheduledEntry> = self
            .state
            .borrow()
            .entries
            .iter()
            .filter(|e| e.starts_on(day))
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.start_date);
        matching
    }

    pub fn scheduled_count_on(&self, day: NaiveDate) -> usize {
        self.entries_on(day).len()
    }

    pub fn active_entry(&self) -> Option<Uuid> {
        self.state.borrow().active_entry
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// One reconciliation pass. Invoked once per second; every step is
    /// idempotent, so a missed or doubled tick cannot corrupt the list.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.fail_expired_pending(now);

        let Some(engine) = self.engine.upgrade() else {
            self.fail_due_entries_without_timer(now);
            return;
        };

        let engine_running = engine.borrow().is_running();
        let entry_active = self.state.borrow().active_entry.is_some();

        // A due commitment preempts an ad-hoc session.
        if engine_running && !entry_active {
            if let Some(next) = self.next_runnable(now) {
                engine.borrow_mut().stop_and_save_partial();
                self.launch(next, &engine, now);
                return;
            }
        }

        if engine_running && entry_active {
            self.fail_conflicting_pending(now);
        }

        if self.state.borrow().active_entry.is_some() {
            return;
        }
        if engine.borrow().is_running() {
            return;
        }
        let Some(next) = self.next_runnable(now) else {
            return;
        };
        self.launch(next, &engine, now);
    }

    /// Earliest runnable entry: pending, due, window still open. Ties break
    /// by creation time.
    fn next_runnable(&self, now: DateTime<Utc>) -> Option<ScheduledEntry> {
        self.state
            .borrow()
            .entries
            .iter()
            .filter(|e| {
                e.status == EntryStatus::Pending && e.start_date <= now && !e.is_expired_at(now)
            })
            .min_by_key(|e| (e.start_date, e.created_at))
            .cloned()
    }

    fn launch(
        &mut self,
        entry: ScheduledEntry,
        engine: &Rc<RefCell<TimerEngine>>,
        now: DateTime<Utc>,
    ) {
        {
            let mut state = self.state.borrow_mut();
            state.active_entry = Some(entry.id);
            if let Some(stored) = state.entries.iter_mut().find(|e| e.id == entry.id) {
                stored.status = EntryStatus::Running;
                stored.actual_start = Some(now);
                stored.updated_at = now;
            }
            state.persist();
        }

        let callback_state = Rc::downgrade(&self.state);
        engine.borrow_mut().start_scheduled_run(
            entry.id,
            &entry.title,
            entry.duration_seconds,
            entry.start_date,
            Box::new(move |id, outcome| {
                let Some(state) = callback_state.upgrade() else {
                    return;
                };
                state.borrow_mut().handle_outcome(id, outcome);
            }),
        );
        tracing::debug!(entry = %entry.id, "launched scheduled entry");
    }

    fn fail_expired_pending(&mut self, now: DateTime<Utc>) {
        let mut state = self.state.borrow_mut();
        let expired: Vec<Uuid> = state
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Pending && e.is_expired_at(now))
            .map(|e| e.id)
            .collect();
        for id in expired {
            state.mark(id, EntryStatus::Failed, Some(NOTE_MISSED_WINDOW.to_string()));
        }
    }

    /// The engine is occupied by an active entry, so every other due pending
    /// entry could not run and is failed.
    fn fail_conflicting_pending(&mut self, now: DateTime<Utc>) {
        let mut state = self.state.borrow_mut();
        let conflicting: Vec<Uuid> = state
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Pending && e.start_date <= now)
            .map(|e| e.id)
            .collect();
        for id in conflicting {
            state.mark(id, EntryStatus::Failed, Some(NOTE_CONFLICT.to_string()));
        }
    }

    fn fail_due_entries_without_timer(&mut self, now: DateTime<Utc>) {
        let mut state = self.state.borrow_mut();
        let due: Vec<Uuid> = state
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Pending && e.start_date <= now)
            .map(|e| e.id)
            .collect();
        for id in due {
            state.mark(
                id,
                EntryStatus::Failed,
                Some(NOTE_TIMER_UNAVAILABLE.to_string()),
            );
        }
    }

    fn recover_running_entries(&self) {
        let mut state = self.state.borrow_mut();
        let running: Vec<Uuid> = state
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Running)
            .map(|e| e.id)
            .collect();
        for id in running {
            state.mark(id, EntryStatus::Failed, Some(NOTE_RESTARTED.to_string()));
        }
    }
}
