//! End-to-end scenarios wiring the engine, the reconciler, and real storage.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use flowtimer_core::driver::tick_once;
use flowtimer_core::Clock;
use flowtimer_core::{
    Database, Durations, EntryStatus, EntryStore, JsonEntryStore, ManualClock, NullNotifier,
    ScheduleReconciler, ScheduledEntry, SessionStore, StorageError, TimerEngine,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap()
}

fn new_engine(clock: Rc<ManualClock>) -> Rc<RefCell<TimerEngine>> {
    Rc::new(RefCell::new(TimerEngine::new(
        Durations::default(),
        clock,
        Rc::new(NullNotifier),
    )))
}

/// Entry store that snapshots every save, so tests can audit the full
/// sequence of persisted states.
#[derive(Default)]
struct SnapshottingStore {
    initial: Vec<ScheduledEntry>,
    snapshots: Rc<RefCell<Vec<Vec<ScheduledEntry>>>>,
}

impl EntryStore for SnapshottingStore {
    fn load(&self) -> Result<Vec<ScheduledEntry>, StorageError> {
        Ok(self.initial.clone())
    }

    fn save(&self, entries: &[ScheduledEntry]) -> Result<(), StorageError> {
        self.snapshots.borrow_mut().push(entries.to_vec());
        Ok(())
    }
}

#[test]
fn scheduled_entry_lifecycle_survives_a_restart_via_json_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scheduled_entries.json");
    let clock = Rc::new(ManualClock::new(t0()));
    let engine = new_engine(clock.clone());

    let mut reconciler = ScheduleReconciler::new(
        Rc::downgrade(&engine),
        Box::new(JsonEntryStore::new(path.clone())),
        clock.clone(),
    );
    let id = reconciler.schedule(t0(), 1, "Scheduled");

    // Launch tick, sixty countdown ticks, completion tick.
    for _ in 0..62 {
        tick_once(&engine, &mut reconciler, clock.now());
        clock.advance(Duration::seconds(1));
    }
    let entry = reconciler
        .entries()
        .into_iter()
        .find(|e| e.id == id)
        .unwrap();
    assert_eq!(entry.status, EntryStatus::Succeeded);
    assert_eq!(entry.actual_start, Some(t0()));
    assert!(entry.actual_end.is_some());
    drop(reconciler);

    // A fresh process sees the terminal state on disk.
    let reloaded = JsonEntryStore::new(path).load().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].status, EntryStatus::Succeeded);
}

#[test]
fn entry_left_running_on_disk_is_failed_and_the_failure_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scheduled_entries.json");
    let clock = Rc::new(ManualClock::new(t0()));
    let engine = new_engine(clock.clone());

    let mut orphan = ScheduledEntry::new(
        "Interrupted".into(),
        t0() - Duration::hours(2),
        1800,
        t0() - Duration::hours(3),
    );
    orphan.status = EntryStatus::Running;
    orphan.actual_start = Some(t0() - Duration::hours(2));
    JsonEntryStore::new(path.clone()).save(&[orphan]).unwrap();

    let reconciler = ScheduleReconciler::new(
        Rc::downgrade(&engine),
        Box::new(JsonEntryStore::new(path.clone())),
        clock.clone(),
    );

    // Failed before any tick ran.
    let entry = &reconciler.entries()[0];
    assert_eq!(entry.status, EntryStatus::Failed);
    assert_eq!(entry.note.as_deref(), Some("Restarted while running"));

    let reloaded = JsonEntryStore::new(path).load().unwrap();
    assert_eq!(reloaded[0].status, EntryStatus::Failed);
    assert_eq!(reloaded[0].note.as_deref(), Some("Restarted while running"));
}

#[test]
fn preemption_saves_the_partial_user_session_to_the_database() {
    let clock = Rc::new(ManualClock::new(t0()));
    let engine = new_engine(clock.clone());
    let db = Rc::new(RefCell::new(Database::open_in_memory().unwrap()));
    let dyn_store: Rc<RefCell<dyn SessionStore>> = db.clone();
    engine.borrow_mut().attach_store(Rc::downgrade(&dyn_store));

    engine.borrow_mut().start();
    for _ in 0..90 {
        clock.advance(Duration::seconds(1));
        engine.borrow_mut().tick();
    }
    assert_eq!(engine.borrow().elapsed_seconds(), 90);

    let mut reconciler = ScheduleReconciler::with_entries(
        Rc::downgrade(&engine),
        Vec::new(),
        None,
        clock.clone(),
    );
    let id = reconciler.schedule(t0(), 20, "Scheduled");
    reconciler.tick(clock.now());

    // The ad-hoc session went to the history as a partial record.
    let sessions = db.borrow().sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].actual_seconds, 90);
    assert_eq!(sessions[0].duration_seconds, 25 * 60);

    // And the commitment took over the engine.
    assert_eq!(reconciler.active_entry(), Some(id));
    assert_eq!(engine.borrow().remaining_seconds(), 20 * 60);
}

#[test]
fn stopping_a_launched_entry_records_the_reason() {
    let clock = Rc::new(ManualClock::new(t0()));
    let engine = new_engine(clock.clone());
    let mut reconciler = ScheduleReconciler::with_entries(
        Rc::downgrade(&engine),
        Vec::new(),
        None,
        clock.clone(),
    );
    let id = reconciler.schedule(t0(), 20, "Scheduled");
    reconciler.tick(clock.now());
    assert_eq!(reconciler.active_entry(), Some(id));

    clock.advance(Duration::seconds(30));
    engine.borrow_mut().stop_and_save_partial();

    let entry = reconciler
        .entries()
        .into_iter()
        .find(|e| e.id == id)
        .unwrap();
    assert_eq!(entry.status, EntryStatus::Failed);
    assert_eq!(entry.note.as_deref(), Some("Stopped before completion"));
    assert_eq!(entry.actual_end, Some(clock.now()));
    assert_eq!(reconciler.active_entry(), None);
}

#[test]
fn persisted_status_sequences_only_ever_move_forward() {
    let snapshots = Rc::new(RefCell::new(Vec::new()));
    let store = SnapshottingStore {
        initial: Vec::new(),
        snapshots: snapshots.clone(),
    };
    let clock = Rc::new(ManualClock::new(t0()));
    let engine = new_engine(clock.clone());
    let mut reconciler = ScheduleReconciler::new(
        Rc::downgrade(&engine),
        Box::new(store),
        clock.clone(),
    );

    // One expires unlaunched, one runs to completion, one conflicts while
    // the second occupies the engine.
    let expired = reconciler.schedule(t0() - Duration::hours(1), 1, "Expired");
    let completed = reconciler.schedule(t0(), 1, "Completed");
    let conflicted = reconciler.schedule(t0() + Duration::seconds(2), 60, "Conflicted");

    for _ in 0..62 {
        tick_once(&engine, &mut reconciler, clock.now());
        clock.advance(Duration::seconds(1));
    }

    let allowed: [&[EntryStatus]; 4] = [
        &[EntryStatus::Pending],
        &[EntryStatus::Pending, EntryStatus::Failed],
        &[
            EntryStatus::Pending,
            EntryStatus::Running,
            EntryStatus::Succeeded,
        ],
        &[
            EntryStatus::Pending,
            EntryStatus::Running,
            EntryStatus::Failed,
        ],
    ];

    for id in [expired, completed, conflicted] {
        let mut observed: Vec<EntryStatus> = Vec::new();
        for snapshot in snapshots.borrow().iter() {
            if let Some(entry) = snapshot.iter().find(|e| e.id == id) {
                if observed.last() != Some(&entry.status) {
                    observed.push(entry.status);
                }
            }
        }
        assert!(
            allowed.iter().any(|legal| *legal == observed.as_slice()),
            "illegal status sequence {observed:?}"
        );
    }

    let status_of = |id| {
        reconciler
            .entries()
            .into_iter()
            .find(|e: &ScheduledEntry| e.id == id)
            .unwrap()
    };
    let expired_entry = status_of(expired);
    assert_eq!(expired_entry.status, EntryStatus::Failed);
    assert_eq!(expired_entry.note.as_deref(), Some("Missed scheduled window"));
    assert_eq!(status_of(completed).status, EntryStatus::Succeeded);
    let conflicted_entry = status_of(conflicted);
    assert_eq!(conflicted_entry.status, EntryStatus::Failed);
    assert_eq!(
        conflicted_entry.note.as_deref(),
        Some("Conflicted with a running timer")
    );
}
