//! # Flowtimer Core Library
//!
//! Core business logic for Flowtimer: timed focus/break sessions ("flows")
//! plus pre-scheduled sessions that must start automatically at a wall-clock
//! time, even when nobody is watching the app. The GUI shell is a thin layer
//! over this crate and talks to it only through the ports defined here.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a single-session countdown state machine; the caller
//!   drives it by invoking `tick()` once per second
//! - **Schedule Reconciler**: owns the scheduled-entry list and reconciles it
//!   against the engine once per second, launching due entries and recording
//!   why any entry did not run to completion
//! - **Storage**: JSON entry list, SQLite session history, and TOML-based
//!   configuration
//! - **Stats**: pure reporting helpers (capped daily focus capacity)
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`ScheduleReconciler`]: entry scheduler/reconciler
//! - [`Database`]: session persistence
//! - [`Config`]: application configuration management

pub mod clock;
pub mod driver;
pub mod error;
pub mod events;
pub mod notify;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, StorageError};
pub use events::Event;
pub use notify::{Notifier, NullNotifier};
pub use scheduler::{EntryStatus, ScheduleReconciler, ScheduledEntry};
pub use session::{Session, SessionKind, SessionStore};
pub use stats::baseline_seconds;
pub use storage::{Config, Database, EntryStore, JsonEntryStore};
pub use timer::{Durations, ScheduledRunOutcome, TimerEngine, TimerMode};
