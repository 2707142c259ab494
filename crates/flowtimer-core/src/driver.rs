//! 1 Hz tick driver.
//!
//! Glue between the host's executor and the synchronous core: once per
//! second it advances the engine's countdown and runs one reconciliation
//! pass. All logic stays inside the ticked components.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::scheduler::ScheduleReconciler;
use crate::timer::TimerEngine;

/// One synchronous tick of the whole core: engine countdown first, then the
/// reconciliation pass.
pub fn tick_once(
    engine: &Rc<RefCell<TimerEngine>>,
    reconciler: &mut ScheduleReconciler,
    now: DateTime<Utc>,
) {
    if let Some(event) = engine.borrow_mut().tick() {
        tracing::debug!(?event, "timer event");
    }
    reconciler.tick(now);
}

/// Repeating 1 Hz loop around [`tick_once`]. Runs until the host drops the
/// future; the core owns no background threads of its own.
pub async fn run(
    engine: Rc<RefCell<TimerEngine>>,
    mut reconciler: ScheduleReconciler,
    clock: Rc<dyn Clock>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        tick_once(&engine, &mut reconciler, clock.now());
    }
}
