mod entry;
mod reconciler;

pub use entry::{EntryStatus, ScheduledEntry};
pub use reconciler::ScheduleReconciler;
