//! Scheduled entries: future commitments to auto-start a session.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Forward-only entry status. Legal sequences are
/// `pending -> running -> {succeeded, failed}` and `pending -> failed`;
/// nothing ever moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// A commitment to auto-start a session at `start_date`.
///
/// Serialized exactly as stored on disk: camelCase keys, ISO-8601 dates,
/// lowercase status, null for absent note/actual timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEntry {
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub duration_seconds: u32,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Failure reason; set only when status is `Failed`.
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
}

impl ScheduledEntry {
    pub fn new(
        title: String,
        start_date: DateTime<Utc>,
        duration_seconds: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            start_date,
            duration_seconds,
            status: EntryStatus::Pending,
            created_at,
            updated_at: created_at,
            note: None,
            actual_start: None,
            actual_end: None,
        }
    }

    /// Close of the entry's launch window.
    pub fn end_date(&self) -> DateTime<Utc> {
        self.start_date + Duration::seconds(self.duration_seconds as i64)
    }

    /// The window has closed without room left to run.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date() <= now
    }

    pub fn starts_on(&self, day: NaiveDate) -> bool {
        self.start_date.date_naive() == day
    }
}
