//! Historical session records.
//!
//! A [`Session`] is written once when a countdown finishes or is stopped with
//! progress, and never mutated afterwards. Imported history may lack one or
//! both timestamps, so both are optional. Both the intended duration and the
//! actual elapsed seconds are kept so statistics can distinguish "planned"
//! from "done".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Flow,
    ShortBreak,
    LongBreak,
    Custom,
}

/// Append-only record of one completed or aborted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub kind: SessionKind,
    /// Intended duration at start, in seconds.
    pub duration_seconds: u32,
    /// Actual elapsed seconds; may be less than intended if stopped early.
    pub actual_seconds: u32,
    #[serde(default)]
    pub start_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
}

/// Durable sink for session records. Appends are fire-and-forget: the engine
/// never learns whether a write stuck.
pub trait SessionStore {
    fn add(&mut self, session: Session);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_serializes_with_camel_case_keys() {
        let session = Session {
            id: Uuid::nil(),
            title: "Flow".into(),
            kind: SessionKind::ShortBreak,
            duration_seconds: 300,
            actual_seconds: 120,
            start_timestamp: None,
            end_timestamp: None,
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["kind"], "shortBreak");
        assert_eq!(value["durationSeconds"], 300);
        assert_eq!(value["actualSeconds"], 120);
        assert!(value["startTimestamp"].is_null());
    }
}
