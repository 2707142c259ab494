//! SQLite-based session storage.
//!
//! Durable home for the append-only session history and the aggregate
//! queries reporting reads from it. Records are written once and never
//! updated; deletion only happens on explicit user request.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::data_dir;
use crate::error::StorageError;
use crate::session::{Session, SessionKind, SessionStore};

/// Format session kind for database storage
fn format_session_kind(kind: SessionKind) -> &'static str {
    match kind {
        SessionKind::Flow => "flow",
        SessionKind::ShortBreak => "shortBreak",
        SessionKind::LongBreak => "longBreak",
        SessionKind::Custom => "custom",
    }
}

/// Parse session kind from database string
fn parse_session_kind(kind_str: &str) -> SessionKind {
    match kind_str {
        "shortBreak" => SessionKind::ShortBreak,
        "longBreak" => SessionKind::LongBreak,
        "custom" => SessionKind::Custom,
        _ => SessionKind::Flow,
    }
}

fn parse_optional_datetime(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

fn row_to_session(row: &rusqlite::Row) -> Result<Session, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let kind_str: String = row.get(2)?;
    let started_at: Option<String> = row.get(5)?;
    let ended_at: Option<String> = row.get(6)?;
    Ok(Session {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        title: row.get(1)?,
        kind: parse_session_kind(&kind_str),
        duration_seconds: row.get(3)?,
        actual_seconds: row.get(4)?,
        start_timestamp: parse_optional_datetime(started_at),
        end_timestamp: parse_optional_datetime(ended_at),
    })
}

/// SQLite database holding the session history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/flowtimer/flowtimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("flowtimer.db");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                actual_seconds INTEGER NOT NULL,
                started_at TEXT,
                ended_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_started_at
                ON sessions (started_at);",
        )?;
        Ok(())
    }

    /// Append one session record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_session(&self, session: &Session) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO sessions
                (id, title, kind, duration_seconds, actual_seconds, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id.to_string(),
                session.title,
                format_session_kind(session.kind),
                session.duration_seconds,
                session.actual_seconds,
                session.start_timestamp.map(|dt| dt.to_rfc3339()),
                session.end_timestamp.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// All sessions ordered by start timestamp; never-started imports first.
    pub fn sessions(&self) -> Result<Vec<Session>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, kind, duration_seconds, actual_seconds, started_at, ended_at
             FROM sessions
             ORDER BY started_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_session)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    pub fn session(&self, id: Uuid) -> Result<Option<Session>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, kind, duration_seconds, actual_seconds, started_at, ended_at
             FROM sessions WHERE id = ?1",
        )?;
        Ok(stmt
            .query_row(params![id.to_string()], row_to_session)
            .optional()?)
    }

    /// Explicit user deletion; returns whether a record was removed.
    pub fn delete_session(&self, id: Uuid) -> Result<bool, StorageError> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }

    /// Sum of actual elapsed seconds over the whole history.
    pub fn total_actual_seconds(&self) -> Result<u64, StorageError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(actual_seconds), 0) FROM sessions",
            [],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    /// Sum of actual elapsed seconds for sessions started inside the range.
    /// Pairs with `stats::baseline_seconds` for normalized reporting.
    pub fn total_actual_seconds_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(actual_seconds), 0) FROM sessions
             WHERE started_at IS NOT NULL AND started_at >= ?1 AND started_at < ?2",
            params![start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }
}

impl SessionStore for Database {
    /// Fire-and-forget append: the engine never learns about write failures.
    fn add(&mut self, session: Session) {
        if let Err(err) = self.insert_session(&session) {
            tracing::warn!(error = %err, "failed to persist session record");
        }
    }
}
