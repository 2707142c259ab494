use serde::{Deserialize, Serialize};

use crate::session::SessionKind;

/// Fallback session title when the user supplies an empty one.
pub const DEFAULT_SESSION_TITLE: &str = "Flow";

/// Completed flows per cycle; the cycle's last flow is followed by a long break.
pub const FLOWS_PER_CYCLE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Flow,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    /// Human-readable mode label, used as the session title for breaks.
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Flow => "Flow",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        matches!(self, TimerMode::ShortBreak | TimerMode::LongBreak)
    }

    pub fn session_kind(self) -> SessionKind {
        match self {
            TimerMode::Flow => SessionKind::Flow,
            TimerMode::ShortBreak => SessionKind::ShortBreak,
            TimerMode::LongBreak => SessionKind::LongBreak,
        }
    }
}

/// User-adjustable session durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub flow: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Durations {
    pub fn for_mode(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Flow => self.flow,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            flow: 25 * 60,
            short_break: 5 * 60,
            long_break: 30 * 60,
        }
    }
}

/// Trims the raw title and falls back to [`DEFAULT_SESSION_TITLE`] when the
/// result is empty.
pub(crate) fn sanitize_title(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_SESSION_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaks_use_mode_label_kinds() {
        assert_eq!(TimerMode::Flow.session_kind(), SessionKind::Flow);
        assert_eq!(TimerMode::ShortBreak.session_kind(), SessionKind::ShortBreak);
        assert_eq!(TimerMode::LongBreak.session_kind(), SessionKind::LongBreak);
        assert!(TimerMode::ShortBreak.is_break());
        assert!(!TimerMode::Flow.is_break());
    }

    #[test]
    fn sanitize_falls_back_on_whitespace() {
        assert_eq!(sanitize_title("  Deep Work  "), "Deep Work");
        assert_eq!(sanitize_title("   "), DEFAULT_SESSION_TITLE);
        assert_eq!(sanitize_title(""), DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn default_durations_match_menu_defaults() {
        let d = Durations::default();
        assert_eq!(d.for_mode(TimerMode::Flow), 25 * 60);
        assert_eq!(d.for_mode(TimerMode::ShortBreak), 5 * 60);
        assert_eq!(d.for_mode(TimerMode::LongBreak), 30 * 60);
    }
}
