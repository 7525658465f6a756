//! Draft retention window

use chrono::{DateTime, Duration, Utc};

/// Drafts older than this are hidden from listings (24 hours)
pub const DEFAULT_RETENTION_HOURS: u32 = 24;

/// Lifetime of a draft, measured from its last write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    window: Duration,
}

impl RetentionWindow {
    pub fn new(window: Duration) -> Self {
        RetentionWindow { window }
    }

    pub fn from_hours(hours: u32) -> Self {
        RetentionWindow::new(Duration::hours(hours as i64))
    }

    pub fn duration(&self) -> Duration {
        self.window
    }

    /// A draft is active while strictly younger than the window
    pub fn is_active(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at < self.window
    }

    /// Time left before `created_at` drops out of listings, if any
    pub fn remaining(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
        let left = self.window - (now - created_at);
        (left > Duration::zero()).then_some(left)
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        RetentionWindow::from_hours(DEFAULT_RETENTION_HOURS)
    }
}
