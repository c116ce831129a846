use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block of time logged against a task. An entry without `ended_at` is the
/// running timer; at most one exists at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub description: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Minutes, filled in when the entry is closed
    pub duration: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Elapsed time for a running entry, or the recorded duration
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        match (self.ended_at, self.duration) {
            (None, _) => now - self.started_at,
            (Some(_), Some(minutes)) => chrono::Duration::minutes(minutes),
            (Some(end), None) => end - self.started_at,
        }
    }
}

/// `1h05m03s`-style stopwatch text
pub fn format_elapsed(d: chrono::Duration) -> String {
    let secs = d.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else {
        format!("{}m{:02}s", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwatch_format() {
        assert_eq!(format_elapsed(chrono::Duration::seconds(59)), "0m59s");
        assert_eq!(format_elapsed(chrono::Duration::seconds(3 * 3600 + 61)), "3h01m01s");
        assert_eq!(format_elapsed(chrono::Duration::seconds(-4)), "0m00s");
    }
}
