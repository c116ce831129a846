use chrono::{DateTime, Duration, Utc};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use super::{Store, StoreError};
use crate::model::TimeEntry;

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: row.get(0)?,
        task_id: row.get(1)?,
        description: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        duration: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const ENTRY_COLUMNS: &str = "id, task_id, description, started_at, ended_at, duration, created_at";

impl Store {
    /// The running timer, if any.
    pub fn active_time_entry(&self) -> Result<Option<TimeEntry>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!(
            "SELECT {} FROM time_entries WHERE ended_at IS NULL ORDER BY started_at DESC LIMIT 1",
            ENTRY_COLUMNS
        );
        Ok(self.conn.query_row(&sql, [], entry_from_row).optional()?)
    }

    /// Start a timer on `task_id`, closing any timer that is already running.
    pub fn start_timer(&self, task_id: &str, now: DateTime<Utc>) -> Result<TimeEntry, StoreError> {
        self.stop_timer(now)?;
        let entry = TimeEntry {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            description: None,
            started_at: now,
            ended_at: None,
            duration: None,
            created_at: now,
        };
        self.insert_entry(&entry)?;
        debug!(task_id, "timer started");
        Ok(entry)
    }

    /// Close the running timer, recording its duration in whole minutes.
    pub fn stop_timer(&self, now: DateTime<Utc>) -> Result<Option<TimeEntry>, StoreError> {
        let Some(mut entry) = self.active_time_entry()? else {
            return Ok(None);
        };
        let minutes = (now - entry.started_at).num_minutes().max(0);
        entry.ended_at = Some(now);
        entry.duration = Some(minutes);

        let _cursor = self.open_cursor()?;
        self.conn.execute(
            "UPDATE time_entries SET ended_at = ?2, duration = ?3 WHERE id = ?1",
            params![entry.id, entry.ended_at, entry.duration],
        )?;
        debug!(task_id = %entry.task_id, minutes, "timer stopped");
        Ok(Some(entry))
    }

    /// Log a finished block of `minutes` ending now.
    pub fn add_time_entry(
        &self,
        task_id: &str,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, StoreError> {
        if minutes <= 0 {
            return Err(StoreError::Invalid("duration must be positive".into()));
        }
        let started_at = Duration::try_minutes(minutes)
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or_else(|| StoreError::Invalid(format!("duration too long: {} minutes", minutes)))?;
        let entry = TimeEntry {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            description: None,
            started_at,
            ended_at: Some(now),
            duration: Some(minutes),
            created_at: now,
        };
        self.insert_entry(&entry)?;
        Ok(entry)
    }

    pub fn time_entries_for_task(&self, task_id: &str) -> Result<Vec<TimeEntry>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!(
            "SELECT {} FROM time_entries WHERE task_id = ?1 ORDER BY started_at",
            ENTRY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([task_id], entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Put back entries removed along with their task. A running entry is
    /// closed at `now` when another timer has started since.
    pub fn restore_time_entries(
        &self,
        entries: &[TimeEntry],
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let active = self.active_time_entry()?;
        for entry in entries {
            if entry.is_running() && active.is_some() {
                let mut closed = entry.clone();
                closed.ended_at = Some(now);
                closed.duration = Some((now - entry.started_at).num_minutes().max(0));
                self.insert_entry(&closed)?;
            } else {
                self.insert_entry(entry)?;
            }
        }
        Ok(())
    }

    fn insert_entry(&self, entry: &TimeEntry) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        self.conn.execute(
            "INSERT INTO time_entries (id, task_id, description, started_at, ended_at, duration, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.task_id,
                entry.description,
                entry.started_at,
                entry.ended_at,
                entry.duration,
                entry.created_at,
            ],
        )?;
        Ok(())
    }
}
