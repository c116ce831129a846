use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Pending,
    InProgress,
    Done,
    Archived,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Archived,
    ];

    /// Name as stored in the database and matched by the text filter
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<TaskStatus> {
        TaskStatus::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// Single-cell glyph shown in the list
    pub fn glyph(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "·",
            TaskStatus::Pending => "○",
            TaskStatus::InProgress => "◐",
            TaskStatus::Done => "●",
            TaskStatus::Archived => "▪",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. Variant order is the total order low < medium < high < urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parse a stored priority name
    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }

    /// Parse a user-typed priority keyword, accepting the short forms
    /// (`l`, `med`/`m`, `hi`/`h`, `u`). Case-insensitive.
    pub fn from_keyword(s: &str) -> Option<Priority> {
        match s.to_lowercase().as_str() {
            "low" | "l" => Some(Priority::Low),
            "medium" | "med" | "m" => Some(Priority::Medium),
            "high" | "hi" | "h" => Some(Priority::High),
            "urgent" | "u" => Some(Priority::Urgent),
            _ => None,
        }
    }

    /// low → medium → high → urgent → low
    pub fn cycle(self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Urgent,
            Priority::Urgent => Priority::Low,
        }
    }

    /// Sort rank where urgent sorts first
    pub fn weight(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Short badge shown in the list
    pub fn badge(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "med",
            Priority::High => "HI",
            Priority::Urgent => "URG",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task, with its loaded relations.
///
/// `tags`, `subtasks` and `dependencies` are filled in by the loader; a task
/// fresh from a row query has them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub project_id: Option<String>,
    pub parent_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Estimated effort in minutes
    pub time_estimate: Option<i64>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Task>,
}

impl Task {
    /// A new pending, medium-priority task with a fresh id
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            project_id: None,
            parent_id: None,
            due_date: None,
            start_date: None,
            completed_at: None,
            time_estimate: None,
            position: 0,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            subtasks: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Set the status, keeping `completed_at` set exactly when the task is done.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        if status == TaskStatus::Done {
            if self.status != TaskStatus::Done || self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.status = status;
        self.updated_at = now;
    }

    /// done → pending, anything else → done
    pub fn toggle_done(&mut self, now: DateTime<Utc>) {
        let next = if self.status == TaskStatus::Done {
            TaskStatus::Pending
        } else {
            TaskStatus::Done
        };
        self.set_status(next, now);
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => !self.is_done() && due < now,
            None => false,
        }
    }

    pub fn is_due_today(&self, now: DateTime<Local>) -> bool {
        self.due_date
            .is_some_and(|due| due.with_timezone(&Local).date_naive() == now.date_naive())
    }

    /// The task without its loaded relations other than tags. Used for undo
    /// snapshots of field edits.
    pub fn without_relations(&self) -> Task {
        Task {
            subtasks: Vec::new(),
            dependencies: Vec::new(),
            ..self.clone()
        }
    }
}
