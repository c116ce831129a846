use std::collections::HashSet;

use chrono::Local;
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{Priority, Project, Tag, Task, TaskStatus};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub tags: Vec<String>,
    /// Local calendar date, `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Serialize)]
pub struct TagJson {
    pub id: String,
    pub name: String,
    pub color: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, blocked: &HashSet<String>) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        status: task.status,
        priority: task.priority,
        project: task.project_id.clone(),
        tags: task.tags.iter().map(|t| t.display_name()).collect(),
        due: task
            .due_date
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string()),
        blocked: blocked.contains(&task.id),
        subtasks: task
            .subtasks
            .iter()
            .map(|s| task_to_json(s, blocked))
            .collect(),
    }
}

pub fn project_to_json(project: &Project) -> ProjectJson {
    ProjectJson {
        id: project.id.clone(),
        name: project.name.clone(),
        color: project.color.clone(),
    }
}

pub fn tag_to_json(tag: &Tag) -> TagJson {
    TagJson {
        id: tag.id.clone(),
        name: tag.display_name(),
        color: tag.color.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single task as a one-line summary:
/// `○ [high] Fix bug #Work @urgent due 2024-03-05 (blocked)`
pub fn format_task_line(
    task: &Task,
    projects: &IndexMap<String, Project>,
    blocked: &HashSet<String>,
) -> String {
    let mut line = format!(
        "{} [{}] {}",
        task.status.glyph(),
        task.priority,
        task.title
    );

    // Subtasks share their parent's project
    if !task.is_subtask()
        && let Some(project) = task.project_id.as_ref().and_then(|id| projects.get(id))
        && !project.is_inbox()
    {
        line.push_str(&format!(" #{}", project.name));
    }
    for tag in &task.tags {
        line.push(' ');
        line.push_str(&tag.display_name());
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.with_timezone(&Local).format("%Y-%m-%d")));
    }
    if blocked.contains(&task.id) {
        line.push_str(" (blocked)");
    }
    line
}

/// Format a task with its subtasks, indented
pub fn format_task_tree(
    task: &Task,
    projects: &IndexMap<String, Project>,
    blocked: &HashSet<String>,
) -> Vec<String> {
    let mut lines = vec![format_task_line(task, projects, blocked)];
    for sub in &task.subtasks {
        lines.push(format!("  {}", format_task_line(sub, projects, blocked)));
    }
    lines
}

pub fn format_project_line(project: &Project) -> String {
    format!("{:<16} {:<20} {}", project.id, project.name, project.color)
}

pub fn format_tag_line(tag: &Tag) -> String {
    format!("{:<20} {}", tag.display_name(), tag.color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INBOX_ID;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn projects() -> IndexMap<String, Project> {
        let now = Utc::now();
        let mut map = IndexMap::new();
        let mut inbox = Project::new("Inbox", "#61AFEF", now);
        inbox.id = INBOX_ID.into();
        map.insert(inbox.id.clone(), inbox);
        let work = Project::new("Work", "#E06C75", now);
        map.insert(work.id.clone(), work);
        map
    }

    #[test]
    fn line_shows_project_tags_and_blocked() {
        let now = Utc::now();
        let mut task = Task::new("Fix bug", now);
        task.project_id = Some("work".into());
        task.priority = Priority::High;
        task.tags.push(Tag::new("urgent", "#fff000", now));
        let blocked: HashSet<String> = [task.id.clone()].into_iter().collect();

        assert_eq!(
            format_task_line(&task, &projects(), &blocked),
            "\u{25CB} [high] Fix bug #Work @urgent (blocked)"
        );
    }

    #[test]
    fn inbox_is_not_shown_and_subtasks_indent() {
        let now = Utc::now();
        let mut parent = Task::new("Parent", now);
        parent.project_id = Some(INBOX_ID.into());
        let mut child = Task::new("Child", now);
        child.parent_id = Some(parent.id.clone());
        child.project_id = Some(INBOX_ID.into());
        child.set_status(TaskStatus::Done, now);
        parent.subtasks.push(child);

        let lines = format_task_tree(&parent, &projects(), &HashSet::new());
        assert_eq!(
            lines,
            vec![
                "\u{25CB} [medium] Parent".to_string(),
                "  \u{25CF} [medium] Child".to_string(),
            ]
        );
    }

    #[test]
    fn json_uses_local_due_date() {
        let now = Utc::now();
        let mut task = Task::new("Pay rent", now);
        let due = Local.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap();
        task.due_date = Some(due.with_timezone(&Utc));

        let json = serde_json::to_value(task_to_json(&task, &HashSet::new())).unwrap();
        assert_eq!(json["due"], "2024-03-05");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["blocked"], false);
        assert!(json.get("subtasks").is_none());
    }
}
