use chrono::{DateTime, Local, Utc};

use super::dates::parse_natural_date;
use crate::model::{INBOX_ID, Priority, Task, tag_id_for};
use crate::store::{Store, StoreError};

/// A parsed quick-add sentence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickAdd {
    pub title: String,
    /// Project name from `#name`
    pub project: Option<String>,
    /// Tag names from `@name`, marker included
    pub tags: Vec<String>,
    pub priority: Option<Priority>,
    pub due: Option<DateTime<Utc>>,
}

/// Split a quick-add sentence into title and markers.
///
/// `#project`, `@tag`, `!priority` and `due:<date>` are consumed; any word that
/// doesn't parse as one of them stays in the title.
pub fn parse_quick_add(input: &str, now: DateTime<Local>) -> QuickAdd {
    let mut out = QuickAdd::default();
    let mut title_words = Vec::new();

    for word in input.split_whitespace() {
        if let Some(name) = word.strip_prefix('#')
            && !name.is_empty()
        {
            out.project = Some(name.to_string());
        } else if word.starts_with('@') && !tag_id_for(word).is_empty() {
            out.tags.push(word.to_string());
        } else if let Some(p) = word.strip_prefix('!').and_then(Priority::from_keyword) {
            out.priority = Some(p);
        } else if let Some(due) = word
            .strip_prefix("due:")
            .and_then(|d| parse_natural_date(d, now))
        {
            out.due = Some(due);
        } else {
            title_words.push(word);
        }
    }

    out.title = title_words.join(" ");
    out
}

/// Create the task described by `qa`, creating its project and tags if they
/// don't exist yet. Tasks without a project go to the inbox.
pub fn create_task(store: &Store, qa: &QuickAdd, now: DateTime<Utc>) -> Result<Task, StoreError> {
    if qa.title.is_empty() {
        return Err(StoreError::Invalid("task title cannot be empty".into()));
    }

    let mut task = Task::new(qa.title.clone(), now);
    task.project_id = Some(match &qa.project {
        Some(name) => store.ensure_project(name)?.id,
        None => INBOX_ID.to_string(),
    });
    for name in &qa.tags {
        let tag = store.ensure_tag(name)?;
        if !task.has_tag(&tag.id) {
            task.tags.push(tag);
        }
    }
    if let Some(p) = qa.priority {
        task.priority = p;
    }
    task.due_date = qa.due;

    store.insert_task(&task)?;
    Ok(task)
}
