//! Controller operations on [`App`]: everything a key or command can do to
//! the task list.
//!
//! Mutations never touch the store directly. They record an undo entry, queue
//! a [`Mutation`] in the outbox and let the reload bring `all_tasks` back in
//! sync. The one exception is priority, which is also written into
//! `all_tasks` at once so the row keeps its position until the cursor leaves.

use chrono::{DateTime, Utc};

use crate::io::config_io;
use crate::model::{
    INBOX_ID, PROJECT_COLORS, Priority, TAG_COLORS, Tag, Task, TaskStatus, ViewMode,
    palette_color, tag_id_for,
};

use super::app::{App, Mode, Selector, SelectorEntry, SelectorItem, SelectorKind};
use super::theme::{THEME_NAMES, Theme};
use super::undo::Operation;
use super::worker::{Mutation, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditKind {
    Update,
    Status,
}

fn count_label(n: usize) -> String {
    if n == 1 {
        "1 task".to_string()
    } else {
        format!("{} tasks", n)
    }
}

impl App {
    // -----------------------------------------------------------------------
    // Selection, expansion, view
    // -----------------------------------------------------------------------

    pub fn toggle_selection(&mut self) {
        let Some(id) = self.cursor_task().map(|t| t.id.clone()) else {
            return;
        };
        if !self.view.selected.remove(&id) {
            self.view.selected.insert(id);
        }
    }

    pub fn select_all_visible(&mut self) {
        let ids: Vec<String> = self
            .rows
            .iter()
            .filter_map(|r| r.task(&self.all_tasks))
            .map(|t| t.id.clone())
            .collect();
        self.view.selected.extend(ids);
        self.set_status(format!("Selected {}", count_label(self.view.selected.len())));
    }

    /// Esc in the list: drop the selection, else the filters, else expansion.
    pub fn clear_one_layer(&mut self) {
        if !self.view.selected.is_empty() {
            self.view.selected.clear();
            self.set_status("Selection cleared");
        } else if self.view.filters.is_active() {
            self.view.filters.clear();
            self.refresh_keeping_cursor();
            self.set_status("Filters cleared");
        } else if !self.view.expanded.is_empty() {
            self.view.expanded.clear();
            self.refresh_keeping_cursor();
        }
    }

    /// Refresh, then put the cursor back on the task it was on (or that
    /// task's parent when the task itself is no longer shown).
    pub fn refresh_keeping_cursor(&mut self) {
        let keep = self
            .cursor_task()
            .map(|t| (t.id.clone(), t.parent_id.clone()));
        self.refresh();
        if let Some((id, parent)) = keep
            && let Some(row) = self
                .row_of(&id)
                .or_else(|| parent.and_then(|p| self.row_of(&p)))
        {
            self.view.cursor = row;
            self.ensure_cursor_visible();
        }
    }

    /// Expand or collapse the parent of the cursor row.
    pub fn toggle_expand(&mut self) {
        let Some(row) = self.cursor_row() else {
            return;
        };
        let Some(parent) = self.all_tasks.get(row.index) else {
            return;
        };
        if parent.subtasks.is_empty() {
            self.set_status("No subtasks to expand");
            return;
        }
        let id = parent.id.clone();
        if !self.view.expanded.remove(&id) {
            self.view.expanded.insert(id);
        }
        self.refresh_keeping_cursor();
    }

    pub fn expand_all(&mut self) {
        let parents: Vec<String> = self
            .all_tasks
            .iter()
            .filter(|t| !t.subtasks.is_empty())
            .map(|t| t.id.clone())
            .collect();
        self.view.expanded.extend(parents);
        self.refresh_keeping_cursor();
    }

    pub fn collapse_all(&mut self) {
        self.view.expanded.clear();
        self.refresh_keeping_cursor();
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view.view_mode = mode;
        self.refresh_keeping_cursor();
        self.set_status(format!("View: {} (H to cycle)", mode.label()));
    }

    pub fn cycle_view_mode(&mut self) {
        self.set_view_mode(self.view.view_mode.cycle());
    }

    pub fn toggle_active_all(&mut self) {
        let next = if self.view.view_mode == ViewMode::Active {
            ViewMode::All
        } else {
            ViewMode::Active
        };
        self.set_view_mode(next);
    }

    pub fn toggle_wrap(&mut self) {
        self.view.wrap = !self.view.wrap;
        self.set_status(if self.view.wrap { "Wrap on" } else { "Wrap off" });
    }

    pub fn reload(&mut self) {
        self.request(Request::Reload);
        self.request(Request::LoadTimer);
        self.set_status("Reloaded");
    }

    // -----------------------------------------------------------------------
    // Create and rename
    // -----------------------------------------------------------------------

    pub fn begin_add(&mut self) {
        self.input.clear();
        self.mode = Mode::Add;
    }

    pub fn begin_add_subtask(&mut self) {
        let Some(task) = self.cursor_task() else {
            self.set_status("No task selected");
            return;
        };
        if task.is_subtask() {
            self.set_status("Subtasks cannot have subtasks");
            return;
        }
        let parent_id = task.id.clone();
        self.view.expanded.insert(parent_id.clone());
        self.refresh_keeping_cursor();
        self.input.clear();
        self.mode = Mode::AddSubtask { parent_id };
    }

    pub fn begin_edit(&mut self) {
        let Some(task) = self.cursor_task() else {
            self.set_status("No task selected");
            return;
        };
        let task_id = task.id.clone();
        let title = task.title.clone();
        self.input.set(&title);
        self.mode = Mode::Edit { task_id };
    }

    /// Create a top-level task in the filtered project (or the inbox) with
    /// the filtered tags. Returns the new id.
    pub fn create_task(&mut self, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let mut task = Task::new(title, Utc::now());
        task.project_id = Some(
            self.view
                .filters
                .project_id
                .clone()
                .unwrap_or_else(|| INBOX_ID.to_string()),
        );
        task.tags = self
            .view
            .filters
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();
        Some(self.insert_new(task))
    }

    pub fn create_subtask(&mut self, parent_id: &str, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let Some(parent) = self.find_task(parent_id) else {
            self.set_status("Parent task no longer exists");
            return None;
        };
        let mut task = Task::new(title, Utc::now());
        task.parent_id = Some(parent.id.clone());
        task.project_id = parent.project_id.clone();
        self.view.expanded.insert(parent_id.to_string());
        Some(self.insert_new(task))
    }

    fn insert_new(&mut self, task: Task) -> String {
        let id = task.id.clone();
        self.undo_stack.push(Operation::Create { task: task.clone() });
        self.focus_after_load = Some(id.clone());
        self.set_status(format!("Created: {}", task.title));
        self.mutate(Mutation::Insert(vec![task]));
        id
    }

    pub fn rename_task(&mut self, task_id: &str, title: &str) {
        let title = title.trim().to_string();
        if title.is_empty() {
            self.set_status("Title cannot be empty");
            return;
        }
        self.edit_tasks(&[task_id.to_string()], EditKind::Update, |t, _| {
            t.title = title.clone();
        });
    }

    // -----------------------------------------------------------------------
    // Bulk field edits
    // -----------------------------------------------------------------------

    /// Apply `f` to a copy of each task, record the changed ones for undo and
    /// queue the write. Returns how many tasks changed.
    fn edit_tasks(
        &mut self,
        ids: &[String],
        kind: EditKind,
        mut f: impl FnMut(&mut Task, DateTime<Utc>),
    ) -> usize {
        let now = Utc::now();
        let mut before = Vec::new();
        let mut after = Vec::new();
        for id in ids {
            let Some(task) = self.find_task(id) else {
                continue;
            };
            let old = task.without_relations();
            let mut new = old.clone();
            f(&mut new, now);
            if new == old {
                continue;
            }
            new.updated_at = now;
            before.push(old);
            after.push(new);
        }
        if after.is_empty() {
            return 0;
        }

        let changed = after.len();
        let op = match kind {
            EditKind::Update => Operation::Update {
                before,
                after: after.clone(),
            },
            EditKind::Status => Operation::ToggleStatus {
                before,
                after: after.clone(),
            },
        };
        self.undo_stack.push(op);
        self.mutate(Mutation::Update(after));
        changed
    }

    /// Resolve targets, reporting "No task selected" when there are none.
    fn require_targets(&mut self) -> Option<Vec<String>> {
        let ids = self.target_ids();
        if ids.is_empty() {
            self.set_status("No task selected");
            None
        } else {
            Some(ids)
        }
    }

    pub fn toggle_done(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        let changed = self.edit_tasks(&ids, EditKind::Status, |t, now| t.toggle_done(now));
        if changed > 1 {
            self.set_status(format!("Toggled {}", count_label(changed)));
        }
    }

    pub fn mark_done(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        let changed = self.edit_tasks(&ids, EditKind::Status, |t, now| {
            if !t.is_done() {
                t.set_status(TaskStatus::Done, now);
            }
        });
        self.set_status(format!("Completed {}", count_label(changed)));
    }

    pub fn archive(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        let changed = self.edit_tasks(&ids, EditKind::Status, |t, now| {
            t.set_status(TaskStatus::Archived, now);
        });
        self.view.selected.clear();
        self.set_status(format!("Archived {}", count_label(changed)));
    }

    pub fn set_due(&mut self, due: Option<DateTime<Utc>>) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        let changed = self.edit_tasks(&ids, EditKind::Update, |t, _| t.due_date = due);
        let what = match due {
            Some(d) => format!(
                "Due {}",
                d.with_timezone(&chrono::Local).format("%a %b %-d")
            ),
            None => "Due date cleared".to_string(),
        };
        self.set_status(format!("{} ({})", what, count_label(changed)));
    }

    /// `p`: each target moves one step along the priority cycle.
    pub fn cycle_priority(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        self.change_priority(&ids, Priority::cycle);
    }

    pub fn set_priority(&mut self, priority: Priority) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        self.change_priority(&ids, |_| priority);
    }

    /// Edit priority in place and defer the resort until the cursor moves
    /// off the row.
    fn change_priority(&mut self, ids: &[String], f: impl Fn(Priority) -> Priority) {
        let now = Utc::now();
        let mut before = Vec::new();
        let mut after = Vec::new();
        for id in ids {
            let Some(task) = self.find_task_mut(id) else {
                continue;
            };
            let old = task.without_relations();
            task.priority = f(task.priority);
            task.updated_at = now;
            after.push(task.without_relations());
            before.push(old);
        }
        let Some(shown) = after.first().map(|t| t.priority) else {
            return;
        };

        for task in &after {
            self.mutate_quietly(Mutation::SetPriority {
                ids: vec![task.id.clone()],
                priority: task.priority,
            });
        }
        self.undo_stack.push(Operation::Update { before, after });

        let cursor_id = self.cursor_task().map(|t| t.id.clone());
        self.view.resort_pending = cursor_id
            .filter(|id| ids.contains(id))
            .or_else(|| ids.first().cloned());
        self.set_status(format!("Priority: {} (move cursor to resort)", shown));
    }

    // -----------------------------------------------------------------------
    // Tags and projects
    // -----------------------------------------------------------------------

    /// `:tag name`: toggle a tag by name on the targets, creating it if new.
    pub fn toggle_tag_by_name(&mut self, name: &str) {
        let id = tag_id_for(name);
        if id.is_empty() {
            self.set_status("Usage: tag <name>");
            return;
        }
        let Some(ids) = self.require_targets() else {
            return;
        };
        let tag = self.tags.get(&id).cloned().unwrap_or_else(|| {
            Tag::new(name, palette_color(&TAG_COLORS, self.tags.len()), Utc::now())
        });
        self.toggle_tag_on(&ids, tag);
    }

    /// Remove the tag from every target if all have it, otherwise add it to
    /// those that don't.
    pub fn toggle_tag_on(&mut self, ids: &[String], tag: Tag) {
        let all_have = ids
            .iter()
            .filter_map(|id| self.find_task(id))
            .all(|t| t.has_tag(&tag.id));
        self.edit_tasks(ids, EditKind::Update, |t, _| {
            if all_have {
                t.tags.retain(|x| x.id != tag.id);
            } else if !t.has_tag(&tag.id) {
                t.tags.push(tag.clone());
            }
        });
        let verb = if all_have { "Removed" } else { "Tagged" };
        self.set_status(format!("{} {}", verb, tag.display_name()));
    }

    /// `:project name`: matched case-insensitively against names and ids.
    pub fn move_to_project_named(&mut self, name: &str) {
        let wanted = name.to_lowercase();
        let Some(project_id) = self
            .projects
            .values()
            .find(|p| p.name.to_lowercase() == wanted || p.id == wanted)
            .map(|p| p.id.clone())
        else {
            self.set_status(format!("Project not found: {}", name));
            return;
        };
        let Some(ids) = self.require_targets() else {
            return;
        };
        self.move_to_project(&ids, &project_id);
    }

    pub fn move_to_project(&mut self, ids: &[String], project_id: &str) {
        let changed = self.edit_tasks(ids, EditKind::Update, |t, _| {
            t.project_id = Some(project_id.to_string());
        });
        let name = self
            .projects
            .get(project_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| project_id.to_string());
        self.set_status(format!("Moved {} to {}", count_label(changed), name));
    }

    pub fn create_project(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.set_status("Usage: newproject <name>");
            return;
        }
        if let Some(existing) = self
            .projects
            .values()
            .find(|p| p.name.to_lowercase() == name.to_lowercase())
        {
            self.set_status(format!("Project already exists: {}", existing.name));
            return;
        }
        self.mutate(Mutation::CreateProject {
            name: name.to_string(),
        });
    }

    /// `:deleteproject name`: tasks in the project move to the inbox.
    pub fn delete_project(&mut self, name: &str) {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            self.set_status("Usage: deleteproject <name>");
            return;
        }
        let Some(project) = self
            .projects
            .values()
            .find(|p| p.name.to_lowercase() == wanted || p.id == wanted)
            .cloned()
        else {
            self.set_status(format!("Project not found: {}", name.trim()));
            return;
        };
        if project.id == INBOX_ID {
            self.set_status("The Inbox cannot be deleted");
            return;
        }
        if self.view.filters.project_id.as_deref() == Some(project.id.as_str()) {
            self.view.filters.project_id = None;
        }
        self.set_status(format!("Deleted project: {}", project.name));
        self.mutate(Mutation::DeleteProject { id: project.id });
    }

    pub fn create_tag(&mut self, name: &str) {
        let id = tag_id_for(name);
        if id.is_empty() {
            self.set_status("Usage: newtag <name>");
            return;
        }
        if let Some(existing) = self.tags.get(&id) {
            self.set_status(format!("Tag already exists: {}", existing.display_name()));
            return;
        }
        self.mutate(Mutation::CreateTag {
            name: name.to_string(),
        });
    }

    pub fn recolor_projects(&mut self) {
        if self.projects.is_empty() {
            self.set_status("No projects to recolor");
            return;
        }
        let colors = self
            .projects
            .keys()
            .enumerate()
            .map(|(i, id)| (id.clone(), palette_color(&PROJECT_COLORS, i).to_string()))
            .collect();
        self.mutate(Mutation::RecolorProjects(colors));
        self.set_status("Projects recolored");
    }

    pub fn recolor_tags(&mut self) {
        if self.tags.is_empty() {
            self.set_status("No tags to recolor");
            return;
        }
        let colors = self
            .tags
            .keys()
            .enumerate()
            .map(|(i, id)| (id.clone(), palette_color(&TAG_COLORS, i).to_string()))
            .collect();
        self.mutate(Mutation::RecolorTags(colors));
        self.set_status("Tags recolored");
    }

    pub fn list_projects(&mut self) {
        if self.projects.is_empty() {
            self.set_status("No projects. Create one with: newproject <name>");
            return;
        }
        let names: Vec<&str> = self.projects.values().map(|p| p.name.as_str()).collect();
        self.set_status(format!("Projects: {}", names.join(", ")));
    }

    pub fn list_tags(&mut self) {
        if self.tags.is_empty() {
            self.set_status("No tags. Create one with: newtag <name>");
            return;
        }
        let names: Vec<String> = self.tags.values().map(|t| t.display_name()).collect();
        self.set_status(format!("Tags: {}", names.join(", ")));
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    pub fn request_delete(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        self.mode = Mode::ConfirmDelete { ids };
    }

    /// Delete `ids`, snapshotting each task with its subtasks for undo.
    /// Subtasks whose parent is also being deleted go with the parent.
    pub fn delete_tasks(&mut self, ids: &[String]) {
        let mut snapshots: Vec<Task> = Vec::new();
        for id in ids {
            let Some(task) = self.find_task(id) else {
                continue;
            };
            if task.parent_id.as_ref().is_some_and(|p| ids.contains(p)) {
                continue;
            }
            snapshots.push(task.clone());
        }
        if snapshots.is_empty() {
            return;
        }

        let doomed: Vec<String> = snapshots.iter().map(|t| t.id.clone()).collect();
        for id in &doomed {
            self.view.selected.remove(id);
        }
        self.set_status(format!("Deleted {}", count_label(doomed.len())));
        self.undo_stack.push(Operation::Delete {
            tasks: snapshots,
            links: Vec::new(),
            entries: Vec::new(),
        });
        self.mutate(Mutation::Delete(doomed));
    }

    // -----------------------------------------------------------------------
    // Selectors
    // -----------------------------------------------------------------------

    fn project_items(&self) -> Vec<SelectorItem> {
        self.projects
            .values()
            .map(|p| SelectorItem {
                id: p.id.clone(),
                label: p.name.clone(),
                color: Some(p.color.clone()),
            })
            .collect()
    }

    fn tag_items(&self) -> Vec<SelectorItem> {
        self.tags
            .values()
            .map(|t| SelectorItem {
                id: t.id.clone(),
                label: t.display_name(),
                color: Some(t.color.clone()),
            })
            .collect()
    }

    fn open_selector(&mut self, selector: Selector) {
        self.mode = Mode::Normal(Some(selector));
    }

    pub fn open_project_selector(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        let items = self.project_items();
        self.open_selector(Selector::new(SelectorKind::Project, ids, items, None));
    }

    pub fn open_tag_selector(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        let items = self.tag_items();
        if items.is_empty() {
            self.set_status("No tags. Create one with: newtag <name>");
            return;
        }
        self.open_selector(Selector::new(SelectorKind::Tag, ids, items, None));
    }

    pub fn open_dependency_selector(&mut self) {
        let Some(task) = self.cursor_task() else {
            self.set_status("No task selected");
            return;
        };
        if task.is_subtask() {
            self.set_status("Dependencies are only supported on top-level tasks");
            return;
        }
        let task_id = task.id.clone();
        let items: Vec<SelectorItem> = self
            .all_tasks
            .iter()
            .filter(|t| t.id != task_id)
            .map(|t| SelectorItem {
                id: t.id.clone(),
                label: t.title.clone(),
                color: None,
            })
            .collect();
        if items.is_empty() {
            self.set_status("No other tasks to depend on");
            return;
        }
        self.open_selector(Selector::new(
            SelectorKind::Dependency,
            vec![task_id],
            items,
            None,
        ));
    }

    pub fn open_parent_selector(&mut self) {
        let Some(task) = self.cursor_task() else {
            self.set_status("No task selected");
            return;
        };
        if !task.subtasks.is_empty() {
            self.set_status("Cannot make a task with subtasks into a subtask");
            return;
        }
        let task_id = task.id.clone();
        let sentinel = task
            .parent_id
            .is_some()
            .then_some("Remove parent (make top-level)");
        let current_parent = task.parent_id.clone();
        let items: Vec<SelectorItem> = self
            .all_tasks
            .iter()
            .filter(|t| t.id != task_id && Some(&t.id) != current_parent.as_ref())
            .map(|t| SelectorItem {
                id: t.id.clone(),
                label: t.title.clone(),
                color: None,
            })
            .collect();
        if items.is_empty() && sentinel.is_none() {
            self.set_status("No valid parent tasks available");
            return;
        }
        self.open_selector(Selector::new(
            SelectorKind::Parent,
            vec![task_id],
            items,
            sentinel,
        ));
    }

    pub fn open_project_filter(&mut self) {
        let items = self.project_items();
        self.open_selector(Selector::new(
            SelectorKind::ProjectFilter,
            Vec::new(),
            items,
            Some("All Projects"),
        ));
    }

    pub fn open_tag_filter(&mut self) {
        let items = self.tag_items();
        self.open_selector(Selector::new(
            SelectorKind::TagFilter,
            Vec::new(),
            items,
            Some("Clear tag filters"),
        ));
    }

    /// Whether `item` shows as checked in `selector`.
    pub fn selector_checked(&self, selector: &Selector, item: &SelectorItem) -> bool {
        match selector.kind {
            SelectorKind::Tag => {
                !selector.targets.is_empty()
                    && selector
                        .targets
                        .iter()
                        .filter_map(|id| self.find_task(id))
                        .all(|t| t.has_tag(&item.id))
            }
            SelectorKind::Dependency => selector
                .targets
                .first()
                .and_then(|id| self.find_task(id))
                .is_some_and(|t| t.dependencies.iter().any(|d| d.id == item.id)),
            SelectorKind::TagFilter => self.view.filters.tag_ids.contains(&item.id),
            SelectorKind::ProjectFilter => {
                self.view.filters.project_id.as_deref() == Some(item.id.as_str())
            }
            SelectorKind::Project => selector
                .targets
                .iter()
                .filter_map(|id| self.find_task(id))
                .all(|t| t.project_id.as_deref() == Some(item.id.as_str())),
            SelectorKind::Parent => selector
                .targets
                .first()
                .and_then(|id| self.find_task(id))
                .is_some_and(|t| t.parent_id.as_deref() == Some(item.id.as_str())),
        }
    }

    /// Enter in a selector. The caller has already taken the selector out of
    /// `mode`; it is put back if the selector stays open.
    pub fn apply_selector(&mut self, selector: Selector) {
        enum Choice {
            Sentinel,
            Item(String),
        }
        let choice = match selector.current() {
            Some(SelectorEntry::Sentinel(_)) => Some(Choice::Sentinel),
            Some(SelectorEntry::Item(item)) => Some(Choice::Item(item.id.clone())),
            None => None,
        };
        let Some(choice) = choice else {
            // Nothing matches the query; stay open
            self.mode = Mode::Normal(Some(selector));
            return;
        };

        match (selector.kind, choice) {
            (SelectorKind::Project, Choice::Item(pid)) => {
                self.move_to_project(&selector.targets, &pid);
            }
            (SelectorKind::Tag, Choice::Item(tid)) => {
                if let Some(tag) = self.tags.get(&tid).cloned() {
                    self.toggle_tag_on(&selector.targets, tag);
                    // Reflect the toggle in the open selector before the reload lands
                    self.apply_tags_locally(&selector.targets, &tid);
                }
            }
            (SelectorKind::Dependency, Choice::Item(dep)) => {
                if let Some(task_id) = selector.targets.first() {
                    self.toggle_dependency(task_id, &dep);
                }
            }
            (SelectorKind::ProjectFilter, Choice::Sentinel) => {
                self.view.filters.project_id = None;
                self.refresh_keeping_cursor();
                self.set_status("Showing all projects");
            }
            (SelectorKind::ProjectFilter, Choice::Item(pid)) => {
                let name = self
                    .projects
                    .get(&pid)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                self.view.filters.project_id = Some(pid);
                self.refresh_keeping_cursor();
                self.set_status(format!("Project filter: {}", name));
            }
            (SelectorKind::TagFilter, Choice::Sentinel) => {
                self.view.filters.tag_ids.clear();
                self.refresh_keeping_cursor();
                self.set_status("Tag filters cleared");
            }
            (SelectorKind::TagFilter, Choice::Item(tid)) => {
                self.view.filters.toggle_tag(&tid);
                self.refresh_keeping_cursor();
            }
            (SelectorKind::Parent, Choice::Sentinel) => {
                if let Some(task_id) = selector.targets.first() {
                    self.set_parent(task_id, None);
                }
            }
            (SelectorKind::Parent, Choice::Item(pid)) => {
                if let Some(task_id) = selector.targets.first() {
                    self.set_parent(task_id, Some(pid));
                }
            }
            // Sentinels only exist on the filter and parent selectors
            (_, Choice::Sentinel) => {}
        }

        if selector.stays_open() {
            self.mode = Mode::Normal(Some(selector));
        }
    }

    fn apply_tags_locally(&mut self, ids: &[String], tag_id: &str) {
        let Some(tag) = self.tags.get(tag_id).cloned() else {
            return;
        };
        let all_have = ids
            .iter()
            .filter_map(|id| self.find_task(id))
            .all(|t| t.has_tag(tag_id));
        for id in ids {
            if let Some(task) = self.find_task_mut(id) {
                if all_have {
                    task.tags.retain(|t| t.id != tag.id);
                } else if !task.has_tag(&tag.id) {
                    task.tags.push(tag.clone());
                }
            }
        }
    }

    pub fn toggle_dependency(&mut self, task_id: &str, depends_on_id: &str) {
        let Some(dep) = self.find_task(depends_on_id).map(Task::without_relations) else {
            return;
        };
        let Some(task) = self.find_task_mut(task_id) else {
            return;
        };
        let add = !task.dependencies.iter().any(|d| d.id == depends_on_id);
        if add {
            task.dependencies.push(dep.clone());
        } else {
            task.dependencies.retain(|d| d.id != depends_on_id);
        }
        self.mutate(Mutation::ToggleDependency {
            task_id: task_id.to_string(),
            depends_on_id: depends_on_id.to_string(),
            add,
        });
        let verb = if add { "Now depends on" } else { "No longer depends on" };
        self.set_status(format!("{}: {}", verb, dep.title));
    }

    pub fn set_parent(&mut self, task_id: &str, parent_id: Option<String>) {
        let Some(task) = self.find_task(task_id) else {
            return;
        };
        if task.parent_id == parent_id {
            return;
        }
        if !task.subtasks.is_empty() {
            self.set_status("Cannot make a task with subtasks into a subtask");
            return;
        }
        if let Some(pid) = &parent_id
            && self.find_task(pid).is_none_or(|p| p.is_subtask())
        {
            self.set_status("Parent must be a top-level task");
            return;
        }

        let before = task.without_relations();
        let mut after = before.clone();
        after.parent_id = parent_id.clone();
        after.updated_at = Utc::now();

        self.undo_stack.push(Operation::SetParent {
            before,
            after: after.clone(),
        });
        self.mutate(Mutation::Update(vec![after]));
        self.focus_after_load = Some(task_id.to_string());
        match parent_id {
            Some(pid) => {
                let title = self.find_task(&pid).map(|p| p.title.clone()).unwrap_or_default();
                self.view.expanded.insert(pid);
                self.set_status(format!("Parent set: {}", title));
            }
            None => self.set_status("Moved to top level"),
        }
    }

    // -----------------------------------------------------------------------
    // Filters, sort, theme, time
    // -----------------------------------------------------------------------

    pub fn set_text_filter(&mut self, text: &str) {
        self.view.filters.text = text.to_string();
        self.refresh_keeping_cursor();
        if text.is_empty() {
            self.set_status("Filter cleared");
        } else {
            self.set_status(format!("Filter: {}", text));
        }
    }

    pub fn clear_filters(&mut self) {
        self.view.filters.clear();
        self.refresh_keeping_cursor();
        self.set_status("Filters cleared");
    }

    pub fn set_sort(&mut self, arg: &str) {
        match crate::model::SortKey::parse(arg) {
            Some(key) => {
                self.view.sort = key;
                self.refresh_keeping_cursor();
                self.set_status(format!("Sorted by {}", key.label()));
            }
            None => self.set_status(format!("Unknown sort field: {}", arg)),
        }
    }

    /// Switch theme and persist it to the config file.
    pub fn set_theme(&mut self, name: &str) {
        if name.is_empty() {
            self.set_status(format!("Usage: theme <{}>", THEME_NAMES.join("|")));
            return;
        }
        if Theme::by_name(name).is_none() {
            self.set_status(format!("Unknown theme: {}", name));
            return;
        }
        self.config.theme = name.to_lowercase();
        self.theme = Theme::from_config(&self.config);
        if let Some(path) = &self.config_path
            && let Err(e) = config_io::save_theme(path, &self.config.theme)
        {
            tracing::warn!(error = %e, "could not save theme");
            self.set_status(format!("Error: {}", e));
            return;
        }
        self.set_status(format!("Theme set to: {}", self.theme.name));
    }

    pub fn start_timer(&mut self) {
        let Some(ids) = self.require_targets() else {
            return;
        };
        self.mutate_quietly(Mutation::StartTimer {
            task_id: ids[0].clone(),
        });
    }

    pub fn stop_timer(&mut self) {
        if self.active_timer.is_none() {
            self.set_status("No active timer");
            return;
        }
        self.mutate_quietly(Mutation::StopTimer);
    }

    pub fn add_time(&mut self, arg: &str) {
        if arg.is_empty() {
            self.set_status("Usage: addtime <duration> (e.g. 30m, 1h, 1h30m)");
            return;
        }
        let Some(minutes) = crate::ops::dates::parse_duration_minutes(arg) else {
            self.set_status(format!(
                "Invalid duration: {} (use e.g. 30m, 1h, 1h30m)",
                arg
            ));
            return;
        };
        let Some(ids) = self.require_targets() else {
            return;
        };
        self.mutate_quietly(Mutation::AddTime {
            task_id: ids[0].clone(),
            minutes,
        });
    }

    // -----------------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------------

    pub fn undo(&mut self) {
        let Some(op) = self.undo_stack.undo() else {
            self.set_status("Nothing to undo");
            return;
        };
        let mutation = match &op {
            Operation::Create { task } => Mutation::Delete(vec![task.id.clone()]),
            Operation::Delete {
                tasks,
                links,
                entries,
            } => Mutation::Restore {
                tasks: tasks.clone(),
                links: links.clone(),
                entries: entries.clone(),
            },
            Operation::Update { before, .. } | Operation::ToggleStatus { before, .. } => {
                Mutation::Update(before.clone())
            }
            Operation::SetParent { before, .. } => Mutation::Update(vec![before.clone()]),
        };
        self.view.resort_pending = None;
        self.mutate(mutation);
        if let Operation::Delete { entries, .. } = &op
            && entries.iter().any(|e| e.is_running())
        {
            self.request(Request::LoadTimer);
        }
        self.set_status(format!("Undid {}", op.label()));
    }

    pub fn redo(&mut self) {
        let Some(op) = self.undo_stack.redo() else {
            self.set_status("Nothing to redo");
            return;
        };
        let mutation = match &op {
            Operation::Create { task } => Mutation::Insert(vec![task.clone()]),
            Operation::Delete { tasks, .. } => {
                Mutation::Delete(tasks.iter().map(|t| t.id.clone()).collect())
            }
            Operation::Update { after, .. } | Operation::ToggleStatus { after, .. } => {
                Mutation::Update(after.clone())
            }
            Operation::SetParent { after, .. } => Mutation::Update(vec![after.clone()]),
        };
        self.view.resort_pending = None;
        self.mutate(mutation);
        self.set_status(format!("Redid {}", op.label()));
    }
}
