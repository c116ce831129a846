use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use crate::model::{Project, SortKey, Tag, Task, TaskStatus, ViewMode};

/// Done tasks stay visible in [`ViewMode::Recent`] for this many days.
pub const RECENT_DAYS: i64 = 7;

/// Structured filters, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub project_id: Option<String>,
    /// Every listed tag must be present on the task
    pub tag_ids: Vec<String>,
    /// Case-insensitive substring
    pub text: String,
}

impl Filters {
    pub fn is_active(&self) -> bool {
        self.project_id.is_some() || !self.tag_ids.is_empty() || !self.text.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Filters::default();
    }

    /// Add the tag if absent, remove it if present. Returns true if now present.
    pub fn toggle_tag(&mut self, tag_id: &str) -> bool {
        if let Some(pos) = self.tag_ids.iter().position(|t| t == tag_id) {
            self.tag_ids.remove(pos);
            false
        } else {
            self.tag_ids.push(tag_id.to_string());
            true
        }
    }
}

/// Indices into `tasks` of the top-level tasks that pass the view mode and
/// every active filter, in their original order.
///
/// `now` is sampled once by the caller so one pass sees a single instant.
pub fn filter_tasks(
    tasks: &[Task],
    mode: ViewMode,
    filters: &Filters,
    projects: &IndexMap<String, Project>,
    now: DateTime<Utc>,
) -> Vec<usize> {
    let needle = filters.text.to_lowercase();
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| passes_view_mode(task, mode, now))
        .filter(|(_, task)| {
            filters
                .project_id
                .as_ref()
                .is_none_or(|pid| task.project_id.as_ref() == Some(pid))
        })
        .filter(|(_, task)| filters.tag_ids.iter().all(|tag| task.has_tag(tag)))
        .filter(|(_, task)| needle.is_empty() || matches_text(task, &needle, projects))
        .map(|(i, _)| i)
        .collect()
}

fn passes_view_mode(task: &Task, mode: ViewMode, now: DateTime<Utc>) -> bool {
    match mode {
        ViewMode::All => true,
        ViewMode::Active => task.status != TaskStatus::Done,
        ViewMode::Recent => {
            if task.status != TaskStatus::Done {
                return true;
            }
            // Done without a completion time can't be placed; treat as recent
            task.completed_at
                .is_none_or(|at| now - at <= Duration::days(RECENT_DAYS))
        }
    }
}

/// `needle` must already be lowercase.
fn matches_text(task: &Task, needle: &str, projects: &IndexMap<String, Project>) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);

    if hit(&task.title) || hit(&task.description) {
        return true;
    }
    if let Some(project) = task.project_id.as_ref().and_then(|id| projects.get(id))
        && hit(&project.name)
    {
        return true;
    }
    if task
        .tags
        .iter()
        .any(|tag| hit(&tag.display_name()) || hit(tag.bare_name()))
    {
        return true;
    }
    if hit(task.status.as_str()) || hit(task.priority.as_str()) {
        return true;
    }
    task.subtasks
        .iter()
        .any(|sub| matches_text(sub, needle, projects))
}

/// Reorder visible indices for a non-default sort key. The default key keeps
/// store order.
pub fn sort_visible(tasks: &[Task], visible: &mut [usize], key: SortKey) {
    let cmp = |a: &Task, b: &Task| -> Ordering {
        match key {
            SortKey::Priority => Ordering::Equal,
            SortKey::Due => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Created => b.created_at.cmp(&a.created_at),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        }
    };
    // Stable: ties keep store order
    visible.sort_by(|&a, &b| {
        tasks[a]
            .is_done()
            .cmp(&tasks[b].is_done())
            .then_with(|| cmp(&tasks[a], &tasks[b]))
    });
}

/// `Filters: Project: Work | Tags: @a, @b | Text: fix`, or `None` when no
/// filter is active.
pub fn format_active_filters(
    filters: &Filters,
    projects: &IndexMap<String, Project>,
    tags: &IndexMap<String, Tag>,
) -> Option<String> {
    if !filters.is_active() {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(pid) = &filters.project_id {
        let name = projects.get(pid).map(|p| p.name.as_str()).unwrap_or(pid);
        parts.push(format!("Project: {}", name));
    }
    if !filters.tag_ids.is_empty() {
        let names: Vec<String> = filters
            .tag_ids
            .iter()
            .map(|id| {
                tags.get(id)
                    .map(|t| t.display_name())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();
        parts.push(format!("Tags: {}", names.join(", ")));
    }
    if !filters.text.is_empty() {
        parts.push(format!("Text: {}", filters.text));
    }
    Some(format!("Filters: {}", parts.join(" | ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Tag};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn tag(name: &str) -> Tag {
        Tag::new(name, "#FFFFFF", now())
    }

    fn task(title: &str) -> Task {
        Task::new(title, now())
    }

    fn done(title: &str, days_ago: i64) -> Task {
        let mut t = task(title);
        t.set_status(TaskStatus::Done, now() - Duration::days(days_ago));
        t
    }

    fn projects() -> IndexMap<String, Project> {
        let mut map = IndexMap::new();
        for (id, name) in [("work", "Work"), ("home", "Home")] {
            let mut p = Project::new(name, "#FFFFFF", now());
            p.id = id.into();
            map.insert(id.to_string(), p);
        }
        map
    }

    fn titles(tasks: &[Task], idx: &[usize]) -> Vec<String> {
        idx.iter().map(|&i| tasks[i].title.clone()).collect()
    }

    fn run(tasks: &[Task], mode: ViewMode, filters: &Filters) -> Vec<String> {
        titles(tasks, &filter_tasks(tasks, mode, filters, &projects(), now()))
    }

    #[test]
    fn view_modes() {
        let tasks = vec![task("open"), done("fresh", 2), done("stale", 10)];
        let f = Filters::default();
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["open", "fresh", "stale"]);
        assert_eq!(run(&tasks, ViewMode::Active, &f), vec!["open"]);
        assert_eq!(run(&tasks, ViewMode::Recent, &f), vec!["open", "fresh"]);
    }

    #[test]
    fn recent_boundary_is_seven_days() {
        let tasks = vec![done("edge", 7), done("past", 8)];
        assert_eq!(
            run(&tasks, ViewMode::Recent, &Filters::default()),
            vec!["edge"]
        );
    }

    #[test]
    fn project_filter_exact_match() {
        let mut a = task("a");
        a.project_id = Some("work".into());
        let mut b = task("b");
        b.project_id = Some("home".into());
        let c = task("c");
        let tasks = vec![a, b, c];
        let f = Filters {
            project_id: Some("work".into()),
            ..Default::default()
        };
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["a"]);
    }

    #[test]
    fn tag_filter_requires_every_tag() {
        let mut a = task("both");
        a.tags = vec![tag("x"), tag("y")];
        let mut b = task("only-x");
        b.tags = vec![tag("x")];
        let tasks = vec![a, b];

        let mut f = Filters::default();
        f.toggle_tag("x");
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["both", "only-x"]);
        f.toggle_tag("y");
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["both"]);
        assert!(!f.toggle_tag("y"));
        assert_eq!(f.tag_ids, vec!["x"]);
    }

    #[test]
    fn text_filter_fields() {
        let mut by_desc = task("alpha");
        by_desc.description = "Needs the WIDGET".into();
        let mut by_project = task("beta");
        by_project.project_id = Some("work".into());
        let mut by_tag = task("gamma");
        by_tag.tags = vec![tag("errand")];
        let mut by_priority = task("delta");
        by_priority.priority = Priority::Urgent;
        let tasks = vec![by_desc, by_project, by_tag, by_priority, task("epsilon")];

        let text = |s: &str| Filters {
            text: s.into(),
            ..Default::default()
        };
        assert_eq!(run(&tasks, ViewMode::All, &text("widget")), vec!["alpha"]);
        assert_eq!(run(&tasks, ViewMode::All, &text("WORK")), vec!["beta"]);
        assert_eq!(run(&tasks, ViewMode::All, &text("@err")), vec!["gamma"]);
        assert_eq!(run(&tasks, ViewMode::All, &text("errand")), vec!["gamma"]);
        assert_eq!(run(&tasks, ViewMode::All, &text("urgent")), vec!["delta"]);
        // Every task is pending
        assert_eq!(run(&tasks, ViewMode::All, &text("pending")).len(), 5);
    }

    #[test]
    fn text_filter_keeps_parent_of_matching_subtask() {
        let mut parent = task("groceries");
        let mut sub = task("buy lemons");
        sub.parent_id = Some(parent.id.clone());
        parent.subtasks = vec![sub];
        let tasks = vec![parent, task("laundry")];
        let f = Filters {
            text: "lemon".into(),
            ..Default::default()
        };
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["groceries"]);
    }

    #[test]
    fn pairwise_combinations_are_anded() {
        let mut a = task("report");
        a.project_id = Some("work".into());
        a.tags = vec![tag("q3")];
        let mut b = task("report draft");
        b.project_id = Some("home".into());
        b.tags = vec![tag("q3")];
        let mut c = done("report final", 1);
        c.project_id = Some("work".into());
        let tasks = vec![a, b, c];

        let f = Filters {
            project_id: Some("work".into()),
            text: "report".into(),
            ..Default::default()
        };
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["report", "report final"]);
        assert_eq!(run(&tasks, ViewMode::Active, &f), vec!["report"]);

        let f = Filters {
            project_id: Some("work".into()),
            tag_ids: vec!["q3".into()],
            ..Default::default()
        };
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["report"]);

        let f = Filters {
            tag_ids: vec!["q3".into()],
            text: "draft".into(),
            ..Default::default()
        };
        assert_eq!(run(&tasks, ViewMode::All, &f), vec!["report draft"]);
    }

    #[test]
    fn sort_by_title_keeps_done_last() {
        let tasks = vec![task("b"), done("a", 1), task("c"), task("A2")];
        let mut idx: Vec<usize> = (0..tasks.len()).collect();
        sort_visible(&tasks, &mut idx, SortKey::Title);
        assert_eq!(titles(&tasks, &idx), vec!["A2", "b", "c", "a"]);
    }

    #[test]
    fn filter_summary() {
        let mut tags = IndexMap::new();
        tags.insert("x".to_string(), tag("x"));
        let f = Filters {
            project_id: Some("work".into()),
            tag_ids: vec!["x".into(), "ghost".into()],
            text: "fix".into(),
        };
        insta::assert_snapshot!(
            format_active_filters(&f, &projects(), &tags).unwrap(),
            @"Filters: Project: Work | Tags: @x, ghost | Text: fix"
        );
        assert_eq!(
            format_active_filters(&Filters::default(), &projects(), &tags),
            None
        );
    }
}
