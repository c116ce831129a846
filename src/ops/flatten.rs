use std::collections::HashSet;

use crate::model::Task;

/// One row of the rendered list: a top-level task, or one of its subtasks
/// when the parent is expanded. Indices point into the loaded task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRow {
    pub index: usize,
    pub sub: Option<usize>,
}

impl FlatRow {
    pub fn depth(&self) -> usize {
        if self.sub.is_some() { 1 } else { 0 }
    }

    pub fn is_subtask(&self) -> bool {
        self.sub.is_some()
    }

    /// Resolve against the task list this row was built from.
    pub fn task<'a>(&self, tasks: &'a [Task]) -> Option<&'a Task> {
        let top = tasks.get(self.index)?;
        match self.sub {
            Some(i) => top.subtasks.get(i),
            None => Some(top),
        }
    }
}

/// Emit each visible top-level task, followed by its subtasks when its id is
/// in `expanded` and it has any. Subtasks keep their loaded order.
pub fn flatten(tasks: &[Task], visible: &[usize], expanded: &HashSet<String>) -> Vec<FlatRow> {
    let mut rows = Vec::with_capacity(visible.len());
    for &index in visible {
        let Some(task) = tasks.get(index) else {
            continue;
        };
        rows.push(FlatRow { index, sub: None });
        if expanded.contains(&task.id) && !task.subtasks.is_empty() {
            rows.extend((0..task.subtasks.len()).map(|i| FlatRow {
                index,
                sub: Some(i),
            }));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn parent_with(title: &str, subs: &[&str]) -> Task {
        let mut parent = Task::new(title, Utc::now());
        parent.subtasks = subs
            .iter()
            .map(|s| {
                let mut t = Task::new(*s, Utc::now());
                t.parent_id = Some(parent.id.clone());
                t
            })
            .collect();
        parent
    }

    fn titles(tasks: &[Task], rows: &[FlatRow]) -> Vec<String> {
        rows.iter()
            .map(|r| r.task(tasks).unwrap().title.clone())
            .collect()
    }

    #[test]
    fn subtasks_follow_expanded_parent_only() {
        let tasks = vec![
            parent_with("P", &["p1", "p2"]),
            parent_with("Q", &["q1"]),
            parent_with("R", &[]),
        ];
        let mut expanded = HashSet::new();
        expanded.insert(tasks[0].id.clone());
        expanded.insert(tasks[2].id.clone());

        let rows = flatten(&tasks, &[0, 1, 2], &expanded);
        assert_eq!(titles(&tasks, &rows), vec!["P", "p1", "p2", "Q", "R"]);
        assert_eq!(rows[1].depth(), 1);
        assert_eq!(rows[3].depth(), 0);
    }

    #[test]
    fn collapsing_keeps_sibling_order_and_source_list() {
        let tasks = vec![parent_with("P", &["p1", "p2"]), parent_with("Q", &[])];
        let mut expanded = HashSet::new();
        expanded.insert(tasks[0].id.clone());
        let open = flatten(&tasks, &[0, 1], &expanded);
        assert_eq!(open.len(), 4);

        expanded.clear();
        let closed = flatten(&tasks, &[0, 1], &expanded);
        assert_eq!(titles(&tasks, &closed), vec!["P", "Q"]);
        assert_eq!(tasks[0].subtasks.len(), 2);
    }

    #[test]
    fn follows_visible_order() {
        let tasks = vec![parent_with("A", &[]), parent_with("B", &[])];
        let rows = flatten(&tasks, &[1, 0], &HashSet::new());
        assert_eq!(titles(&tasks, &rows), vec!["B", "A"]);
    }
}
