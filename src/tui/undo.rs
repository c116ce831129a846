use crate::model::{Task, TimeEntry};

const UNDO_STACK_LIMIT: usize = 50;

/// A recorded mutation, stored as task snapshots rather than as a command to
/// replay backwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A task was created. Undo deletes it, redo re-inserts it.
    Create { task: Task },
    /// Tasks were deleted. Snapshots include subtasks and tags. `links` holds
    /// every `(task, depends_on)` pair touching the deleted tasks, inbound ones
    /// included, and `entries` their time log. Both are filled in once the
    /// store reports what the delete removed.
    Delete {
        tasks: Vec<Task>,
        links: Vec<(String, String)>,
        entries: Vec<TimeEntry>,
    },
    /// Field edits (title, priority, project, tags, due date, archive)
    Update { before: Vec<Task>, after: Vec<Task> },
    /// Done/not-done toggles
    ToggleStatus { before: Vec<Task>, after: Vec<Task> },
    /// Reparenting a task
    SetParent { before: Task, after: Task },
}

impl Operation {
    /// Short description for the status line
    pub fn label(&self) -> String {
        match self {
            Operation::Create { task } => format!("create \"{}\"", task.title),
            Operation::Delete { tasks, .. } => plural("delete", tasks.len()),
            Operation::Update { after, .. } => plural("edit", after.len()),
            Operation::ToggleStatus { after, .. } => plural("status change", after.len()),
            Operation::SetParent { after, .. } => format!("reparent \"{}\"", after.title),
        }
    }
}

fn plural(what: &str, n: usize) -> String {
    if n == 1 {
        what.to_string()
    } else {
        format!("{} ({} tasks)", what, n)
    }
}

/// Bounded undo/redo history
#[derive(Debug, Default)]
pub struct UndoStack {
    undo: Vec<Operation>,
    redo: Vec<Operation>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new operation. Clears the redo stack and evicts the oldest
    /// entries past the limit.
    pub fn push(&mut self, op: Operation) {
        self.undo.push(op);
        self.redo.clear();
        if self.undo.len() > UNDO_STACK_LIMIT {
            let excess = self.undo.len() - UNDO_STACK_LIMIT;
            self.undo.drain(..excess);
        }
    }

    /// Pop the latest operation for undoing; it moves to the redo stack.
    pub fn undo(&mut self) -> Option<Operation> {
        let op = self.undo.pop()?;
        self.redo.push(op.clone());
        Some(op)
    }

    /// Pop the latest undone operation for redoing; it moves back to the undo stack.
    pub fn redo(&mut self) -> Option<Operation> {
        let op = self.redo.pop()?;
        self.undo.push(op.clone());
        Some(op)
    }

    /// Attach the links and time entries a delete removed to its history
    /// entry. Only applies while that delete is the latest undoable operation.
    pub fn record_deleted_relations(
        &mut self,
        ids: &[String],
        removed_links: Vec<(String, String)>,
        removed_entries: Vec<TimeEntry>,
    ) {
        if let Some(Operation::Delete {
            tasks,
            links,
            entries,
        }) = self.undo.last_mut()
            && tasks.iter().map(|t| &t.id).eq(ids.iter())
        {
            *links = removed_links;
            *entries = removed_entries;
        }
    }

    pub fn peek_last_undo(&self) -> Option<&Operation> {
        self.undo.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn create(title: &str) -> Operation {
        Operation::Create {
            task: Task::new(title, Utc::now()),
        }
    }

    // -----------------------------------------------------------------------
    // Stack behavior
    // -----------------------------------------------------------------------

    #[test]
    fn undo_then_redo_moves_between_stacks() {
        let mut stack = UndoStack::new();
        stack.push(create("a"));
        assert!(stack.redo.is_empty());

        let op = stack.undo().unwrap();
        assert!(stack.undo.is_empty());
        assert_eq!(stack.redo.len(), 1);

        let again = stack.redo().unwrap();
        assert_eq!(op, again);
        assert_eq!(stack.undo.len(), 1);
        assert!(stack.redo().is_none());
    }

    #[test]
    fn push_clears_redo() {
        let mut stack = UndoStack::new();
        stack.push(create("a"));
        stack.undo();
        assert_eq!(stack.redo.len(), 1);
        stack.push(create("b"));
        assert!(stack.redo().is_none());
    }

    #[test]
    fn stack_limit_enforcement() {
        let mut stack = UndoStack::new();
        for i in 0..(UNDO_STACK_LIMIT + 5) {
            stack.push(create(&format!("t{}", i)));
        }
        assert_eq!(stack.undo.len(), UNDO_STACK_LIMIT);
        // Oldest entries were evicted
        let mut last = None;
        while let Some(op) = stack.undo() {
            last = Some(op);
        }
        match last {
            Some(Operation::Create { task }) => assert_eq!(task.title, "t5"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn deleted_relations_attach_to_matching_delete_only() {
        let t = Task::new("gone", Utc::now());
        let mut stack = UndoStack::new();
        stack.push(Operation::Delete {
            tasks: vec![t.clone()],
            links: Vec::new(),
            entries: Vec::new(),
        });
        let link = ("other".to_string(), t.id.clone());

        let stranger = ["someone-else".to_string()];
        stack.record_deleted_relations(&stranger, vec![link.clone()], Vec::new());
        match stack.peek_last_undo() {
            Some(Operation::Delete { links, .. }) => assert!(links.is_empty()),
            other => panic!("unexpected {:?}", other),
        }

        stack.record_deleted_relations(&[t.id.clone()], vec![link.clone()], Vec::new());
        match stack.peek_last_undo() {
            Some(Operation::Delete { links, .. }) => assert_eq!(links, &vec![link]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_stacks_return_none() {
        let mut stack = UndoStack::new();
        assert!(stack.undo().is_none());
        assert!(stack.redo().is_none());
        assert!(stack.peek_last_undo().is_none());
    }

    // -----------------------------------------------------------------------
    // Labels
    // -----------------------------------------------------------------------

    #[test]
    fn labels() {
        let t = Task::new("x", Utc::now());
        assert_eq!(create("Ship it").label(), "create \"Ship it\"");
        assert_eq!(
            Operation::Delete {
                tasks: vec![t.clone(), t.clone()],
                links: Vec::new(),
                entries: Vec::new(),
            }
            .label(),
            "delete (2 tasks)"
        );
        assert_eq!(
            Operation::Update {
                before: vec![t.clone()],
                after: vec![t]
            }
            .label(),
            "edit"
        );
    }
}
