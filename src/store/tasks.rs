use rusqlite::{OptionalExtension, Row, params};

use super::{Store, StoreError, conversion_error};
use crate::model::{Priority, Tag, Task, TaskStatus};

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.priority, t.project_id, \
     t.parent_id, t.due_date, t.start_date, t.completed_at, t.time_estimate, t.position, \
     t.created_at, t.updated_at";

/// Incomplete before done, then urgent → low, then manual position, newest first.
const TASK_ORDER: &str = "ORDER BY CASE t.status WHEN 'done' THEN 1 ELSE 0 END, \
     CASE t.priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END, \
     t.position, t.created_at DESC";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| conversion_error(3, format!("unknown status '{}'", status)))?,
        priority: Priority::parse(&priority)
            .ok_or_else(|| conversion_error(4, format!("unknown priority '{}'", priority)))?,
        project_id: row.get(5)?,
        parent_id: row.get(6)?,
        due_date: row.get(7)?,
        start_date: row.get(8)?,
        completed_at: row.get(9)?,
        time_estimate: row.get(10)?,
        position: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        tags: Vec::new(),
        subtasks: Vec::new(),
        dependencies: Vec::new(),
    })
}

impl Store {
    /// Stream non-archived top-level tasks in display order.
    ///
    /// The cursor stays open while `f` runs: any other store call made from
    /// inside `f` returns [`StoreError::CursorBusy`].
    pub fn for_each_top_level_task(
        &self,
        mut f: impl FnMut(Task) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!(
            "SELECT {} FROM tasks t WHERE t.status != 'archived' AND t.parent_id IS NULL {}",
            TASK_COLUMNS, TASK_ORDER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            f(task_from_row(row)?)?;
        }
        Ok(())
    }

    /// All non-archived top-level tasks, fully materialized.
    pub fn list_top_level_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = Vec::new();
        self.for_each_top_level_task(|task| {
            tasks.push(task);
            Ok(())
        })?;
        Ok(tasks)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [id], task_from_row)
            .optional()?)
    }

    /// Non-archived subtasks of `parent_id`, in the same order as top-level tasks.
    pub fn get_subtasks(&self, parent_id: &str) -> Result<Vec<Task>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!(
            "SELECT {} FROM tasks t WHERE t.parent_id = ?1 AND t.status != 'archived' {}",
            TASK_COLUMNS, TASK_ORDER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([parent_id], task_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Tasks that `task_id` depends on.
    pub fn get_dependencies(&self, task_id: &str) -> Result<Vec<Task>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!(
            "SELECT {} FROM tasks t
             JOIN task_dependencies d ON d.depends_on_id = t.id
             WHERE d.task_id = ?1 {}",
            TASK_COLUMNS, TASK_ORDER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([task_id], task_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// A task is blocked while any of its dependencies isn't done.
    pub fn is_blocked(&self, task_id: &str) -> Result<bool, StoreError> {
        let _cursor = self.open_cursor()?;
        let open: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM task_dependencies d
             JOIN tasks t ON t.id = d.depends_on_id
             WHERE d.task_id = ?1 AND t.status != 'done'",
            [task_id],
            |row| row.get(0),
        )?;
        Ok(open > 0)
    }

    /// Insert a task with its tags and dependency links, then its subtasks.
    ///
    /// Tags missing from the tag table are recreated; dependency links to tasks
    /// that no longer exist are skipped.
    pub fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let tx = self.conn.unchecked_transaction()?;
        self.insert_task_tree(task)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_task_tree(&self, task: &Task) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, project_id, parent_id,
                 due_date, start_date, completed_at, time_estimate, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.project_id,
                task.parent_id,
                task.due_date,
                task.start_date,
                task.completed_at,
                task.time_estimate,
                task.position,
                task.created_at,
                task.updated_at,
            ],
        )?;
        self.replace_task_tags(&task.id, &task.tags)?;
        for dep in &task.dependencies {
            self.conn.execute(
                "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_id)
                 SELECT ?1, id FROM tasks WHERE id = ?2",
                params![task.id, dep.id],
            )?;
        }
        for sub in &task.subtasks {
            self.insert_task_tree(sub)?;
        }
        Ok(())
    }

    /// Write every stored field of `task` and replace its tag set.
    /// Subtasks and dependency links are left alone.
    pub fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let tx = self.conn.unchecked_transaction()?;
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?2, description = ?3, status = ?4, priority = ?5,
                 project_id = ?6, parent_id = ?7, due_date = ?8, start_date = ?9,
                 completed_at = ?10, time_estimate = ?11, position = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.project_id,
                task.parent_id,
                task.due_date,
                task.start_date,
                task.completed_at,
                task.time_estimate,
                task.position,
                task.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {}", task.id)));
        }
        self.replace_task_tags(&task.id, &task.tags)?;
        tx.commit()?;
        Ok(())
    }

    /// Write only the priority, leaving every other column untouched.
    pub fn set_task_priority(&self, task_id: &str, priority: Priority) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let changed = self.conn.execute(
            "UPDATE tasks SET priority = ?2, updated_at = ?3 WHERE id = ?1",
            params![task_id, priority.as_str(), chrono::Utc::now()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {}", task_id)));
        }
        Ok(())
    }

    /// Delete a task. Subtasks, tag links, dependency links and time entries
    /// go with it.
    pub fn delete_task(&self, task_id: &str) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", [task_id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {}", task_id)));
        }
        Ok(())
    }

    pub fn add_dependency(&self, task_id: &str, depends_on_id: &str) -> Result<(), StoreError> {
        if task_id == depends_on_id {
            return Err(StoreError::Invalid("a task cannot depend on itself".into()));
        }
        let _cursor = self.open_cursor()?;
        self.conn.execute(
            "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_id) VALUES (?1, ?2)",
            params![task_id, depends_on_id],
        )?;
        Ok(())
    }

    pub fn remove_dependency(&self, task_id: &str, depends_on_id: &str) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        self.conn.execute(
            "DELETE FROM task_dependencies WHERE task_id = ?1 AND depends_on_id = ?2",
            params![task_id, depends_on_id],
        )?;
        Ok(())
    }

    /// Every `(task_id, depends_on_id)` link with `task_id` on either side.
    pub fn dependency_links(&self, task_id: &str) -> Result<Vec<(String, String)>, StoreError> {
        let _cursor = self.open_cursor()?;
        let mut stmt = self.conn.prepare(
            "SELECT task_id, depends_on_id FROM task_dependencies
             WHERE task_id = ?1 OR depends_on_id = ?1",
        )?;
        let rows = stmt.query_map([task_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Re-add dependency links. Links whose tasks no longer both exist are
    /// skipped.
    pub fn restore_dependency_links(&self, links: &[(String, String)]) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let tx = self.conn.unchecked_transaction()?;
        for (task_id, depends_on_id) in links {
            self.conn.execute(
                "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_id)
                 SELECT a.id, b.id FROM tasks a, tasks b WHERE a.id = ?1 AND b.id = ?2",
                params![task_id, depends_on_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_task_tags(&self, task_id: &str, tags: &[Tag]) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM task_tags WHERE task_id = ?1", [task_id])?;
        for tag in tags {
            self.conn.execute(
                "INSERT OR IGNORE INTO tags (id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![tag.id, tag.name, tag.color, tag.created_at],
            )?;
            self.conn.execute(
                "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
                params![task_id, tag.id],
            )?;
        }
        Ok(())
    }
}
