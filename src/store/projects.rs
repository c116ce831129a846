use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use super::{Store, StoreError};
use crate::model::{INBOX_ID, PROJECT_COLORS, Project, palette_color};

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        archived: row.get(3)?,
        position: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const PROJECT_COLUMNS: &str = "id, name, color, archived, position, created_at, updated_at";

impl Store {
    /// Non-archived projects by position, then creation time.
    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!(
            "SELECT {} FROM projects WHERE archived = 0 ORDER BY position, created_at",
            PROJECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], project_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [id], project_from_row)
            .optional()?)
    }

    /// Case-insensitive lookup by display name.
    pub fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, StoreError> {
        let _cursor = self.open_cursor()?;
        let sql = format!(
            "SELECT {} FROM projects WHERE lower(name) = lower(?1) ORDER BY archived LIMIT 1",
            PROJECT_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, [name.trim()], project_from_row)
            .optional()?)
    }

    pub fn create_project(&self, project: &Project) -> Result<(), StoreError> {
        if project.id.is_empty() {
            return Err(StoreError::Invalid("project name cannot be empty".into()));
        }
        let _cursor = self.open_cursor()?;
        self.conn.execute(
            "INSERT INTO projects (id, name, color, archived, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.name,
                project.color,
                project.archived,
                project.position,
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Return the project named `name`, creating it with the next palette
    /// color if none matches.
    pub fn ensure_project(&self, name: &str) -> Result<Project, StoreError> {
        if let Some(project) = self.find_project_by_name(name)? {
            return Ok(project);
        }
        let count = self.list_projects()?.len();
        let project = Project::new(
            name.trim(),
            palette_color(&PROJECT_COLORS, count),
            Utc::now(),
        );
        self.create_project(&project)?;
        Ok(project)
    }

    pub fn update_project_color(&self, project_id: &str, color: &str) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let changed = self.conn.execute(
            "UPDATE projects SET color = ?2, updated_at = ?3 WHERE id = ?1",
            params![project_id, color, Utc::now()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("project {}", project_id)));
        }
        Ok(())
    }

    /// Delete a project, moving its tasks to the inbox first.
    pub fn delete_project(&self, project_id: &str) -> Result<(), StoreError> {
        if project_id == INBOX_ID {
            return Err(StoreError::InboxProtected);
        }
        let _cursor = self.open_cursor()?;
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "UPDATE tasks SET project_id = ?2 WHERE project_id = ?1",
            params![project_id, INBOX_ID],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", [project_id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("project {}", project_id)));
        }
        tx.commit()?;
        Ok(())
    }
}
