use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use super::{Store, StoreError};
use crate::model::{TAG_COLORS, Tag, normalize_tag_name, palette_color, tag_id_for};

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Store {
    /// All tags, ordered by name.
    pub fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let _cursor = self.open_cursor()?;
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, created_at FROM tags ORDER BY name")?;
        let rows = stmt.query_map([], tag_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Tags attached to a task, ordered by name.
    pub fn get_task_tags(&self, task_id: &str) -> Result<Vec<Tag>, StoreError> {
        let _cursor = self.open_cursor()?;
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.name, g.color, g.created_at FROM tags g
             JOIN task_tags tt ON tt.tag_id = g.id
             WHERE tt.task_id = ?1 ORDER BY g.name",
        )?;
        let rows = stmt.query_map([task_id], tag_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Look a tag up by name, with or without the `@` marker. Case-insensitive.
    pub fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        let _cursor = self.open_cursor()?;
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, color, created_at FROM tags WHERE id = ?1",
                [tag_id_for(name)],
                tag_from_row,
            )
            .optional()?)
    }

    pub fn create_tag(&self, tag: &Tag) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        self.conn.execute(
            "INSERT INTO tags (id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![tag.id, normalize_tag_name(&tag.name), tag.color, tag.created_at],
        )?;
        Ok(())
    }

    /// Return the tag named `name`, creating it with the next palette color
    /// if it doesn't exist yet.
    pub fn ensure_tag(&self, name: &str) -> Result<Tag, StoreError> {
        if let Some(tag) = self.find_tag_by_name(name)? {
            return Ok(tag);
        }
        let count = self.list_tags()?.len();
        let tag = Tag::new(name, palette_color(&TAG_COLORS, count), Utc::now());
        if tag.id.is_empty() {
            return Err(StoreError::Invalid("tag name cannot be empty".into()));
        }
        self.create_tag(&tag)?;
        Ok(tag)
    }

    pub fn update_tag_color(&self, tag_id: &str, color: &str) -> Result<(), StoreError> {
        let _cursor = self.open_cursor()?;
        let changed = self.conn.execute(
            "UPDATE tags SET color = ?2 WHERE id = ?1",
            params![tag_id, color],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("tag {}", tag_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ensure_tag_is_idempotent_and_case_insensitive() {
        let store = Store::open_in_memory().unwrap();
        let first = store.ensure_tag("Work").unwrap();
        let again = store.ensure_tag("@work").unwrap();
        assert_eq!(first, again);
        assert_eq!(first.name, "@Work");
        assert_eq!(store.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn new_tags_cycle_the_palette() {
        let store = Store::open_in_memory().unwrap();
        let a = store.ensure_tag("a").unwrap();
        let b = store.ensure_tag("b").unwrap();
        assert_eq!(a.color, TAG_COLORS[0]);
        assert_eq!(b.color, TAG_COLORS[1]);
    }

    #[test]
    fn recolor_missing_tag_fails() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.update_tag_color("nope", "#000000"),
            Err(StoreError::NotFound(_))
        ));
    }
}
