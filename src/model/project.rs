use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the built-in project that always exists and cannot be deleted
pub const INBOX_ID: &str = "inbox";

/// Colors handed out to new projects, cycled by project count
pub const PROJECT_COLORS: [&str; 12] = [
    "#E06C75", "#98C379", "#E5C07B", "#61AFEF", "#C678DD", "#56B6C2", "#D19A66", "#BE5046",
    "#7EC699", "#E6B450", "#5C99D6", "#B57EDC",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
    pub archived: bool,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// A new project whose id is the slugged lowercase name
    pub fn new(name: &str, color: &str, now: DateTime<Utc>) -> Self {
        Project {
            id: project_id_for(name),
            name: name.to_string(),
            color: color.to_string(),
            archived: false,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_inbox(&self) -> bool {
        self.id == INBOX_ID
    }
}

/// `"Side Work"` → `"side-work"`
pub fn project_id_for(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Palette color for the `index`-th entity, wrapping around.
pub fn palette_color(palette: &[&'static str], index: usize) -> &'static str {
    palette[index % palette.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ids_are_slugged() {
        assert_eq!(project_id_for("Work"), "work");
        assert_eq!(project_id_for("  Side   Work "), "side-work");
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(palette_color(&PROJECT_COLORS, 0), "#E06C75");
        assert_eq!(palette_color(&PROJECT_COLORS, 12), "#E06C75");
        assert_eq!(palette_color(&PROJECT_COLORS, 13), "#98C379");
    }
}
