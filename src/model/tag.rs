use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colors handed out to new tags, cycled by tag count
pub const TAG_COLORS: [&str; 12] = [
    "#FF6B9D", "#9ECE6A", "#7DCFFF", "#BB9AF7", "#F7768E", "#73DACA", "#FF9E64", "#E0AF68",
    "#2AC3DE", "#B4F9F8", "#C0CAF5", "#A9B1D6",
];

/// A tag. `name` always carries the leading `@`; `id` is the bare lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: &str, color: &str, now: DateTime<Utc>) -> Self {
        let name = normalize_tag_name(name);
        Tag {
            id: tag_id_for(&name),
            name,
            color: color.to_string(),
            created_at: now,
        }
    }

    /// Name with the `@` marker, even for rows stored without it
    pub fn display_name(&self) -> String {
        normalize_tag_name(&self.name)
    }

    /// Name without the `@` marker
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix('@').unwrap_or(&self.name)
    }
}

/// `work` / `@work` → `@work`
pub fn normalize_tag_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{}", name)
    }
}

/// `@Work` → `work`
pub fn tag_id_for(name: &str) -> String {
    name.trim().trim_start_matches('@').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_carry_marker() {
        let tag = Tag::new("Urgent", "#FF6B9D", Utc::now());
        assert_eq!(tag.name, "@Urgent");
        assert_eq!(tag.id, "urgent");
        assert_eq!(tag.bare_name(), "Urgent");

        let tag = Tag::new("@home", "#FF6B9D", Utc::now());
        assert_eq!(tag.display_name(), "@home");
    }
}
