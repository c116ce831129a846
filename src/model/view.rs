use serde::{Deserialize, Serialize};

/// Which tasks the list shows by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Everything that isn't archived
    All,
    /// Hides done tasks
    #[default]
    Active,
    /// Hides tasks completed more than a week ago
    Recent,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::All => "All",
            ViewMode::Active => "Active",
            ViewMode::Recent => "Recent",
        }
    }

    /// All → Active → Recent → All
    pub fn cycle(self) -> ViewMode {
        match self {
            ViewMode::All => ViewMode::Active,
            ViewMode::Active => ViewMode::Recent,
            ViewMode::Recent => ViewMode::All,
        }
    }
}

/// In-memory ordering of top-level tasks, set by `:sort`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Store order: incomplete first, then priority, position, newest
    #[default]
    Priority,
    Due,
    Created,
    Title,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<SortKey> {
        match s.trim().to_lowercase().as_str() {
            "priority" | "pri" | "p" => Some(SortKey::Priority),
            "due" | "d" => Some(SortKey::Due),
            "created" | "c" | "new" => Some(SortKey::Created),
            "title" | "t" | "name" => Some(SortKey::Title),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Priority => "priority",
            SortKey::Due => "due",
            SortKey::Created => "created",
            SortKey::Title => "title",
        }
    }
}
