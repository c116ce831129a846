use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::view::ViewMode;

/// Configuration from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Built-in theme name (nord, dracula, gruvbox, catppuccin)
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Directory holding `tend.db` and `tend.log`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub default_view: ViewMode,
    /// Wrap long titles instead of truncating them
    #[serde(default)]
    pub wrap: bool,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            theme: default_theme(),
            data_dir: None,
            default_view: ViewMode::default(),
            wrap: false,
            ui: UiConfig::default(),
        }
    }
}

fn default_theme() -> String {
    "nord".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Per-slot color overrides applied on top of the theme (`text = "#D8DEE9"`)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.theme, "nord");
        assert_eq!(config.default_view, ViewMode::Active);
        assert!(!config.wrap);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn config_reads_all_keys() {
        let config: Config = toml::from_str(
            r##"theme = "dracula"
data_dir = "/tmp/tend"
default_view = "recent"
wrap = true

[ui.colors]
text = "#FFFFFF"
"##,
        )
        .unwrap();
        assert_eq!(config.theme, "dracula");
        assert_eq!(config.default_view, ViewMode::Recent);
        assert!(config.wrap);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/tend")));
        assert_eq!(config.ui.colors.get("text").map(String::as_str), Some("#FFFFFF"));
    }
}
