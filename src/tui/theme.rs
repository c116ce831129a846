use ratatui::style::Color;

use crate::model::{Config, Priority, TaskStatus};

/// Names accepted by `:theme` and the `theme` config key
pub const THEME_NAMES: [&str; 4] = ["nord", "dracula", "gruvbox", "catppuccin"];

/// Parsed color theme for the TUI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub cyan: Color,
    pub purple: Color,
    pub blue: Color,
    pub cursor_bg: Color,
    pub selection_bg: Color,
    pub search_match_bg: Color,
    pub search_match_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::nord()
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Theme {
    pub fn nord() -> Self {
        Theme {
            name: "nord",
            background: rgb(0x2E3440),
            text: rgb(0xD8DEE9),
            text_bright: rgb(0xECEFF4),
            highlight: rgb(0x88C0D0),
            dim: rgb(0x616E88),
            red: rgb(0xBF616A),
            yellow: rgb(0xEBCB8B),
            green: rgb(0xA3BE8C),
            cyan: rgb(0x8FBCBB),
            purple: rgb(0xB48EAD),
            blue: rgb(0x81A1C1),
            cursor_bg: rgb(0x3B4252),
            selection_bg: rgb(0x434C5E),
            search_match_bg: rgb(0xEBCB8B),
            search_match_fg: rgb(0x2E3440),
        }
    }

    pub fn dracula() -> Self {
        Theme {
            name: "dracula",
            background: rgb(0x282A36),
            text: rgb(0xF8F8F2),
            text_bright: rgb(0xFFFFFF),
            highlight: rgb(0xFF79C6),
            dim: rgb(0x6272A4),
            red: rgb(0xFF5555),
            yellow: rgb(0xF1FA8C),
            green: rgb(0x50FA7B),
            cyan: rgb(0x8BE9FD),
            purple: rgb(0xBD93F9),
            blue: rgb(0x6272A4),
            cursor_bg: rgb(0x44475A),
            selection_bg: rgb(0x3B3D4F),
            search_match_bg: rgb(0xF1FA8C),
            search_match_fg: rgb(0x282A36),
        }
    }

    pub fn gruvbox() -> Self {
        Theme {
            name: "gruvbox",
            background: rgb(0x282828),
            text: rgb(0xEBDBB2),
            text_bright: rgb(0xFBF1C7),
            highlight: rgb(0xFE8019),
            dim: rgb(0x928374),
            red: rgb(0xFB4934),
            yellow: rgb(0xFABD2F),
            green: rgb(0xB8BB26),
            cyan: rgb(0x8EC07C),
            purple: rgb(0xD3869B),
            blue: rgb(0x83A598),
            cursor_bg: rgb(0x3C3836),
            selection_bg: rgb(0x504945),
            search_match_bg: rgb(0xFABD2F),
            search_match_fg: rgb(0x282828),
        }
    }

    pub fn catppuccin() -> Self {
        Theme {
            name: "catppuccin",
            background: rgb(0x1E1E2E),
            text: rgb(0xCDD6F4),
            text_bright: rgb(0xFFFFFF),
            highlight: rgb(0xCBA6F7),
            dim: rgb(0x6C7086),
            red: rgb(0xF38BA8),
            yellow: rgb(0xF9E2AF),
            green: rgb(0xA6E3A1),
            cyan: rgb(0x94E2D5),
            purple: rgb(0xCBA6F7),
            blue: rgb(0x89B4FA),
            cursor_bg: rgb(0x313244),
            selection_bg: rgb(0x45475A),
            search_match_bg: rgb(0xF9E2AF),
            search_match_fg: rgb(0x1E1E2E),
        }
    }

    /// Look a built-in theme up by name (case-insensitive)
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "nord" => Some(Theme::nord()),
            "dracula" => Some(Theme::dracula()),
            "gruvbox" => Some(Theme::gruvbox()),
            "catppuccin" => Some(Theme::catppuccin()),
            _ => None,
        }
    }

    /// Create a theme from config, falling back to nord for unknown names
    pub fn from_config(config: &Config) -> Self {
        let mut theme = Theme::by_name(&config.theme).unwrap_or_default();

        // Apply color overrides from [ui.colors]
        for (key, value) in &config.ui.colors {
            if let Some(color) = parse_hex_color(value) {
                match key.as_str() {
                    "background" => theme.background = color,
                    "text" => theme.text = color,
                    "text_bright" => theme.text_bright = color,
                    "highlight" => theme.highlight = color,
                    "dim" => theme.dim = color,
                    "red" => theme.red = color,
                    "yellow" => theme.yellow = color,
                    "green" => theme.green = color,
                    "cyan" => theme.cyan = color,
                    "purple" => theme.purple = color,
                    "blue" => theme.blue = color,
                    "cursor_bg" => theme.cursor_bg = color,
                    "selection_bg" => theme.selection_bg = color,
                    "search_match_bg" => theme.search_match_bg = color,
                    "search_match_fg" => theme.search_match_fg = color,
                    _ => {}
                }
            }
        }

        theme
    }

    /// Color of a stored `#RRGGBB` annotation, falling back to text color
    pub fn entity_color(&self, hex: &str) -> Color {
        parse_hex_color(hex).unwrap_or(self.text)
    }

    pub fn status_color(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Backlog => self.dim,
            TaskStatus::Pending => self.text,
            TaskStatus::InProgress => self.highlight,
            TaskStatus::Done => self.green,
            TaskStatus::Archived => self.dim,
        }
    }

    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::Low => self.dim,
            Priority::Medium => self.blue,
            Priority::High => self.yellow,
            Priority::Urgent => self.red,
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
