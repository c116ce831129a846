use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::model::Config;

pub const CONFIG_FILE: &str = "config.toml";
pub const DB_FILE: &str = "tend.db";
pub const LOG_FILE: &str = "tend.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Config directory: `$TEND_CONFIG_DIR`, else `$XDG_CONFIG_HOME/tend`, else `~/.config/tend`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TEND_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("tend")
}

/// Data directory: `$XDG_DATA_HOME/tend`, else `~/.local/share/tend`
pub fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"))
        .join("tend")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// The directory holding the database and log for `config`.
pub fn data_dir(config: &Config) -> PathBuf {
    config.data_dir.clone().unwrap_or_else(default_data_dir)
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for round-trip-safe editing. A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let config: Config = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    atomic_write(path, doc.to_string().as_bytes())?;
    Ok(())
}

/// Write `content` to `path` atomically using a temp file + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Update the top-level `theme` key in the config document
pub fn set_theme(doc: &mut toml_edit::DocumentMut, theme: &str) {
    doc["theme"] = toml_edit::value(theme);
}

/// Persist a theme choice, keeping the rest of the file intact.
pub fn save_theme(path: &Path, theme: &str) -> Result<(), ConfigError> {
    let (_, mut doc) = read_config(path)?;
    set_theme(&mut doc, theme);
    write_config(path, &doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewMode;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let (config, doc) = read_config(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.theme, "nord");
        assert!(doc.to_string().is_empty());
    }

    #[test]
    fn save_theme_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "# my settings\ntheme = \"nord\" # default\ndefault_view = \"all\"\n",
        )
        .unwrap();

        save_theme(&path, "gruvbox").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# my settings\n"));
        assert!(text.contains("default_view = \"all\""));
        let (config, _) = read_config(&path).unwrap();
        assert_eq!(config.theme, "gruvbox");
        assert_eq!(config.default_view, ViewMode::All);
    }

    #[test]
    fn save_theme_creates_file_and_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(CONFIG_FILE);
        save_theme(&path, "dracula").unwrap();
        let (config, _) = read_config(&path).unwrap();
        assert_eq!(config.theme, "dracula");
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "theme = [").unwrap();
        assert!(matches!(
            read_config(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn data_dir_prefers_config() {
        let config = Config {
            data_dir: Some(PathBuf::from("/srv/tend")),
            ..Default::default()
        };
        assert_eq!(data_dir(&config), PathBuf::from("/srv/tend"));
    }
}
