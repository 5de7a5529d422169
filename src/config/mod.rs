//! Configuration for todods.
//!
//! User preferences live in a single KDL file, `config.kdl`, located at:
//! - `$TODODS_CONFIG` when set
//! - otherwise `<config_dir>/todods/config.kdl`
//!   (e.g. `~/.config/todods/config.kdl` or `%APPDATA%\todods\config.kdl`)
//!
//! Contains:
//! - `data-file` - Location of the to-do JSON file
//! - `output-format` - "json" or "human"
//! - `show-completed` - Whether list views include completed tasks
//! - `quick-view-limit` - Number of tasks shown by `todo quick`
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.kdl > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DATA_FILE_ENV, Resolved, ResolvedConfig, ValueSource, resolve_config,
};
pub use schema::{OutputFormat, TodoConfig};

use crate::{Error, Result};
use kdl::KdlDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "TODODS_CONFIG";

/// Location of config.kdl, if one can be determined.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("todods").join("config.kdl"))
}

/// Read config.kdl. A missing file is an empty config.
pub fn read_config(path: &Path) -> Result<TodoConfig> {
    if !path.exists() {
        return Ok(TodoConfig::new());
    }

    let content = fs::read_to_string(path)?;
    let doc: KdlDocument = content.parse()?;
    let config = TodoConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|msg| Error::InvalidInput(format!("{}: {}", path.display(), msg)))?;
    Ok(config)
}

/// Write config.kdl, creating its directory if needed.
pub fn write_config(path: &Path, config: &TodoConfig) -> Result<()> {
    config.validate().map_err(Error::InvalidInput)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut doc = config.to_kdl();
    doc.autoformat();
    fs::write(path, doc.to_string())?;
    Ok(())
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_config_is_empty() {
        let temp = TempDir::new().unwrap();
        let config = read_config(&temp.path().join("config.kdl")).unwrap();
        assert_eq!(config, TodoConfig::new());
    }

    #[test]
    fn test_read_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.kdl");
        fs::write(&path, "output-format \"human\"\nquick-view-limit 3\n").unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.quick_view_limit, Some(3));
    }

    #[test]
    fn test_read_invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.kdl");

        fs::write(&path, "quick-view-limit 0\n").unwrap();
        assert!(matches!(read_config(&path), Err(Error::InvalidInput(_))));

        fs::write(&path, "output-format \"human\n").unwrap();
        assert!(matches!(read_config(&path), Err(Error::Kdl(_))));
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.kdl");
        let config = TodoConfig {
            show_completed: Some(false),
            quick_view_limit: Some(4),
            ..Default::default()
        };

        write_config(&path, &config).unwrap();
        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test]
    fn test_expand_home() {
        let plain = Path::new("/var/data/todos.json");
        assert_eq!(expand_home(plain), plain.to_path_buf());

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/todos.json")),
                home.join("todos.json")
            );
        }
    }
}
