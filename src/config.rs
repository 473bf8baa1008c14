//src/config.rs
use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

use crate::report::View;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "gym-tracker";
const CONFIG_ENV_VAR: &str = "GYM_TRACKER_CONFIG_DIR"; // Environment variable name

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
}

// Define standard colors using strum for easy iteration/parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum StandardColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Grey,
}

impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Red => Self::Red,
            StandardColor::Green => Self::Green,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::White => Self::White,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::DarkCyan => Self::DarkCyan,
            StandardColor::Grey => Self::Grey,
        }
    }
}

/// Parses a colour name such as `darkgreen`, ignoring case.
///
/// # Errors
/// Returns `Error::InvalidColor` for unknown names.
pub fn parse_color(color_str: &str) -> Result<StandardColor, Error> {
    StandardColor::iter()
        .find(|color| format!("{color:?}").eq_ignore_ascii_case(color_str.trim()))
        .ok_or_else(|| Error::InvalidColor(color_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Theme {
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_color: "Green".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Config {
    /// Where the document lives; `None` means the platform data directory.
    pub data_file: Option<PathBuf>,
    pub default_view: View,
    pub weight_unit_label: String,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            default_view: View::Daily,
            weight_unit_label: "kg".to_string(),
            theme: Theme::default(),
        }
    }
}

/// Determines the path to the configuration file.
/// Exposed at crate root as `get_config_path_util`
///
/// # Errors
/// Returns `Error` if no config directory can be determined or created.
pub fn get_config_path() -> Result<PathBuf, Error> {
    let config_dir_path = if let Some(path_str) = std::env::var_os(CONFIG_ENV_VAR) {
        PathBuf::from(path_str)
    } else {
        let base_config_dir = dirs::config_dir().ok_or(Error::CannotDetermineConfigDir)?;
        base_config_dir.join(APP_CONFIG_DIR)
    };

    if !config_dir_path.is_dir() {
        tracing::info!(
            "creating configuration directory {}",
            config_dir_path.display()
        );
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from the TOML file at the given path, writing the
/// defaults there first if it does not exist.
/// Exposed at crate root as `load_config_util`
///
/// # Errors
/// Returns `Error` on I/O or TOML failures.
pub fn load(config_path: &Path) -> Result<Config, Error> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save(config_path, &default_config)?;
        Ok(default_config)
    }
}

/// Saves the configuration to the TOML file.
/// Exposed at crate root as `save_config_util`
///
/// # Errors
/// Returns `Error` on I/O or TOML failures.
pub fn save(config_path: &Path, config: &Config) -> Result<(), Error> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "default_view = \"weekly\"\n").unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.default_view, View::Weekly);
        assert_eq!(config.weight_unit_label, "kg");
        assert_eq!(config.theme, Theme::default());
    }

    #[test]
    fn saved_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = Config {
            data_file: Some(dir.path().join("doc.json")),
            default_view: View::Monthly,
            weight_unit_label: "lbs".to_string(),
            theme: Theme {
                header_color: "Cyan".to_string(),
            },
        };
        save(&path, &config).unwrap();
        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn colors_parse_case_insensitively() {
        assert_eq!(parse_color("darkgreen").unwrap(), StandardColor::DarkGreen);
        assert_eq!(parse_color(" Red ").unwrap(), StandardColor::Red);
        assert!(matches!(parse_color("mauve"), Err(Error::InvalidColor(_))));
    }
}
